use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{Duration, Utc};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::mood::{
    CreateMoodEntryRequest, MoodEntry, MoodQuery, StatsQuery, UpdateMoodEntryRequest,
};
use crate::models::{ApiResponse, ListResponse, Pagination};
use crate::services::stats::{self, MoodBucket};
use crate::AppState;

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<MoodQuery>,
) -> AppResult<Json<ListResponse<MoodEntry>>> {
    let (page, limit, offset) = super::page_params(query.page, query.limit);

    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM mood_entries
        WHERE user_id = $1
          AND ($2::timestamptz IS NULL OR created_at >= $2)
          AND ($3::timestamptz IS NULL OR created_at <= $3)
        "#,
    )
    .bind(auth_user.id)
    .bind(query.start_date)
    .bind(query.end_date)
    .fetch_one(&state.db)
    .await?;

    let entries = sqlx::query_as::<_, MoodEntry>(
        r#"
        SELECT * FROM mood_entries
        WHERE user_id = $1
          AND ($2::timestamptz IS NULL OR created_at >= $2)
          AND ($3::timestamptz IS NULL OR created_at <= $3)
        ORDER BY created_at DESC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(auth_user.id)
    .bind(query.start_date)
    .bind(query.end_date)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ListResponse::new(
        entries,
        Pagination::for_page(page, limit, total),
    )))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateMoodEntryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<MoodEntry>>)> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let entry = sqlx::query_as::<_, MoodEntry>(
        r#"
        INSERT INTO mood_entries (id, user_id, mood, mood_score, note, activities, triggers)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(body.mood)
    .bind(body.mood_score)
    .bind(&body.note)
    .bind(&body.activities)
    .bind(&body.triggers)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(entry))))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MoodEntry>>> {
    let entry = sqlx::query_as::<_, MoodEntry>(
        "SELECT * FROM mood_entries WHERE id = $1 AND user_id = $2",
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Mood entry not found".into()))?;

    Ok(Json(ApiResponse::new(entry)))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
    Json(body): Json<UpdateMoodEntryRequest>,
) -> AppResult<Json<ApiResponse<MoodEntry>>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let existing =
        sqlx::query_as::<_, MoodEntry>("SELECT * FROM mood_entries WHERE id = $1")
            .bind(entry_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Mood entry not found".into()))?;

    if existing.user_id != auth_user.id {
        return Err(AppError::Forbidden);
    }

    let entry = sqlx::query_as::<_, MoodEntry>(
        r#"
        UPDATE mood_entries SET
            mood = COALESCE($2, mood),
            mood_score = COALESCE($3, mood_score),
            note = COALESCE($4, note),
            activities = COALESCE($5, activities),
            triggers = COALESCE($6, triggers),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(entry_id)
    .bind(body.mood)
    .bind(body.mood_score)
    .bind(&body.note)
    .bind(&body.activities)
    .bind(&body.triggers)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(ApiResponse::new(entry)))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let owner = sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM mood_entries WHERE id = $1")
        .bind(entry_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Mood entry not found".into()))?;

    if owner != auth_user.id {
        return Err(AppError::Forbidden);
    }

    sqlx::query("DELETE FROM mood_entries WHERE id = $1")
        .bind(entry_id)
        .execute(&state.db)
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": {} })))
}

#[derive(Debug, Serialize)]
pub struct MoodStatsResponse {
    pub total_entries: usize,
    pub avg_mood_score: Option<f64>,
    pub mood_breakdown: Vec<MoodBucket>,
}

pub async fn get_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<ApiResponse<MoodStatsResponse>>> {
    let days = query.days.unwrap_or(30).max(1);
    let since = Utc::now() - Duration::days(days);

    let entries = sqlx::query_as::<_, MoodEntry>(
        r#"
        SELECT * FROM mood_entries
        WHERE user_id = $1 AND created_at >= $2
        ORDER BY created_at DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(since)
    .fetch_all(&state.db)
    .await?;

    let overall = stats::mood_stats(&entries);

    Ok(Json(ApiResponse::new(MoodStatsResponse {
        total_entries: overall.total_entries,
        avg_mood_score: overall.avg_mood_score,
        mood_breakdown: stats::mood_breakdown(&entries),
    })))
}
