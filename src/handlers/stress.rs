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
use crate::models::mood::StatsQuery;
use crate::models::stress::{
    CreateStressEntryRequest, StressEntry, StressQuery, UpdateStressEntryRequest,
};
use crate::models::{ApiResponse, ListResponse, Pagination};
use crate::services::patterns::{
    self, CopingEffectiveness, StressDayPattern, StressHourPattern,
};
use crate::services::stats::{self, ScoreBucket, StressStats, StressorCount};
use crate::AppState;

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<StressQuery>,
) -> AppResult<Json<ListResponse<StressEntry>>> {
    let (page, limit, offset) = super::page_params(query.page, query.limit);

    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM stress_entries
        WHERE user_id = $1
          AND ($2::timestamptz IS NULL OR created_at >= $2)
          AND ($3::timestamptz IS NULL OR created_at <= $3)
          AND ($4::int IS NULL OR stress_level >= $4)
          AND ($5::int IS NULL OR stress_level <= $5)
        "#,
    )
    .bind(auth_user.id)
    .bind(query.start_date)
    .bind(query.end_date)
    .bind(query.min_stress_level)
    .bind(query.max_stress_level)
    .fetch_one(&state.db)
    .await?;

    let entries = sqlx::query_as::<_, StressEntry>(
        r#"
        SELECT * FROM stress_entries
        WHERE user_id = $1
          AND ($2::timestamptz IS NULL OR created_at >= $2)
          AND ($3::timestamptz IS NULL OR created_at <= $3)
          AND ($4::int IS NULL OR stress_level >= $4)
          AND ($5::int IS NULL OR stress_level <= $5)
        ORDER BY created_at DESC
        LIMIT $6 OFFSET $7
        "#,
    )
    .bind(auth_user.id)
    .bind(query.start_date)
    .bind(query.end_date)
    .bind(query.min_stress_level)
    .bind(query.max_stress_level)
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
    Json(body): Json<CreateStressEntryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<StressEntry>>)> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let entry = sqlx::query_as::<_, StressEntry>(
        r#"
        INSERT INTO stress_entries
            (id, user_id, stress_level, stressors, physical_symptoms, coping_methods, note)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(body.stress_level)
    .bind(&body.stressors)
    .bind(&body.physical_symptoms)
    .bind(&body.coping_methods)
    .bind(&body.note)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(entry))))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<StressEntry>>> {
    let entry = sqlx::query_as::<_, StressEntry>(
        "SELECT * FROM stress_entries WHERE id = $1 AND user_id = $2",
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Stress entry not found".into()))?;

    Ok(Json(ApiResponse::new(entry)))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
    Json(body): Json<UpdateStressEntryRequest>,
) -> AppResult<Json<ApiResponse<StressEntry>>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let existing =
        sqlx::query_as::<_, StressEntry>("SELECT * FROM stress_entries WHERE id = $1")
            .bind(entry_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Stress entry not found".into()))?;

    if existing.user_id != auth_user.id {
        return Err(AppError::Forbidden);
    }

    let entry = sqlx::query_as::<_, StressEntry>(
        r#"
        UPDATE stress_entries SET
            stress_level = COALESCE($2, stress_level),
            stressors = COALESCE($3, stressors),
            physical_symptoms = COALESCE($4, physical_symptoms),
            coping_methods = COALESCE($5, coping_methods),
            note = COALESCE($6, note),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(entry_id)
    .bind(body.stress_level)
    .bind(&body.stressors)
    .bind(&body.physical_symptoms)
    .bind(&body.coping_methods)
    .bind(&body.note)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(ApiResponse::new(entry)))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let owner =
        sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM stress_entries WHERE id = $1")
            .bind(entry_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Stress entry not found".into()))?;

    if owner != auth_user.id {
        return Err(AppError::Forbidden);
    }

    sqlx::query("DELETE FROM stress_entries WHERE id = $1")
        .bind(entry_id)
        .execute(&state.db)
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": {} })))
}

#[derive(Debug, Serialize)]
pub struct StressStatsResponse {
    #[serde(flatten)]
    pub overall: StressStats,
    pub top_stressors: Vec<StressorCount>,
    pub level_distribution: Vec<ScoreBucket>,
    pub weekly_patterns: Vec<StressDayPattern>,
    pub recent_entries: Vec<StressEntry>,
}

pub async fn get_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<ApiResponse<StressStatsResponse>>> {
    let days = query.days.unwrap_or(30).max(1);
    let entries = fetch_window(&state, auth_user.id, days).await?;

    let recent_entries = entries.iter().take(5).cloned().collect();

    Ok(Json(ApiResponse::new(StressStatsResponse {
        overall: stats::stress_stats(&entries),
        top_stressors: stats::top_stressors(&entries, 5),
        level_distribution: stats::stress_distribution(&entries),
        weekly_patterns: patterns::weekly_stress_patterns(&entries),
        recent_entries,
    })))
}

#[derive(Debug, Serialize)]
pub struct StressInsightsResponse {
    pub common_stressors: Vec<StressorCount>,
    pub coping_effectiveness: Vec<CopingEffectiveness>,
    pub hourly_patterns: Vec<StressHourPattern>,
}

pub async fn get_insights(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<ApiResponse<StressInsightsResponse>>> {
    let days = query.days.unwrap_or(30).max(1);
    let entries = fetch_window(&state, auth_user.id, days).await?;

    Ok(Json(ApiResponse::new(StressInsightsResponse {
        common_stressors: stats::top_stressors(&entries, usize::MAX),
        coping_effectiveness: patterns::coping_effectiveness(&entries),
        hourly_patterns: patterns::hourly_stress_patterns(&entries),
    })))
}

async fn fetch_window(
    state: &AppState,
    user_id: Uuid,
    days: i64,
) -> AppResult<Vec<StressEntry>> {
    let since = Utc::now() - Duration::days(days);
    let entries = sqlx::query_as::<_, StressEntry>(
        r#"
        SELECT * FROM stress_entries
        WHERE user_id = $1 AND created_at >= $2
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(&state.db)
    .await?;
    Ok(entries)
}
