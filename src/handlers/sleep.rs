use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::types::Json as Jsonb;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::mood::StatsQuery;
use crate::models::sleep::{
    BedtimeActivity, Comfort, CreateSleepEntryRequest, SleepAid, SleepEntry, SleepQuery,
    UpdateSleepEntryRequest,
};
use crate::models::{ApiResponse, ListResponse, Pagination};
use crate::services::patterns::{self, ScheduleVariance, SleepDayPattern, SleepFactorImpact};
use crate::services::recommend::{sleep_recommendations, Recommendation};
use crate::services::stats::{self, ScoreBucket, SleepStats};
use crate::AppState;

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<SleepQuery>,
) -> AppResult<Json<ListResponse<SleepEntry>>> {
    let (page, limit, offset) = super::page_params(query.page, query.limit);

    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM sleep_entries
        WHERE user_id = $1
          AND ($2::timestamptz IS NULL OR sleep_time >= $2)
          AND ($3::timestamptz IS NULL OR sleep_time <= $3)
          AND ($4::int IS NULL OR quality = $4)
        "#,
    )
    .bind(auth_user.id)
    .bind(query.start_date)
    .bind(query.end_date)
    .bind(query.quality)
    .fetch_one(&state.db)
    .await?;

    let entries = sqlx::query_as::<_, SleepEntry>(
        r#"
        SELECT * FROM sleep_entries
        WHERE user_id = $1
          AND ($2::timestamptz IS NULL OR sleep_time >= $2)
          AND ($3::timestamptz IS NULL OR sleep_time <= $3)
          AND ($4::int IS NULL OR quality = $4)
        ORDER BY sleep_time DESC
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(auth_user.id)
    .bind(query.start_date)
    .bind(query.end_date)
    .bind(query.quality)
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
    Json(body): Json<CreateSleepEntryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<SleepEntry>>)> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    body.validate_times().map_err(AppError::Validation)?;

    let entry = sqlx::query_as::<_, SleepEntry>(
        r#"
        INSERT INTO sleep_entries
            (id, user_id, sleep_time, wake_time, quality, interruptions, note,
             sleep_environment, activities_before_bed, sleep_aids, wake_up_mood)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(body.sleep_time)
    .bind(body.wake_time)
    .bind(body.quality)
    .bind(body.interruptions)
    .bind(&body.note)
    .bind(body.sleep_environment.as_ref().map(Jsonb))
    .bind(Jsonb(&body.activities_before_bed))
    .bind(&body.sleep_aids)
    .bind(body.wake_up_mood)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(entry))))
}

pub async fn get_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SleepEntry>>> {
    let entry = sqlx::query_as::<_, SleepEntry>(
        "SELECT * FROM sleep_entries WHERE id = $1 AND user_id = $2",
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Sleep entry not found".into()))?;

    Ok(Json(ApiResponse::new(entry)))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
    Json(body): Json<UpdateSleepEntryRequest>,
) -> AppResult<Json<ApiResponse<SleepEntry>>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let existing =
        sqlx::query_as::<_, SleepEntry>("SELECT * FROM sleep_entries WHERE id = $1")
            .bind(entry_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Sleep entry not found".into()))?;

    if existing.user_id != auth_user.id {
        return Err(AppError::Forbidden);
    }

    // Re-check ordering against the merged times, not just the patch.
    let sleep_time = body.sleep_time.unwrap_or(existing.sleep_time);
    let wake_time = body.wake_time.unwrap_or(existing.wake_time);
    if sleep_time >= wake_time {
        return Err(AppError::Validation("sleepTime must be before wakeTime".into()));
    }

    let entry = sqlx::query_as::<_, SleepEntry>(
        r#"
        UPDATE sleep_entries SET
            sleep_time = $2,
            wake_time = $3,
            quality = COALESCE($4, quality),
            interruptions = COALESCE($5, interruptions),
            note = COALESCE($6, note),
            sleep_environment = COALESCE($7, sleep_environment),
            activities_before_bed = COALESCE($8, activities_before_bed),
            sleep_aids = COALESCE($9, sleep_aids),
            wake_up_mood = COALESCE($10, wake_up_mood),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(entry_id)
    .bind(sleep_time)
    .bind(wake_time)
    .bind(body.quality)
    .bind(body.interruptions)
    .bind(&body.note)
    .bind(body.sleep_environment.as_ref().map(Jsonb))
    .bind(body.activities_before_bed.as_ref().map(Jsonb))
    .bind(&body.sleep_aids)
    .bind(body.wake_up_mood)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(ApiResponse::new(entry)))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let owner = sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM sleep_entries WHERE id = $1")
        .bind(entry_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sleep entry not found".into()))?;

    if owner != auth_user.id {
        return Err(AppError::Forbidden);
    }

    sqlx::query("DELETE FROM sleep_entries WHERE id = $1")
        .bind(entry_id)
        .execute(&state.db)
        .await?;

    Ok(Json(serde_json::json!({ "success": true, "data": {} })))
}

#[derive(Debug, Serialize)]
pub struct SleepStatsResponse {
    #[serde(flatten)]
    pub overall: SleepStats,
    pub quality_distribution: Vec<ScoreBucket>,
    pub weekly_patterns: Vec<SleepDayPattern>,
    pub recent_entries: Vec<SleepEntry>,
}

pub async fn get_stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<ApiResponse<SleepStatsResponse>>> {
    let days = query.days.unwrap_or(7).max(1);
    let entries = fetch_window(&state, auth_user.id, days).await?;

    let recent_entries = entries.iter().take(5).cloned().collect();

    Ok(Json(ApiResponse::new(SleepStatsResponse {
        overall: stats::sleep_stats(&entries),
        quality_distribution: stats::quality_distribution(&entries),
        weekly_patterns: patterns::weekly_sleep_patterns(&entries),
        recent_entries,
    })))
}

#[derive(Debug, Serialize)]
pub struct SleepInsightsResponse {
    pub environment_impact: Vec<SleepFactorImpact<Comfort>>,
    pub activity_impact: Vec<SleepFactorImpact<BedtimeActivity>>,
    pub sleep_aid_effectiveness: Vec<SleepFactorImpact<SleepAid>>,
    pub schedule_variance: Option<ScheduleVariance>,
    pub recommendations: Vec<Recommendation>,
}

pub async fn get_insights(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<ApiResponse<SleepInsightsResponse>>> {
    let days = query.days.unwrap_or(30).max(1);
    let entries = fetch_window(&state, auth_user.id, days).await?;

    let schedule = patterns::schedule_variance(&entries);
    let avg_duration = stats::sleep_stats(&entries).avg_duration;
    let recommendations = sleep_recommendations(schedule.as_ref(), avg_duration);

    Ok(Json(ApiResponse::new(SleepInsightsResponse {
        environment_impact: patterns::environment_comfort_impact(&entries),
        activity_impact: patterns::bedtime_activity_impact(&entries),
        sleep_aid_effectiveness: patterns::sleep_aid_effectiveness(&entries),
        schedule_variance: schedule,
        recommendations,
    })))
}

async fn fetch_window(
    state: &AppState,
    user_id: Uuid,
    days: i64,
) -> AppResult<Vec<SleepEntry>> {
    let since = Utc::now() - Duration::days(days);
    let entries = sqlx::query_as::<_, SleepEntry>(
        r#"
        SELECT * FROM sleep_entries
        WHERE user_id = $1 AND sleep_time >= $2
        ORDER BY sleep_time DESC
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(&state.db)
    .await?;
    Ok(entries)
}
