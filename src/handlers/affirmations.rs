use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use rand::Rng;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::affirmation::{
    Affirmation, AffirmationQuery, CreateAffirmationRequest, RandomAffirmationQuery,
    RateAffirmationRequest, UpdateAffirmationRequest,
};
use crate::models::{ApiResponse, ListResponse, Pagination};
use crate::AppState;

pub async fn list_affirmations(
    State(state): State<AppState>,
    Query(query): Query<AffirmationQuery>,
) -> AppResult<Json<ListResponse<Affirmation>>> {
    let (page, limit, offset) = super::page_params(query.page, query.limit);
    let search = query.search.as_ref().map(|s| format!("%{}%", s));

    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM affirmations
        WHERE is_active = true
          AND ($1::affirmation_category IS NULL OR category = $1)
          AND ($2::text IS NULL OR text ILIKE $2)
        "#,
    )
    .bind(query.category)
    .bind(&search)
    .fetch_one(&state.db)
    .await?;

    let affirmations = sqlx::query_as::<_, Affirmation>(
        r#"
        SELECT * FROM affirmations
        WHERE is_active = true
          AND ($1::affirmation_category IS NULL OR category = $1)
          AND ($2::text IS NULL OR text ILIKE $2)
        ORDER BY favorite_count DESC, (metadata->>'usage_count')::bigint DESC, created_at ASC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(query.category)
    .bind(&search)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(ListResponse::new(
        affirmations,
        Pagination::for_page(page, limit, total),
    )))
}

/// Pick a uniformly random affirmation matching the filters. A mood filter
/// matches its own association or the "all" catch-all.
pub async fn random_affirmation(
    State(state): State<AppState>,
    Query(query): Query<RandomAffirmationQuery>,
) -> AppResult<Json<ApiResponse<Affirmation>>> {
    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM affirmations
        WHERE is_active = true
          AND ($1::mood_association IS NULL
               OR mood_association @> ARRAY[$1]
               OR mood_association @> ARRAY['all'::mood_association])
          AND ($2::affirmation_category IS NULL OR category = $2)
        "#,
    )
    .bind(query.mood)
    .bind(query.category)
    .fetch_one(&state.db)
    .await?;

    if total == 0 {
        return Err(AppError::NotFound(
            "No affirmations found for the given filters".into(),
        ));
    }

    let skip = rand::thread_rng().gen_range(0..total);

    let mut affirmation = sqlx::query_as::<_, Affirmation>(
        r#"
        SELECT * FROM affirmations
        WHERE is_active = true
          AND ($1::mood_association IS NULL
               OR mood_association @> ARRAY[$1]
               OR mood_association @> ARRAY['all'::mood_association])
          AND ($2::affirmation_category IS NULL OR category = $2)
        ORDER BY created_at ASC
        OFFSET $3 LIMIT 1
        "#,
    )
    .bind(query.mood)
    .bind(query.category)
    .bind(skip)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("No affirmations found for the given filters".into()))?;

    affirmation.record_usage(Utc::now());
    persist_metadata(&state, &affirmation).await?;

    Ok(Json(ApiResponse::new(affirmation)))
}

pub async fn get_affirmation(
    State(state): State<AppState>,
    Path(affirmation_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Affirmation>>> {
    let mut affirmation = fetch_active(&state, affirmation_id).await?;

    affirmation.record_usage(Utc::now());
    persist_metadata(&state, &affirmation).await?;

    Ok(Json(ApiResponse::new(affirmation)))
}

pub async fn my_favorites(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<serde_json::Value>> {
    let favorites = sqlx::query_as::<_, Affirmation>(
        r#"
        SELECT * FROM affirmations
        WHERE is_active = true AND favorites @> ARRAY[$1]
        ORDER BY favorite_count DESC, created_at ASC
        "#,
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "count": favorites.len(),
        "data": favorites,
    })))
}

pub async fn favorite_affirmation(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(affirmation_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Affirmation>>> {
    let mut affirmation = fetch_active(&state, affirmation_id).await?;

    affirmation.add_favorite(auth_user.id);
    persist_favorites(&state, &affirmation).await?;

    Ok(Json(ApiResponse::new(affirmation)))
}

pub async fn unfavorite_affirmation(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(affirmation_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Affirmation>>> {
    let mut affirmation = fetch_active(&state, affirmation_id).await?;

    affirmation.remove_favorite(auth_user.id);
    persist_favorites(&state, &affirmation).await?;

    Ok(Json(ApiResponse::new(affirmation)))
}

pub async fn rate_affirmation(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(affirmation_id): Path<Uuid>,
    Json(body): Json<RateAffirmationRequest>,
) -> AppResult<Json<ApiResponse<Affirmation>>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let mut affirmation = fetch_active(&state, affirmation_id).await?;

    affirmation.apply_rating(auth_user.id, body.rating);

    sqlx::query(
        r#"
        UPDATE affirmations
        SET ratings = $2, average_rating = $3, metadata = $4, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(affirmation.id)
    .bind(&affirmation.ratings)
    .bind(affirmation.average_rating)
    .bind(&affirmation.metadata)
    .execute(&state.db)
    .await?;

    Ok(Json(ApiResponse::new(affirmation)))
}

pub async fn create_affirmation(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateAffirmationRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Affirmation>>)> {
    require_admin(&auth_user)?;
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let affirmation = sqlx::query_as::<_, Affirmation>(
        r#"
        INSERT INTO affirmations (id, text, category, mood_association, is_custom, created_by, source)
        VALUES ($1, $2, $3, $4, true, $5, 'custom')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&body.text)
    .bind(body.category)
    .bind(&body.mood_association)
    .bind(auth_user.id)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(affirmation))))
}

pub async fn update_affirmation(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(affirmation_id): Path<Uuid>,
    Json(body): Json<UpdateAffirmationRequest>,
) -> AppResult<Json<ApiResponse<Affirmation>>> {
    require_admin(&auth_user)?;
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let affirmation = sqlx::query_as::<_, Affirmation>(
        r#"
        UPDATE affirmations SET
            text = COALESCE($2, text),
            category = COALESCE($3, category),
            mood_association = COALESCE($4, mood_association),
            is_active = COALESCE($5, is_active),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(affirmation_id)
    .bind(&body.text)
    .bind(body.category)
    .bind(&body.mood_association)
    .bind(body.is_active)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Affirmation not found".into()))?;

    Ok(Json(ApiResponse::new(affirmation)))
}

pub async fn delete_affirmation(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(affirmation_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    require_admin(&auth_user)?;

    let result = sqlx::query("DELETE FROM affirmations WHERE id = $1")
        .bind(affirmation_id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Affirmation not found".into()));
    }

    Ok(Json(serde_json::json!({ "success": true, "data": {} })))
}

fn require_admin(auth_user: &AuthUser) -> AppResult<()> {
    if auth_user.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

async fn fetch_active(state: &AppState, id: Uuid) -> AppResult<Affirmation> {
    sqlx::query_as::<_, Affirmation>(
        "SELECT * FROM affirmations WHERE id = $1 AND is_active = true",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound("Affirmation not found".into()))
}

async fn persist_favorites(state: &AppState, affirmation: &Affirmation) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE affirmations
        SET favorites = $2, favorite_count = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(affirmation.id)
    .bind(&affirmation.favorites)
    .bind(affirmation.favorite_count)
    .execute(&state.db)
    .await?;
    Ok(())
}

async fn persist_metadata(state: &AppState, affirmation: &Affirmation) -> AppResult<()> {
    sqlx::query("UPDATE affirmations SET metadata = $2, updated_at = NOW() WHERE id = $1")
        .bind(affirmation.id)
        .bind(&affirmation.metadata)
        .execute(&state.db)
        .await?;
    Ok(())
}
