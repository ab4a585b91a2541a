use axum::{extract::State, Extension, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::affirmation::Affirmation;
use crate::models::mood::MoodEntry;
use crate::models::sleep::SleepEntry;
use crate::models::stress::StressEntry;
use crate::services::roadmap::{
    build_prompt, mood_summary, parse_roadmap, sleep_summary, stress_summary, SYSTEM_PROMPT,
};
use crate::AppState;

const MOOD_WINDOW: i64 = 30;
const STRESS_WINDOW: i64 = 30;
const SLEEP_WINDOW: i64 = 14;
const FAVORITE_LIMIT: i64 = 10;

/// Generate a personalized 4-week healing roadmap from the user's recent
/// entries. The upstream AI call is best-effort: transport or API failure
/// still returns 200 with `success: false` so clients can degrade gracefully.
pub async fn generate_roadmap(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<serde_json::Value>> {
    // Four read-only queries over disjoint tables
    let (moods, stresses, sleeps, favorites) = tokio::try_join!(
        fetch_moods(&state, auth_user.id),
        fetch_stresses(&state, auth_user.id),
        fetch_sleeps(&state, auth_user.id),
        fetch_favorites(&state, auth_user.id),
    )?;

    let mood = mood_summary(&moods);
    let stress = stress_summary(&stresses);
    let sleep = sleep_summary(&sleeps);

    let prompt = build_prompt(mood.as_ref(), stress.as_ref(), sleep.as_ref(), &favorites);

    match call_claude(&state, &prompt).await {
        Ok(text) => {
            let roadmap = parse_roadmap(&text);
            Ok(Json(serde_json::json!({
                "success": true,
                "generated_at": Utc::now(),
                "data": roadmap,
            })))
        }
        Err(e) => {
            tracing::warn!(error = %e, user_id = %auth_user.id, "Roadmap generation failed");
            Ok(Json(serde_json::json!({
                "success": false,
                "message": "Unable to generate healing roadmap at this time. Please try again later.",
                "error": e.to_string(),
            })))
        }
    }
}

async fn fetch_moods(state: &AppState, user_id: Uuid) -> AppResult<Vec<MoodEntry>> {
    let entries = sqlx::query_as::<_, MoodEntry>(
        "SELECT * FROM mood_entries WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(MOOD_WINDOW)
    .fetch_all(&state.db)
    .await?;
    Ok(entries)
}

async fn fetch_stresses(state: &AppState, user_id: Uuid) -> AppResult<Vec<StressEntry>> {
    let entries = sqlx::query_as::<_, StressEntry>(
        "SELECT * FROM stress_entries WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(STRESS_WINDOW)
    .fetch_all(&state.db)
    .await?;
    Ok(entries)
}

async fn fetch_sleeps(state: &AppState, user_id: Uuid) -> AppResult<Vec<SleepEntry>> {
    let entries = sqlx::query_as::<_, SleepEntry>(
        "SELECT * FROM sleep_entries WHERE user_id = $1 ORDER BY sleep_time DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(SLEEP_WINDOW)
    .fetch_all(&state.db)
    .await?;
    Ok(entries)
}

async fn fetch_favorites(state: &AppState, user_id: Uuid) -> AppResult<Vec<Affirmation>> {
    let favorites = sqlx::query_as::<_, Affirmation>(
        r#"
        SELECT * FROM affirmations
        WHERE is_active = true AND favorites @> ARRAY[$1]
        ORDER BY favorite_count DESC, created_at ASC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(FAVORITE_LIMIT)
    .fetch_all(&state.db)
    .await?;
    Ok(favorites)
}

async fn call_claude(state: &AppState, prompt: &str) -> Result<String, anyhow::Error> {
    // 30-second timeout to prevent indefinite hangs
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()?;

    let response = client
        .post("https://api.anthropic.com/v1/messages")
        .header("x-api-key", &state.config.claude_api_key)
        .header("anthropic-version", "2023-06-01")
        .header("content-type", "application/json")
        .json(&serde_json::json!({
            "model": state.config.claude_model,
            "max_tokens": 2048,
            "system": SYSTEM_PROMPT,
            "messages": [{
                "role": "user",
                "content": prompt
            }]
        }))
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Claude API error {}: {}", status, body);
    }

    let claude_response: serde_json::Value = response.json().await?;
    let text = claude_response["content"][0]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string();

    Ok(text)
}
