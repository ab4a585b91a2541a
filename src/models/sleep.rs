use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgHasArrayType, PgTypeInfo};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[sqlx(type_name = "sleep_aid", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SleepAid {
    Melatonin,
    PrescriptionMeds,
    NaturalSupplements,
    WhiteNoise,
    WeightedBlanket,
    EyeMask,
    EarPlugs,
    Aromatherapy,
    None,
    Other,
}

impl PgHasArrayType for SleepAid {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("_sleep_aid")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "wake_up_mood", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WakeUpMood {
    Refreshed,
    Tired,
    Groggy,
    Energetic,
    Irritable,
    Anxious,
    Neutral,
    Other,
}

// Sleep environment lives in a JSONB column, so these are serde-only.

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum NoiseLevel {
    VeryQuiet,
    Quiet,
    Moderate,
    Noisy,
    VeryNoisy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum LightLevel {
    PitchBlack,
    VeryDark,
    Dim,
    SomeLight,
    Bright,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Temperature {
    VeryCold,
    Cold,
    Comfortable,
    Warm,
    Hot,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Comfort {
    VeryUncomfortable,
    Uncomfortable,
    Neutral,
    Comfortable,
    VeryComfortable,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SleepEnvironment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_level: Option<NoiseLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light_level: Option<LightLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Temperature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comfort: Option<Comfort>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum BedtimeActivity {
    ScreenTime,
    Reading,
    Shower,
    Meditation,
    Exercise,
    Eating,
    Drinking,
    Socializing,
    Working,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityBeforeBed {
    pub activity: BedtimeActivity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SleepEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub sleep_time: DateTime<Utc>,
    pub wake_time: DateTime<Utc>,
    pub quality: i32,
    pub interruptions: i32,
    pub note: Option<String>,
    pub sleep_environment: Option<Json<SleepEnvironment>>,
    pub activities_before_bed: Json<Vec<ActivityBeforeBed>>,
    pub sleep_aids: Vec<SleepAid>,
    pub wake_up_mood: Option<WakeUpMood>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSleepEntryRequest {
    pub sleep_time: DateTime<Utc>,
    pub wake_time: DateTime<Utc>,

    #[validate(range(min = 1, max = 5, message = "quality must be between 1 and 5"))]
    pub quality: i32,

    #[validate(range(min = 0, message = "interruptions cannot be negative"))]
    #[serde(default)]
    pub interruptions: i32,

    #[validate(length(max = 1000, message = "Note cannot be more than 1000 characters"))]
    pub note: Option<String>,

    pub sleep_environment: Option<SleepEnvironment>,

    #[serde(default)]
    pub activities_before_bed: Vec<ActivityBeforeBed>,

    #[serde(default)]
    pub sleep_aids: Vec<SleepAid>,

    pub wake_up_mood: Option<WakeUpMood>,
}

impl CreateSleepEntryRequest {
    /// Rejected before persistence: a night must start before it ends.
    pub fn validate_times(&self) -> Result<(), String> {
        if self.sleep_time >= self.wake_time {
            return Err("sleepTime must be before wakeTime".into());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSleepEntryRequest {
    pub sleep_time: Option<DateTime<Utc>>,
    pub wake_time: Option<DateTime<Utc>>,

    #[validate(range(min = 1, max = 5, message = "quality must be between 1 and 5"))]
    pub quality: Option<i32>,

    #[validate(range(min = 0, message = "interruptions cannot be negative"))]
    pub interruptions: Option<i32>,

    #[validate(length(max = 1000, message = "Note cannot be more than 1000 characters"))]
    pub note: Option<String>,

    pub sleep_environment: Option<SleepEnvironment>,
    pub activities_before_bed: Option<Vec<ActivityBeforeBed>>,
    pub sleep_aids: Option<Vec<SleepAid>>,
    pub wake_up_mood: Option<WakeUpMood>,
}

#[derive(Debug, Deserialize)]
pub struct SleepQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub quality: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(sleep: DateTime<Utc>, wake: DateTime<Utc>) -> CreateSleepEntryRequest {
        CreateSleepEntryRequest {
            sleep_time: sleep,
            wake_time: wake,
            quality: 3,
            interruptions: 0,
            note: None,
            sleep_environment: None,
            activities_before_bed: vec![],
            sleep_aids: vec![],
            wake_up_mood: None,
        }
    }

    #[test]
    fn rejects_wake_before_sleep() {
        let sleep = Utc.with_ymd_and_hms(2026, 3, 1, 23, 0, 0).unwrap();
        let wake = Utc.with_ymd_and_hms(2026, 3, 1, 7, 0, 0).unwrap();
        assert!(request(sleep, wake).validate_times().is_err());
    }

    #[test]
    fn rejects_equal_times() {
        let t = Utc.with_ymd_and_hms(2026, 3, 1, 23, 0, 0).unwrap();
        assert!(request(t, t).validate_times().is_err());
    }

    #[test]
    fn accepts_overnight_entry() {
        let sleep = Utc.with_ymd_and_hms(2026, 3, 1, 23, 0, 0).unwrap();
        let wake = Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0).unwrap();
        assert!(request(sleep, wake).validate_times().is_ok());
    }
}
