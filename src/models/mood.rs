use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgHasArrayType, PgTypeInfo};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[sqlx(type_name = "mood_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    Anxious,
    Stressed,
    Calm,
    Tired,
    Energetic,
    Neutral,
    Excited,
    Grateful,
    Overwhelmed,
    Frustrated,
    Content,
    Proud,
    Hopeful,
    Lonely,
    Motivated,
    Bored,
    Other,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Anxious => "anxious",
            Mood::Stressed => "stressed",
            Mood::Calm => "calm",
            Mood::Tired => "tired",
            Mood::Energetic => "energetic",
            Mood::Neutral => "neutral",
            Mood::Excited => "excited",
            Mood::Grateful => "grateful",
            Mood::Overwhelmed => "overwhelmed",
            Mood::Frustrated => "frustrated",
            Mood::Content => "content",
            Mood::Proud => "proud",
            Mood::Hopeful => "hopeful",
            Mood::Lonely => "lonely",
            Mood::Motivated => "motivated",
            Mood::Bored => "bored",
            Mood::Other => "other",
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[sqlx(type_name = "mood_activity", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MoodActivity {
    Exercise,
    Work,
    Social,
    Family,
    Hobby,
    Rest,
    Meditation,
    Reading,
    WatchingTv,
    Gaming,
    Cooking,
    Cleaning,
    Shopping,
    Commuting,
    Learning,
    Other,
}

impl PgHasArrayType for MoodActivity {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("_mood_activity")
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[sqlx(type_name = "mood_trigger", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MoodTrigger {
    Work,
    Relationships,
    Health,
    Finances,
    News,
    SocialMedia,
    LackOfSleep,
    Diet,
    Weather,
    NoSpecificTrigger,
    Other,
}

impl PgHasArrayType for MoodTrigger {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("_mood_trigger")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mood: Mood,
    pub mood_score: i32,
    pub note: Option<String>,
    pub activities: Vec<MoodActivity>,
    pub triggers: Vec<MoodTrigger>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMoodEntryRequest {
    pub mood: Mood,

    #[validate(range(min = 1, max = 10, message = "moodScore must be between 1 and 10"))]
    pub mood_score: i32,

    #[validate(length(max = 1000, message = "Note cannot be more than 1000 characters"))]
    pub note: Option<String>,

    #[serde(default)]
    pub activities: Vec<MoodActivity>,

    #[serde(default)]
    pub triggers: Vec<MoodTrigger>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMoodEntryRequest {
    pub mood: Option<Mood>,

    #[validate(range(min = 1, max = 10, message = "moodScore must be between 1 and 10"))]
    pub mood_score: Option<i32>,

    #[validate(length(max = 1000, message = "Note cannot be more than 1000 characters"))]
    pub note: Option<String>,

    pub activities: Option<Vec<MoodActivity>>,
    pub triggers: Option<Vec<MoodTrigger>>,
}

#[derive(Debug, Deserialize)]
pub struct MoodQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    /// Lookback window in days.
    pub days: Option<i64>,
}
