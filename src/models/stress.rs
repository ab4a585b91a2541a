use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgHasArrayType, PgTypeInfo};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[sqlx(type_name = "stressor", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Stressor {
    Work,
    Relationships,
    Health,
    Financial,
    Academic,
    Family,
    Social,
    TimeManagement,
    Uncertainty,
    Other,
}

impl Stressor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stressor::Work => "work",
            Stressor::Relationships => "relationships",
            Stressor::Health => "health",
            Stressor::Financial => "financial",
            Stressor::Academic => "academic",
            Stressor::Family => "family",
            Stressor::Social => "social",
            Stressor::TimeManagement => "time_management",
            Stressor::Uncertainty => "uncertainty",
            Stressor::Other => "other",
        }
    }
}

impl PgHasArrayType for Stressor {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("_stressor")
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[sqlx(type_name = "physical_symptom", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PhysicalSymptom {
    Headache,
    Fatigue,
    MuscleTension,
    StomachIssues,
    ChestPain,
    SleepProblems,
    AppetiteChanges,
    Dizziness,
    RapidHeartbeat,
    Sweating,
    None,
}

impl PgHasArrayType for PhysicalSymptom {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("_physical_symptom")
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[sqlx(type_name = "coping_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CopingMethod {
    Exercise,
    Meditation,
    Talking,
    Hobbies,
    Rest,
    ProfessionalHelp,
    TimeManagement,
    RelaxationTechniques,
    Other,
}

impl PgHasArrayType for CopingMethod {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("_coping_method")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StressEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub stress_level: i32,
    pub stressors: Vec<Stressor>,
    pub physical_symptoms: Vec<PhysicalSymptom>,
    pub coping_methods: Vec<CopingMethod>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStressEntryRequest {
    #[validate(range(min = 1, max = 10, message = "stressLevel must be between 1 and 10"))]
    pub stress_level: i32,

    #[validate(length(min = 1, message = "At least one stressor is required"))]
    pub stressors: Vec<Stressor>,

    #[serde(default)]
    pub physical_symptoms: Vec<PhysicalSymptom>,

    #[serde(default)]
    pub coping_methods: Vec<CopingMethod>,

    #[validate(length(max = 1000, message = "Note cannot be more than 1000 characters"))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStressEntryRequest {
    #[validate(range(min = 1, max = 10, message = "stressLevel must be between 1 and 10"))]
    pub stress_level: Option<i32>,

    #[validate(length(min = 1, message = "At least one stressor is required"))]
    pub stressors: Option<Vec<Stressor>>,

    pub physical_symptoms: Option<Vec<PhysicalSymptom>>,
    pub coping_methods: Option<Vec<CopingMethod>>,

    #[validate(length(max = 1000, message = "Note cannot be more than 1000 characters"))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StressQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub min_stress_level: Option<i32>,
    pub max_stress_level: Option<i32>,
}
