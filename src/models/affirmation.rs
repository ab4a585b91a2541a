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
#[sqlx(type_name = "affirmation_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AffirmationCategory {
    SelfLove,
    Confidence,
    Motivation,
    Gratitude,
    Anxiety,
    Stress,
    Positivity,
    General,
    Other,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[sqlx(type_name = "mood_association", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MoodAssociation {
    Happy,
    Sad,
    Anxious,
    Stressed,
    Angry,
    Tired,
    Neutral,
    Excited,
    Grateful,
    Overwhelmed,
    All,
}

impl PgHasArrayType for MoodAssociation {
    fn array_type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("_mood_association")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AffirmationRating {
    pub user_id: Uuid,
    pub rating: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AffirmationMetadata {
    #[serde(default)]
    pub usage_count: i64,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
    #[serde(default)]
    pub effectiveness: f64,
    #[serde(default)]
    pub rating_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Affirmation {
    pub id: Uuid,
    pub text: String,
    pub category: AffirmationCategory,
    pub mood_association: Vec<MoodAssociation>,
    pub is_active: bool,
    pub is_custom: bool,
    pub created_by: Option<Uuid>,
    pub source: String,
    pub favorites: Vec<Uuid>,
    pub favorite_count: i32,
    pub ratings: Json<Vec<AffirmationRating>>,
    pub average_rating: f64,
    pub metadata: Json<AffirmationMetadata>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Affirmation {
    /// Add a user to the favorites set. Idempotent; keeps favorite_count in
    /// sync with the set.
    pub fn add_favorite(&mut self, user_id: Uuid) {
        if !self.favorites.contains(&user_id) {
            self.favorites.push(user_id);
        }
        self.favorite_count = self.favorites.len() as i32;
    }

    pub fn remove_favorite(&mut self, user_id: Uuid) {
        self.favorites.retain(|u| *u != user_id);
        self.favorite_count = self.favorites.len() as i32;
    }

    /// Upsert the caller's rating, recompute the average over all ratings,
    /// and fold the new rating into metadata.effectiveness as an incremental
    /// weighted average.
    pub fn apply_rating(&mut self, user_id: Uuid, rating: i32) {
        match self.ratings.0.iter_mut().find(|r| r.user_id == user_id) {
            Some(existing) => existing.rating = rating,
            None => self.ratings.0.push(AffirmationRating { user_id, rating }),
        }

        let total = self.ratings.0.len() as f64;
        let sum: i64 = self.ratings.0.iter().map(|r| i64::from(r.rating)).sum();
        self.average_rating = sum as f64 / total;

        let meta = &mut self.metadata.0;
        let prior = meta.rating_count as f64;
        meta.effectiveness = (meta.effectiveness * prior + f64::from(rating)) / (prior + 1.0);
        meta.rating_count += 1;
    }

    pub fn record_usage(&mut self, now: DateTime<Utc>) {
        self.metadata.0.usage_count += 1;
        self.metadata.0.last_used = Some(now);
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAffirmationRequest {
    #[validate(length(
        min = 1,
        max = 500,
        message = "Affirmation text must be 1-500 characters"
    ))]
    pub text: String,

    pub category: AffirmationCategory,

    #[serde(default = "default_mood_association")]
    pub mood_association: Vec<MoodAssociation>,
}

fn default_mood_association() -> Vec<MoodAssociation> {
    vec![MoodAssociation::All]
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAffirmationRequest {
    #[validate(length(
        min = 1,
        max = 500,
        message = "Affirmation text must be 1-500 characters"
    ))]
    pub text: Option<String>,

    pub category: Option<AffirmationCategory>,
    pub mood_association: Option<Vec<MoodAssociation>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RateAffirmationRequest {
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i32,
}

#[derive(Debug, Deserialize)]
pub struct AffirmationQuery {
    pub category: Option<AffirmationCategory>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RandomAffirmationQuery {
    pub mood: Option<MoodAssociation>,
    pub category: Option<AffirmationCategory>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn affirmation() -> Affirmation {
        Affirmation {
            id: Uuid::new_v4(),
            text: "I am enough.".into(),
            category: AffirmationCategory::SelfLove,
            mood_association: vec![MoodAssociation::All],
            is_active: true,
            is_custom: false,
            created_by: None,
            source: "system".into(),
            favorites: vec![],
            favorite_count: 0,
            ratings: Json(vec![]),
            average_rating: 0.0,
            metadata: Json(AffirmationMetadata::default()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn favorite_count_tracks_set_size() {
        let mut a = affirmation();
        let u1 = Uuid::new_v4();
        let u2 = Uuid::new_v4();

        a.add_favorite(u1);
        a.add_favorite(u2);
        a.add_favorite(u1); // idempotent
        assert_eq!(a.favorite_count, 2);

        a.remove_favorite(u1);
        assert_eq!(a.favorite_count, 1);
        assert_eq!(a.favorites, vec![u2]);
    }

    #[test]
    fn rating_upsert_recomputes_average() {
        let mut a = affirmation();
        let u1 = Uuid::new_v4();
        let u2 = Uuid::new_v4();

        a.apply_rating(u1, 4);
        a.apply_rating(u2, 2);
        assert_eq!(a.average_rating, 3.0);

        // Re-rating replaces, it does not append
        a.apply_rating(u1, 5);
        assert_eq!(a.ratings.0.len(), 2);
        assert_eq!(a.average_rating, 3.5);
    }

    #[test]
    fn effectiveness_is_incremental_weighted_average() {
        let mut a = affirmation();
        a.apply_rating(Uuid::new_v4(), 4);
        assert_eq!(a.metadata.0.effectiveness, 4.0);

        a.apply_rating(Uuid::new_v4(), 2);
        assert_eq!(a.metadata.0.effectiveness, 3.0);
        assert_eq!(a.metadata.0.rating_count, 2);
    }
}
