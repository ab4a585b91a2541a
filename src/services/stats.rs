//! Summary statistics over wellness entries.
//!
//! Every function here is a pure function of already-fetched rows: handlers
//! query the window they need and hand the slice over. Empty slices produce
//! zero counts and `None` averages, never a division by zero.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::mood::{Mood, MoodEntry};
use crate::models::sleep::SleepEntry;
use crate::models::stress::{StressEntry, Stressor};

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sleep duration in hours with overnight correction: a wake time that
/// precedes the sleep time on the clock is treated as the next day.
pub fn sleep_duration_hours(sleep_time: DateTime<Utc>, wake_time: DateTime<Utc>) -> f64 {
    let mut secs = (wake_time - sleep_time).num_seconds() as f64;
    if secs < 0.0 {
        secs += 24.0 * 3600.0;
    }
    secs / 3600.0
}

#[derive(Debug, Serialize)]
pub struct MoodStats {
    pub total_entries: usize,
    pub avg_mood_score: Option<f64>,
}

pub fn mood_stats(entries: &[MoodEntry]) -> MoodStats {
    let scores: Vec<f64> = entries.iter().map(|e| f64::from(e.mood_score)).collect();
    MoodStats {
        total_entries: entries.len(),
        avg_mood_score: mean(&scores),
    }
}

#[derive(Debug, Serialize)]
pub struct MoodBucket {
    pub mood: Mood,
    pub count: usize,
    pub avg_mood_score: f64,
}

/// Per-mood counts and averages, most frequent first. Ties resolve by mood
/// declaration order so the output is deterministic.
pub fn mood_breakdown(entries: &[MoodEntry]) -> Vec<MoodBucket> {
    let mut groups: BTreeMap<Mood, (usize, i64)> = BTreeMap::new();
    for e in entries {
        let slot = groups.entry(e.mood).or_insert((0, 0));
        slot.0 += 1;
        slot.1 += i64::from(e.mood_score);
    }

    let mut buckets: Vec<MoodBucket> = groups
        .into_iter()
        .map(|(mood, (count, sum))| MoodBucket {
            mood,
            count,
            avg_mood_score: sum as f64 / count as f64,
        })
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then(a.mood.cmp(&b.mood)));
    buckets
}

#[derive(Debug, Serialize)]
pub struct SleepStats {
    pub total_entries: usize,
    pub avg_duration: Option<f64>,
    pub avg_quality: Option<f64>,
    pub avg_interruptions: Option<f64>,
    pub best_night: Option<i32>,
    pub worst_night: Option<i32>,
    pub total_sleep: f64,
}

pub fn sleep_stats(entries: &[SleepEntry]) -> SleepStats {
    let durations: Vec<f64> = entries
        .iter()
        .map(|e| sleep_duration_hours(e.sleep_time, e.wake_time))
        .collect();
    let qualities: Vec<f64> = entries.iter().map(|e| f64::from(e.quality)).collect();
    let interruptions: Vec<f64> = entries.iter().map(|e| f64::from(e.interruptions)).collect();

    SleepStats {
        total_entries: entries.len(),
        avg_duration: mean(&durations),
        avg_quality: mean(&qualities),
        avg_interruptions: mean(&interruptions),
        best_night: entries.iter().map(|e| e.quality).max(),
        worst_night: entries.iter().map(|e| e.quality).min(),
        total_sleep: durations.iter().sum(),
    }
}

#[derive(Debug, Serialize)]
pub struct ScoreBucket {
    pub score: i32,
    pub count: usize,
}

/// Count entries per quality score (1-5). Scores with no entries are omitted.
pub fn quality_distribution(entries: &[SleepEntry]) -> Vec<ScoreBucket> {
    distribution(entries.iter().map(|e| e.quality))
}

/// Count entries per stress level (1-10). Levels with no entries are omitted.
pub fn stress_distribution(entries: &[StressEntry]) -> Vec<ScoreBucket> {
    distribution(entries.iter().map(|e| e.stress_level))
}

fn distribution(scores: impl Iterator<Item = i32>) -> Vec<ScoreBucket> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for s in scores {
        *counts.entry(s).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(score, count)| ScoreBucket { score, count })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct StressStats {
    pub total_entries: usize,
    pub avg_stress_level: Option<f64>,
    pub max_stress_level: Option<i32>,
    pub min_stress_level: Option<i32>,
}

pub fn stress_stats(entries: &[StressEntry]) -> StressStats {
    let levels: Vec<f64> = entries.iter().map(|e| f64::from(e.stress_level)).collect();
    StressStats {
        total_entries: entries.len(),
        avg_stress_level: mean(&levels),
        max_stress_level: entries.iter().map(|e| e.stress_level).max(),
        min_stress_level: entries.iter().map(|e| e.stress_level).min(),
    }
}

#[derive(Debug, Serialize)]
pub struct StressorCount {
    pub stressor: Stressor,
    pub count: usize,
    pub avg_stress_level: f64,
}

/// Stressors ranked by how often they appear, with the average stress level
/// reported on entries naming them. `limit = usize::MAX` returns all.
pub fn top_stressors(entries: &[StressEntry], limit: usize) -> Vec<StressorCount> {
    let mut groups: BTreeMap<Stressor, (usize, i64)> = BTreeMap::new();
    for e in entries {
        for s in &e.stressors {
            let slot = groups.entry(*s).or_insert((0, 0));
            slot.0 += 1;
            slot.1 += i64::from(e.stress_level);
        }
    }

    let mut ranked: Vec<StressorCount> = groups
        .into_iter()
        .map(|(stressor, (count, sum))| StressorCount {
            stressor,
            count,
            avg_stress_level: sum as f64 / count as f64,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then(a.stressor.cmp(&b.stressor)));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use sqlx::types::Json;
    use uuid::Uuid;

    fn sleep_entry(sleep_time: DateTime<Utc>, hours: f64, quality: i32) -> SleepEntry {
        SleepEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            sleep_time,
            wake_time: sleep_time + Duration::seconds((hours * 3600.0) as i64),
            quality,
            interruptions: 0,
            note: None,
            sleep_environment: None,
            activities_before_bed: Json(vec![]),
            sleep_aids: vec![],
            wake_up_mood: None,
            created_at: sleep_time,
            updated_at: sleep_time,
        }
    }

    fn mood_entry(mood: Mood, score: i32) -> MoodEntry {
        let now = Utc::now();
        MoodEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            mood,
            mood_score: score,
            note: None,
            activities: vec![],
            triggers: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    fn stress_entry(level: i32, stressors: Vec<Stressor>) -> StressEntry {
        let now = Utc::now();
        StressEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            stress_level: level,
            stressors,
            physical_symptoms: vec![],
            coping_methods: vec![],
            note: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        let stats = sleep_stats(&[]);
        assert_eq!(stats.total_entries, 0);
        assert!(stats.avg_duration.is_none());
        assert!(stats.best_night.is_none());
    }

    #[test]
    fn mean_is_exact_sum_over_count() {
        let values = [6.0, 7.5, 8.0];
        assert_eq!(mean(&values), Some(21.5 / 3.0));
    }

    #[test]
    fn sleep_stats_week_scenario() {
        // 3 entries over 7 days: qualities [2,4,5], durations [6.0,7.5,8.0]
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 23, 0, 0).unwrap();
        let entries = vec![
            sleep_entry(base, 6.0, 2),
            sleep_entry(base + Duration::days(2), 7.5, 4),
            sleep_entry(base + Duration::days(4), 8.0, 5),
        ];

        let stats = sleep_stats(&entries);
        assert_eq!(stats.total_entries, 3);
        assert!((stats.avg_quality.unwrap() - 11.0 / 3.0).abs() < 1e-9);
        assert!((stats.avg_duration.unwrap() - 7.166_666_666_666_667).abs() < 1e-9);
        assert_eq!(stats.best_night, Some(5));
        assert_eq!(stats.worst_night, Some(2));
        assert!((stats.total_sleep - 21.5).abs() < 1e-9);
    }

    #[test]
    fn duration_applies_overnight_correction() {
        // Raw subtraction would be negative; corrected value adds 24h.
        let sleep = Utc.with_ymd_and_hms(2026, 3, 1, 23, 0, 0).unwrap();
        let wake = Utc.with_ymd_and_hms(2026, 3, 1, 7, 0, 0).unwrap();
        let d = sleep_duration_hours(sleep, wake);
        assert!((d - 8.0).abs() < 1e-9);
        assert!(d >= 0.0);
    }

    #[test]
    fn mood_breakdown_sorts_by_count_desc() {
        let entries = vec![
            mood_entry(Mood::Happy, 8),
            mood_entry(Mood::Happy, 6),
            mood_entry(Mood::Anxious, 3),
        ];
        let buckets = mood_breakdown(&entries);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].mood, Mood::Happy);
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[0].avg_mood_score, 7.0);
        assert_eq!(buckets[1].mood, Mood::Anxious);
    }

    #[test]
    fn distribution_omits_empty_buckets() {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 23, 0, 0).unwrap();
        let entries = vec![
            sleep_entry(base, 8.0, 2),
            sleep_entry(base, 8.0, 2),
            sleep_entry(base, 8.0, 5),
        ];
        let dist = quality_distribution(&entries);
        assert_eq!(dist.len(), 2);
        assert_eq!((dist[0].score, dist[0].count), (2, 2));
        assert_eq!((dist[1].score, dist[1].count), (5, 1));
    }

    #[test]
    fn top_stressors_ranked_by_frequency() {
        let entries = vec![
            stress_entry(8, vec![Stressor::Work, Stressor::Financial]),
            stress_entry(6, vec![Stressor::Work]),
            stress_entry(4, vec![Stressor::Family]),
        ];
        let top = top_stressors(&entries, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].stressor, Stressor::Work);
        assert_eq!(top[0].count, 2);
        assert_eq!(top[0].avg_stress_level, 7.0);
    }
}
