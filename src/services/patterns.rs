//! Bucketed pattern analysis: day-of-week and hour-of-day groupings,
//! environmental-factor impact, schedule consistency, and coping-method
//! ranking. Buckets with zero entries are omitted, never zero-filled.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::Serialize;

use crate::models::sleep::{BedtimeActivity, Comfort, SleepAid, SleepEntry};
use crate::models::stress::{CopingMethod, StressEntry};
use crate::services::stats::sleep_duration_hours;

/// A bedtime or wake-time spread above this many minutes (population standard
/// deviation) is flagged as an inconsistent schedule.
pub const SCHEDULE_VARIANCE_THRESHOLD_MINUTES: f64 = 60.0;

/// Per-day-of-week sleep pattern. `day_of_week` is 1-7 with 1 = Sunday.
#[derive(Debug, Serialize)]
pub struct SleepDayPattern {
    pub day_of_week: u32,
    pub avg_duration: f64,
    pub avg_quality: f64,
    pub count: usize,
}

pub fn weekly_sleep_patterns(entries: &[SleepEntry]) -> Vec<SleepDayPattern> {
    let mut groups: BTreeMap<u32, SleepAccumulator> = BTreeMap::new();
    for e in entries {
        groups
            .entry(e.sleep_time.weekday().number_from_sunday())
            .or_default()
            .push(e);
    }
    groups
        .into_iter()
        .map(|(day_of_week, acc)| SleepDayPattern {
            day_of_week,
            avg_duration: acc.avg_duration(),
            avg_quality: acc.avg_quality(),
            count: acc.count,
        })
        .collect()
}

/// Per-category sleep impact: average quality and duration for entries
/// sharing an environment comfort level, before-bed activity, or sleep aid.
#[derive(Debug, Serialize)]
pub struct SleepFactorImpact<K> {
    pub key: K,
    pub avg_quality: f64,
    pub avg_duration: f64,
    pub count: usize,
}

pub fn environment_comfort_impact(entries: &[SleepEntry]) -> Vec<SleepFactorImpact<Comfort>> {
    sleep_factor_impact(entries, |e| {
        e.sleep_environment
            .as_ref()
            .and_then(|env| env.0.comfort)
            .into_iter()
            .collect()
    })
}

pub fn bedtime_activity_impact(
    entries: &[SleepEntry],
) -> Vec<SleepFactorImpact<BedtimeActivity>> {
    sleep_factor_impact(entries, |e| {
        e.activities_before_bed.0.iter().map(|a| a.activity).collect()
    })
}

pub fn sleep_aid_effectiveness(entries: &[SleepEntry]) -> Vec<SleepFactorImpact<SleepAid>> {
    sleep_factor_impact(entries, |e| e.sleep_aids.clone())
}

/// Group entries by each key the extractor yields (an entry naming several
/// aids or activities counts once per key), then sort by avg quality
/// descending with a deterministic key tie-break.
fn sleep_factor_impact<K, F>(entries: &[SleepEntry], keys: F) -> Vec<SleepFactorImpact<K>>
where
    K: Ord + Copy,
    F: Fn(&SleepEntry) -> Vec<K>,
{
    let mut groups: BTreeMap<K, SleepAccumulator> = BTreeMap::new();
    for e in entries {
        for key in keys(e) {
            groups.entry(key).or_default().push(e);
        }
    }

    let mut impacts: Vec<SleepFactorImpact<K>> = groups
        .into_iter()
        .map(|(key, acc)| SleepFactorImpact {
            key,
            avg_quality: acc.avg_quality(),
            avg_duration: acc.avg_duration(),
            count: acc.count,
        })
        .collect();
    impacts.sort_by(|a, b| {
        b.avg_quality
            .partial_cmp(&a.avg_quality)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.key.cmp(&b.key))
    });
    impacts
}

#[derive(Default)]
struct SleepAccumulator {
    count: usize,
    quality_sum: i64,
    duration_sum: f64,
}

impl SleepAccumulator {
    fn push(&mut self, e: &SleepEntry) {
        self.count += 1;
        self.quality_sum += i64::from(e.quality);
        self.duration_sum += sleep_duration_hours(e.sleep_time, e.wake_time);
    }

    fn avg_quality(&self) -> f64 {
        self.quality_sum as f64 / self.count as f64
    }

    fn avg_duration(&self) -> f64 {
        self.duration_sum / self.count as f64
    }
}

/// Per-day-of-week stress pattern (1 = Sunday).
#[derive(Debug, Serialize)]
pub struct StressDayPattern {
    pub day_of_week: u32,
    pub avg_stress_level: f64,
    pub count: usize,
}

pub fn weekly_stress_patterns(entries: &[StressEntry]) -> Vec<StressDayPattern> {
    stress_buckets(entries, |e| e.created_at.weekday().number_from_sunday())
        .into_iter()
        .map(|(day_of_week, avg, count)| StressDayPattern {
            day_of_week,
            avg_stress_level: avg,
            count,
        })
        .collect()
}

/// Per-hour-of-day stress pattern (0-23).
#[derive(Debug, Serialize)]
pub struct StressHourPattern {
    pub hour: u32,
    pub avg_stress_level: f64,
    pub count: usize,
}

pub fn hourly_stress_patterns(entries: &[StressEntry]) -> Vec<StressHourPattern> {
    stress_buckets(entries, |e| e.created_at.hour())
        .into_iter()
        .map(|(hour, avg, count)| StressHourPattern {
            hour,
            avg_stress_level: avg,
            count,
        })
        .collect()
}

fn stress_buckets<K, F>(entries: &[StressEntry], key: F) -> Vec<(K, f64, usize)>
where
    K: Ord,
    F: Fn(&StressEntry) -> K,
{
    let mut groups: BTreeMap<K, (usize, i64)> = BTreeMap::new();
    for e in entries {
        let slot = groups.entry(key(e)).or_insert((0, 0));
        slot.0 += 1;
        slot.1 += i64::from(e.stress_level);
    }
    groups
        .into_iter()
        .map(|(k, (count, sum))| (k, sum as f64 / count as f64, count))
        .collect()
}

/// Spread of bed and wake clock times across a window.
#[derive(Debug, Serialize)]
pub struct ScheduleVariance {
    pub bedtime_stddev_minutes: f64,
    pub waketime_stddev_minutes: f64,
    pub sample_count: usize,
}

impl ScheduleVariance {
    pub fn bedtime_inconsistent(&self) -> bool {
        self.bedtime_stddev_minutes > SCHEDULE_VARIANCE_THRESHOLD_MINUTES
    }

    pub fn waketime_inconsistent(&self) -> bool {
        self.waketime_stddev_minutes > SCHEDULE_VARIANCE_THRESHOLD_MINUTES
    }
}

/// Population standard deviation of bed and wake times, each expressed as
/// minutes since midnight. `None` when the window is empty.
pub fn schedule_variance(entries: &[SleepEntry]) -> Option<ScheduleVariance> {
    if entries.is_empty() {
        return None;
    }

    let bedtimes: Vec<f64> = entries
        .iter()
        .map(|e| minutes_since_midnight(e.sleep_time))
        .collect();
    let waketimes: Vec<f64> = entries
        .iter()
        .map(|e| minutes_since_midnight(e.wake_time))
        .collect();

    Some(ScheduleVariance {
        bedtime_stddev_minutes: population_stddev(&bedtimes),
        waketime_stddev_minutes: population_stddev(&waketimes),
        sample_count: entries.len(),
    })
}

pub fn minutes_since_midnight(t: DateTime<Utc>) -> f64 {
    f64::from(t.hour() * 60 + t.minute())
}

fn population_stddev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Coping methods ranked by average "stress reduction".
///
/// Reduction is `10 - avg stress level` on the entries where the method was
/// used. This is a correlational proxy (a method used only on calm days
/// scores well), not a causal measurement; kept as the product defines it.
#[derive(Debug, Serialize)]
pub struct CopingEffectiveness {
    pub method: CopingMethod,
    pub count: usize,
    pub avg_stress_reduction: f64,
    pub avg_stress_level: f64,
}

pub fn coping_effectiveness(entries: &[StressEntry]) -> Vec<CopingEffectiveness> {
    let mut groups: BTreeMap<CopingMethod, (usize, i64)> = BTreeMap::new();
    for e in entries {
        for m in &e.coping_methods {
            let slot = groups.entry(*m).or_insert((0, 0));
            slot.0 += 1;
            slot.1 += i64::from(e.stress_level);
        }
    }

    let mut ranked: Vec<CopingEffectiveness> = groups
        .into_iter()
        .map(|(method, (count, sum))| {
            let avg_level = sum as f64 / count as f64;
            CopingEffectiveness {
                method,
                count,
                avg_stress_reduction: 10.0 - avg_level,
                avg_stress_level: avg_level,
            }
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.avg_stress_reduction
            .partial_cmp(&a.avg_stress_reduction)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.method.cmp(&b.method))
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use sqlx::types::Json;
    use uuid::Uuid;

    fn night(hour: u32, minute: u32) -> SleepEntry {
        // Anchor on an arbitrary date; only the clock time matters here.
        let sleep_time = Utc.with_ymd_and_hms(2026, 3, 1, hour, minute, 0).unwrap();
        SleepEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            sleep_time,
            wake_time: sleep_time + Duration::hours(8),
            quality: 3,
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

    fn stress_at(level: i32, methods: Vec<CopingMethod>, created_at: DateTime<Utc>) -> StressEntry {
        StressEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            stress_level: level,
            stressors: vec![crate::models::stress::Stressor::Work],
            physical_symptoms: vec![],
            coping_methods: methods,
            note: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn minutes_since_midnight_is_clock_based() {
        let t = Utc.with_ymd_and_hms(2026, 3, 1, 22, 5, 30).unwrap();
        assert_eq!(minutes_since_midnight(t), 1325.0);
    }

    #[test]
    fn erratic_bedtimes_exceed_threshold() {
        // Bedtimes 22:00, 22:05, 23:50, 21:00 -> minutes 1320,1325,1430,1260.
        let entries = vec![night(22, 0), night(22, 5), night(23, 50), night(21, 0)];
        let variance = schedule_variance(&entries).unwrap();
        assert!(variance.bedtime_stddev_minutes > SCHEDULE_VARIANCE_THRESHOLD_MINUTES);
        assert!(variance.bedtime_inconsistent());
    }

    #[test]
    fn steady_bedtimes_stay_under_threshold() {
        let entries = vec![night(22, 0), night(22, 10), night(22, 20), night(21, 55)];
        let variance = schedule_variance(&entries).unwrap();
        assert!(!variance.bedtime_inconsistent());
    }

    #[test]
    fn empty_window_has_no_variance() {
        assert!(schedule_variance(&[]).is_none());
    }

    #[test]
    fn coping_ranking_is_deterministic() {
        let now = Utc::now();
        let entries = vec![
            stress_at(8, vec![CopingMethod::Talking], now),
            stress_at(4, vec![CopingMethod::Exercise], now),
            stress_at(2, vec![CopingMethod::Exercise], now),
            stress_at(6, vec![CopingMethod::Meditation], now),
        ];

        let first = coping_effectiveness(&entries);
        let second = coping_effectiveness(&entries);
        assert_eq!(
            first.iter().map(|c| c.method).collect::<Vec<_>>(),
            second.iter().map(|c| c.method).collect::<Vec<_>>()
        );

        // Exercise: avg level 3 -> reduction 7, ranked first.
        assert_eq!(first[0].method, CopingMethod::Exercise);
        assert_eq!(first[0].avg_stress_reduction, 7.0);
        assert_eq!(first[0].count, 2);
        // Talking: avg level 8 -> reduction 2, ranked last.
        assert_eq!(first.last().unwrap().method, CopingMethod::Talking);
    }

    #[test]
    fn coping_ranking_breaks_ties_by_method() {
        let now = Utc::now();
        let entries = vec![
            stress_at(5, vec![CopingMethod::Rest], now),
            stress_at(5, vec![CopingMethod::Exercise], now),
        ];
        let ranked = coping_effectiveness(&entries);
        // Equal reduction: declaration order decides, stable across runs.
        assert_eq!(ranked[0].method, CopingMethod::Exercise);
        assert_eq!(ranked[1].method, CopingMethod::Rest);
    }

    #[test]
    fn hourly_buckets_omit_empty_hours() {
        let nine = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let entries = vec![
            stress_at(4, vec![], nine),
            stress_at(6, vec![], nine),
            stress_at(9, vec![], Utc.with_ymd_and_hms(2026, 3, 2, 17, 30, 0).unwrap()),
        ];
        let buckets = hourly_stress_patterns(&entries);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].hour, 9);
        assert_eq!(buckets[0].avg_stress_level, 5.0);
        assert_eq!(buckets[1].hour, 17);
    }

    #[test]
    fn weekday_buckets_use_sunday_as_one() {
        // 2026-03-01 is a Sunday.
        let sunday = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let entries = vec![stress_at(5, vec![], sunday)];
        let buckets = weekly_stress_patterns(&entries);
        assert_eq!(buckets[0].day_of_week, 1);
    }

    #[test]
    fn sleep_aid_impact_sorted_by_quality() {
        let mut good = night(23, 0);
        good.quality = 5;
        good.sleep_aids = vec![SleepAid::WhiteNoise];
        let mut poor = night(23, 30);
        poor.quality = 2;
        poor.sleep_aids = vec![SleepAid::Melatonin];
        let plain = night(22, 0);

        let impacts = sleep_aid_effectiveness(&[good, poor, plain]);
        // Entry with no aids contributes to no bucket.
        assert_eq!(impacts.len(), 2);
        assert_eq!(impacts[0].key, SleepAid::WhiteNoise);
        assert_eq!(impacts[0].avg_quality, 5.0);
        assert_eq!(impacts[1].key, SleepAid::Melatonin);
    }
}
