//! Threshold rules over aggregated sleep statistics.
//!
//! Rules are independent and evaluated in a fixed sequence; any subset may
//! fire. A rule whose input is absent is skipped without error.

use serde::Serialize;

use crate::services::patterns::ScheduleVariance;

/// Average sleep below this many hours (trailing 30 days) triggers the
/// duration rule.
pub const MIN_SLEEP_DURATION_HOURS: f64 = 7.0;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    ScheduleConsistency,
    WakeupConsistency,
    SleepDuration,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Serialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub priority: Priority,
    pub message: String,
    pub suggestion: String,
}

pub fn sleep_recommendations(
    schedule: Option<&ScheduleVariance>,
    avg_sleep_duration: Option<f64>,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if let Some(variance) = schedule {
        if variance.bedtime_inconsistent() {
            recommendations.push(Recommendation {
                kind: RecommendationKind::ScheduleConsistency,
                priority: Priority::High,
                message: "Your bedtime varies significantly. Try to go to bed at the same time \
                          each night to regulate your internal clock."
                    .into(),
                suggestion: "Set a consistent bedtime and create a relaxing pre-sleep routine."
                    .into(),
            });
        }

        if variance.waketime_inconsistent() {
            recommendations.push(Recommendation {
                kind: RecommendationKind::WakeupConsistency,
                priority: Priority::High,
                message: "Your wake-up time varies significantly. Waking up at the same time \
                          daily helps regulate your sleep cycle."
                    .into(),
                suggestion: "Set a consistent wake-up time, even on weekends, and use an alarm \
                             if necessary."
                    .into(),
            });
        }
    }

    if let Some(avg) = avg_sleep_duration {
        if avg < MIN_SLEEP_DURATION_HOURS {
            recommendations.push(Recommendation {
                kind: RecommendationKind::SleepDuration,
                priority: Priority::High,
                message: "You might not be getting enough sleep. Most adults need 7-9 hours per \
                          night."
                    .into(),
                suggestion: "Aim for at least 7 hours of sleep each night. Consider adjusting \
                             your schedule to prioritize sleep."
                    .into(),
            });
        }
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variance(bed: f64, wake: f64) -> ScheduleVariance {
        ScheduleVariance {
            bedtime_stddev_minutes: bed,
            waketime_stddev_minutes: wake,
            sample_count: 10,
        }
    }

    #[test]
    fn no_data_means_no_recommendations() {
        assert!(sleep_recommendations(None, None).is_empty());
    }

    #[test]
    fn all_rules_can_fire_together_in_fixed_order() {
        let v = variance(90.0, 75.0);
        let recs = sleep_recommendations(Some(&v), Some(5.5));
        let kinds: Vec<_> = recs.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RecommendationKind::ScheduleConsistency,
                RecommendationKind::WakeupConsistency,
                RecommendationKind::SleepDuration,
            ]
        );
        assert!(recs.iter().all(|r| r.priority == Priority::High));
    }

    #[test]
    fn rules_are_independent() {
        let v = variance(20.0, 90.0);
        let recs = sleep_recommendations(Some(&v), Some(8.0));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::WakeupConsistency);
    }

    #[test]
    fn duration_at_threshold_does_not_fire() {
        let recs = sleep_recommendations(None, Some(MIN_SLEEP_DURATION_HOURS));
        assert!(recs.is_empty());
    }

    #[test]
    fn short_sleep_fires_without_schedule_data() {
        let recs = sleep_recommendations(None, Some(6.2));
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::SleepDuration);
    }
}
