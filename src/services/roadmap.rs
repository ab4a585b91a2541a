//! Healing-roadmap assembly: turn recent entry summaries plus favorited
//! affirmations into a fixed prompt for the text-generation service, and
//! defensively parse the structured reply out of free text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::affirmation::Affirmation;
use crate::models::mood::{Mood, MoodEntry};
use crate::models::sleep::SleepEntry;
use crate::models::stress::{CopingMethod, StressEntry, Stressor};
use crate::services::stats::{self, sleep_duration_hours};

pub const SYSTEM_PROMPT: &str = "You are a compassionate mental health assistant that creates \
     personalized healing roadmaps. Provide specific, actionable advice based on the user's data.";

const NOTE_PREVIEW_CHARS: usize = 100;
const TOP_STRESSOR_LIMIT: usize = 5;
const RECENT_LIMIT: usize = 5;

#[derive(Debug, Serialize)]
pub struct MoodSummary {
    pub total_entries: usize,
    pub average_mood_score: f64,
    pub most_common_mood: Mood,
    pub mood_distribution: Vec<stats::MoodBucket>,
    pub recent_moods: Vec<RecentMood>,
}

#[derive(Debug, Serialize)]
pub struct RecentMood {
    pub date: DateTime<Utc>,
    pub mood: Mood,
    pub score: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Entries are expected newest-first; `None` when there are none.
pub fn mood_summary(entries: &[MoodEntry]) -> Option<MoodSummary> {
    let breakdown = stats::mood_breakdown(entries);
    let most_common = breakdown.first()?.mood;
    let overall = stats::mood_stats(entries);

    Some(MoodSummary {
        total_entries: entries.len(),
        average_mood_score: overall.avg_mood_score?,
        most_common_mood: most_common,
        mood_distribution: breakdown,
        recent_moods: entries
            .iter()
            .take(RECENT_LIMIT)
            .map(|e| RecentMood {
                date: e.created_at,
                mood: e.mood,
                score: e.mood_score,
                note: e.note.as_deref().map(truncate_note),
            })
            .collect(),
    })
}

#[derive(Debug, Serialize)]
pub struct StressSummary {
    pub total_entries: usize,
    pub average_stress_level: f64,
    pub top_stressors: Vec<stats::StressorCount>,
    pub recent_stressors: Vec<RecentStress>,
}

#[derive(Debug, Serialize)]
pub struct RecentStress {
    pub date: DateTime<Utc>,
    pub stress_level: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_stressor: Option<Stressor>,
    pub coping_methods: Vec<CopingMethod>,
}

pub fn stress_summary(entries: &[StressEntry]) -> Option<StressSummary> {
    let overall = stats::stress_stats(entries);

    Some(StressSummary {
        total_entries: entries.len(),
        average_stress_level: overall.avg_stress_level?,
        top_stressors: stats::top_stressors(entries, TOP_STRESSOR_LIMIT),
        recent_stressors: entries
            .iter()
            .take(RECENT_LIMIT)
            .map(|e| RecentStress {
                date: e.created_at,
                stress_level: e.stress_level,
                main_stressor: e.stressors.first().copied(),
                coping_methods: e.coping_methods.clone(),
            })
            .collect(),
    })
}

#[derive(Debug, Serialize)]
pub struct SleepSummary {
    pub total_entries: usize,
    pub average_duration: f64,
    pub average_quality: f64,
    pub average_interruptions: f64,
    pub recent_sleep: Vec<RecentSleep>,
}

#[derive(Debug, Serialize)]
pub struct RecentSleep {
    pub date: DateTime<Utc>,
    pub duration: f64,
    pub quality: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub fn sleep_summary(entries: &[SleepEntry]) -> Option<SleepSummary> {
    let overall = stats::sleep_stats(entries);

    Some(SleepSummary {
        total_entries: entries.len(),
        average_duration: overall.avg_duration?,
        average_quality: overall.avg_quality?,
        average_interruptions: overall.avg_interruptions?,
        recent_sleep: entries
            .iter()
            .take(RECENT_LIMIT)
            .map(|e| RecentSleep {
                date: e.sleep_time,
                duration: sleep_duration_hours(e.sleep_time, e.wake_time),
                quality: e.quality,
                note: e.note.as_deref().map(truncate_note),
            })
            .collect(),
    })
}

fn truncate_note(note: &str) -> String {
    note.chars().take(NOTE_PREVIEW_CHARS).collect()
}

/// Render the fixed 4-week roadmap prompt. Sections for which the user has
/// no data are left out.
pub fn build_prompt(
    mood: Option<&MoodSummary>,
    stress: Option<&StressSummary>,
    sleep: Option<&SleepSummary>,
    affirmations: &[Affirmation],
) -> String {
    let mut prompt =
        String::from("Create a personalized 4-week healing roadmap based on the following user data:\n\n");

    if let Some(m) = mood {
        prompt.push_str(&format!(
            "MOOD DATA (last {} entries):\n- Average mood score: {:.1}/10\n- Most common mood: {}\n- Recent moods: {}\n\n",
            m.total_entries,
            m.average_mood_score,
            m.most_common_mood.as_str(),
            m.recent_moods
                .iter()
                .map(|r| format!("{} ({})", r.mood.as_str(), r.score))
                .collect::<Vec<_>>()
                .join(", "),
        ));
    }

    if let Some(s) = stress {
        prompt.push_str(&format!(
            "STRESS DATA (last {} entries):\n- Average stress level: {:.1}/10\n- Top stressors: {}\n\n",
            s.total_entries,
            s.average_stress_level,
            s.top_stressors
                .iter()
                .map(|t| format!("{} ({}x)", t.stressor.as_str(), t.count))
                .collect::<Vec<_>>()
                .join(", "),
        ));
    }

    if let Some(s) = sleep {
        prompt.push_str(&format!(
            "SLEEP DATA (last {} nights):\n- Average sleep duration: {:.1} hours\n- Average sleep quality: {:.1}/5\n- Average interruptions: {:.1} per night\n\n",
            s.total_entries, s.average_duration, s.average_quality, s.average_interruptions,
        ));
    }

    if !affirmations.is_empty() {
        prompt.push_str(&format!(
            "FAVORITE AFFIRMATIONS (user's top {}):\n",
            affirmations.len()
        ));
        for (i, a) in affirmations.iter().enumerate() {
            prompt.push_str(&format!("{}. \"{}\"\n", i + 1, a.text));
        }
        prompt.push('\n');
    }

    prompt.push_str(
        "Based on this data, create a detailed 4-week healing roadmap that includes:\n\
         1. A brief analysis of the user's current state\n\
         2. Weekly themes focused on improving mood, reducing stress, and enhancing sleep\n\
         3. Specific daily practices or exercises\n\
         4. Recommended resources (books, apps, techniques)\n\
         5. Custom affirmations\n\n\
         Format the response as a JSON object with the following structure:\n\
         {\n  \"analysis\": \"Brief analysis of the user's current state\",\n  \
         \"weeklyThemes\": [\"Theme 1\", \"Theme 2\"],\n  \
         \"weeklyGoals\": [\"Goal 1\", \"Goal 2\"],\n  \
         \"dailyPractices\": [\"Practice 1\", \"Practice 2\"],\n  \
         \"resources\": [{\"type\": \"book\", \"title\": \"...\", \"author\": \"...\", \"why\": \"...\"}],\n  \
         \"affirmations\": [\"Custom affirmation 1\", \"Custom affirmation 2\"]\n}",
    );

    prompt
}

/// The structured roadmap. Field names follow the JSON contract the prompt
/// asks the model to produce.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Roadmap {
    pub analysis: String,
    pub weekly_themes: Vec<String>,
    pub weekly_goals: Vec<String>,
    pub daily_practices: Vec<String>,
    pub resources: Vec<serde_json::Value>,
    pub affirmations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

/// Extract the first balanced `{...}` substring, skipping braces inside JSON
/// string literals. Returns `None` when no complete object is present.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse the model's reply. Malformed or absent JSON never propagates an
/// error: the caller gets empty arrays and the raw text instead.
pub fn parse_roadmap(response: &str) -> Roadmap {
    if let Some(json) = extract_json(response) {
        if let Ok(roadmap) = serde_json::from_str::<Roadmap>(json) {
            return roadmap;
        }
    }

    Roadmap {
        analysis: "Unable to parse AI response".into(),
        raw_response: Some(response.to_string()),
        ..Roadmap::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::affirmation::{AffirmationCategory, AffirmationMetadata, MoodAssociation};
    use sqlx::types::Json;
    use uuid::Uuid;

    #[test]
    fn extracts_single_balanced_object() {
        let text = "Sure! Here is your plan:\n{\"analysis\": \"ok\"}\nHope it helps.";
        assert_eq!(extract_json(text), Some("{\"analysis\": \"ok\"}"));
    }

    #[test]
    fn extracts_nested_braces() {
        let text = "prefix {\"a\": {\"b\": 1}} suffix";
        assert_eq!(extract_json(text), Some("{\"a\": {\"b\": 1}}"));
    }

    #[test]
    fn ignores_braces_inside_strings() {
        let text = r#"{"analysis": "use {curly} braces", "weeklyThemes": []}"#;
        assert_eq!(extract_json(text), Some(text));
    }

    #[test]
    fn unterminated_object_yields_none() {
        assert_eq!(extract_json("{\"analysis\": \"oops\""), None);
    }

    #[test]
    fn parse_round_trips_well_formed_reply() {
        let reply = r#"Here you go:
{
  "analysis": "Steady progress",
  "weeklyThemes": ["Grounding", "Connection"],
  "weeklyGoals": ["Sleep by 23:00"],
  "dailyPractices": ["Morning walk"],
  "resources": [{"type": "book", "title": "Why We Sleep", "author": "M. Walker", "why": "sleep science"}],
  "affirmations": ["I am resilient"]
}"#;
        let roadmap = parse_roadmap(reply);
        assert_eq!(roadmap.analysis, "Steady progress");
        assert_eq!(roadmap.weekly_themes, vec!["Grounding", "Connection"]);
        assert_eq!(roadmap.weekly_goals, vec!["Sleep by 23:00"]);
        assert_eq!(roadmap.daily_practices, vec!["Morning walk"]);
        assert_eq!(roadmap.resources.len(), 1);
        assert_eq!(roadmap.affirmations, vec!["I am resilient"]);
        assert!(roadmap.raw_response.is_none());
    }

    #[test]
    fn parse_without_any_brace_falls_back() {
        let reply = "I'm sorry, I can't produce JSON right now.";
        let roadmap = parse_roadmap(reply);
        assert_eq!(roadmap.analysis, "Unable to parse AI response");
        assert!(roadmap.weekly_themes.is_empty());
        assert!(roadmap.resources.is_empty());
        assert_eq!(roadmap.raw_response.as_deref(), Some(reply));
    }

    #[test]
    fn parse_malformed_json_falls_back() {
        let reply = "{\"analysis\": unquoted}";
        let roadmap = parse_roadmap(reply);
        assert_eq!(roadmap.raw_response.as_deref(), Some(reply));
    }

    fn favorite(text: &str) -> Affirmation {
        Affirmation {
            id: Uuid::new_v4(),
            text: text.into(),
            category: AffirmationCategory::General,
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
    fn prompt_includes_only_available_sections() {
        let prompt = build_prompt(None, None, None, &[favorite("I am calm.")]);
        assert!(!prompt.contains("MOOD DATA"));
        assert!(!prompt.contains("STRESS DATA"));
        assert!(!prompt.contains("SLEEP DATA"));
        assert!(prompt.contains("FAVORITE AFFIRMATIONS (user's top 1):"));
        assert!(prompt.contains("\"I am calm.\""));
        assert!(prompt.contains("weeklyThemes"));
    }

    #[test]
    fn empty_entry_sets_produce_no_summary() {
        assert!(mood_summary(&[]).is_none());
        assert!(stress_summary(&[]).is_none());
        assert!(sleep_summary(&[]).is_none());
    }
}
