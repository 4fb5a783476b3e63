// Follow-up suggestion extractor
// Feature: Chart Chat Assistant (014-chart-chat)
//
// Produces up to three follow-up questions for an assistant reply. A fenced
// {"suggestions": [...]} JSON block in the raw text wins; otherwise topic
// keywords in the cleaned text drive canned questions; otherwise a fixed
// generic set. Malformed JSON is silently ignored (spec'd fallback, never
// surfaced to the user).

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum suggestions shown per message
pub const MAX_SUGGESTIONS: usize = 3;

static SUGGESTION_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[a-zA-Z]*[ \t]*\n?\s*(\{.*?\})\s*```").unwrap());

const CAREER_KEYWORDS: &[&str] = &["career", "job", "work", "profession", "promotion"];
const RELATIONSHIP_KEYWORDS: &[&str] = &["relationship", "marriage", "partner", "family", "love"];
const WEALTH_KEYWORDS: &[&str] = &["wealth", "money", "finance", "financial", "income"];
const HEALTH_KEYWORDS: &[&str] = &["health", "wellness", "energy", "stress"];
const TIMING_KEYWORDS: &[&str] = &["dasha", "period", "transit", "timing", "phase"];

const CAREER_QUESTIONS: &[&str] = &[
    "What does my chart say about my career growth?",
    "When is a favorable time for a job change?",
];
const RELATIONSHIP_QUESTIONS: &[&str] = &[
    "What does my chart reveal about my relationships?",
    "How can I improve harmony with my partner?",
];
const WEALTH_QUESTIONS: &[&str] = &[
    "What are my prospects for wealth this year?",
    "Which periods favor financial decisions?",
];
const HEALTH_QUESTIONS: &[&str] = &[
    "What does my chart indicate about my health?",
    "How can I manage stress according to my chart?",
];
const TIMING_QUESTIONS: &[&str] = &[
    "How long does my current dasha period last?",
    "What should I focus on during this period?",
];
/// Substituted when only the timing family matches, to avoid asking two
/// period questions back to back
const CROSS_TOPIC_QUESTIONS: &[&str] = &[
    "How does this period affect my career?",
    "What does this period mean for my relationships?",
];
const GENERIC_QUESTIONS: &[&str] = &[
    "What are the key strengths in my birth chart?",
    "Which planetary period am I in right now?",
    "What should I be mindful of this month?",
];

/// Extract follow-up suggestions for a reply
///
/// `raw` is the original assistant text (searched for the JSON block before
/// normalization destroys it); `cleaned` is the normalized content the
/// keyword heuristics run against.
pub fn extract(raw: &str, cleaned: &str) -> Vec<String> {
    if let Some(parsed) = extract_json_suggestions(raw) {
        return dedup_truncate(parsed);
    }

    let lower = cleaned.to_lowercase();
    let career = matches_family(&lower, CAREER_KEYWORDS);
    let relationships = matches_family(&lower, RELATIONSHIP_KEYWORDS);
    let wealth = matches_family(&lower, WEALTH_KEYWORDS);
    let health = matches_family(&lower, HEALTH_KEYWORDS);
    let timing = matches_family(&lower, TIMING_KEYWORDS);

    let mut collected: Vec<String> = Vec::new();
    if career {
        collected.extend(CAREER_QUESTIONS.iter().map(|s| s.to_string()));
    }
    if relationships {
        collected.extend(RELATIONSHIP_QUESTIONS.iter().map(|s| s.to_string()));
    }
    if wealth {
        collected.extend(WEALTH_QUESTIONS.iter().map(|s| s.to_string()));
    }
    if health {
        collected.extend(HEALTH_QUESTIONS.iter().map(|s| s.to_string()));
    }
    if timing {
        let timing_set = if career || relationships {
            TIMING_QUESTIONS
        } else {
            CROSS_TOPIC_QUESTIONS
        };
        collected.extend(timing_set.iter().map(|s| s.to_string()));
    }

    if collected.is_empty() {
        collected = GENERIC_QUESTIONS.iter().map(|s| s.to_string()).collect();
    }

    dedup_truncate(collected)
}

/// Parse a fenced `{"suggestions": [...]}` block; `None` on any shape or
/// parse mismatch
fn extract_json_suggestions(raw: &str) -> Option<Vec<String>> {
    for caps in SUGGESTION_FENCE.captures_iter(raw) {
        let value: serde_json::Value = match serde_json::from_str(&caps[1]) {
            Ok(v) => v,
            Err(_) => continue,
        };
        let items = match value.get("suggestions").and_then(|s| s.as_array()) {
            Some(items) => items,
            None => continue,
        };
        let strings: Option<Vec<String>> = items
            .iter()
            .map(|v| v.as_str().map(|s| s.to_string()))
            .collect();
        if let Some(strings) = strings {
            return Some(strings);
        }
    }
    None
}

fn matches_family(lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| lower.contains(k))
}

/// Deduplicate preserving first-seen order, then cap the list
pub fn dedup_truncate(items: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for item in items {
        if !seen.contains(&item) {
            seen.push(item);
        }
        if seen.len() == MAX_SUGGESTIONS {
            break;
        }
    }
    seen
}
