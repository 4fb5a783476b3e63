// Assistant content normalizer
// Feature: Chart Chat Assistant (014-chart-chat)
//
// Cleans raw assistant text for display: unwraps the response envelope,
// drops analysis blocks and metadata code fences, unescapes serialization
// artifacts, and re-flows hard-wrapped lines. Pure and total: any anomaly
// degrades to a best-effort fallback, never a panic or empty output.
//
// Callers must run `extract_analysis` (and suggestion extraction) against
// the ORIGINAL text before calling `normalize` - normalization is lossy.

use once_cell::sync::Lazy;
use regex::Regex;

static RESPONSE_ENVELOPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*<response>(.*)</response>\s*$").unwrap());

static ANALYSIS_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<analysis>(.*?)</analysis>").unwrap());

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[a-zA-Z]*[ \t]*\n?(.*?)```").unwrap());

static TAG_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<>]*>").unwrap());

static BRACE_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^{}]*\}").unwrap());

static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-*\u{2022}]|\d+[.)])(?:\s|$)").unwrap());

/// Keys that mark a fenced JSON block as backend metadata rather than
/// content the user should see
const METADATA_KEYS: &[&str] = &[
    "suggestions",
    "usage",
    "tokens",
    "prompt_tokens",
    "completion_tokens",
    "finish_reason",
];

/// Minimum acceptable output length before the fallback path kicks in
const FALLBACK_MIN_OUTPUT: usize = 5;
/// Inputs longer than this are considered substantial
const FALLBACK_MIN_INPUT: usize = 50;

/// Extract the raw `<analysis>` block from the original assistant text
///
/// This is the dedicated path for analysis capture; it must run against the
/// raw text since `normalize` removes the block entirely.
pub fn extract_analysis(raw: &str) -> Option<String> {
    ANALYSIS_BLOCK
        .captures(raw)
        .map(|caps| caps[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Normalize raw assistant text for display
pub fn normalize(raw: &str) -> String {
    let unwrapped = strip_envelope(raw);
    let without_analysis = ANALYSIS_BLOCK.replace_all(&unwrapped, "");
    let without_fences = strip_metadata_fences(&without_analysis);
    let unescaped = unescape(&without_fences);
    let reflowed = reflow(&unescaped);

    // Over-stripping signal: a substantial input collapsed to near-nothing
    if reflowed.chars().count() < FALLBACK_MIN_OUTPUT
        && raw.chars().count() > FALLBACK_MIN_INPUT
    {
        return fallback_strip(raw);
    }

    reflowed
}

/// Unwrap a single top-level `<response>` envelope, if present
fn strip_envelope(text: &str) -> String {
    match RESPONSE_ENVELOPE.captures(text) {
        Some(caps) => caps[1].to_string(),
        None => text.to_string(),
    }
}

/// Remove fenced code blocks that carry backend metadata (suggestion
/// payloads, token/usage dictionaries); genuine code fences are kept
fn strip_metadata_fences(text: &str) -> String {
    CODE_FENCE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            if is_metadata_fence(&caps[1]) {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .to_string()
}

fn is_metadata_fence(inner: &str) -> bool {
    let trimmed = inner.trim();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return false;
    }
    METADATA_KEYS.iter().any(|key| trimmed.contains(key))
}

/// Restore literal backslash-escaped quotes and newlines leaked by the
/// backend's serialization
fn unescape(text: &str) -> String {
    text.replace("\\n", "\n").replace("\\\"", "\"")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Blank,
    Heading,
    ListItem,
    Text,
}

fn classify(line: &str) -> LineKind {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        LineKind::Blank
    } else if trimmed.starts_with('#') {
        LineKind::Heading
    } else if LIST_MARKER.is_match(trimmed) {
        LineKind::ListItem
    } else {
        LineKind::Text
    }
}

fn collapse_spaces(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Re-flow hard-wrapped text line by line
///
/// Blank lines stay paragraph boundaries, newlines before list markers and
/// headings stay structural, and every other single newline is a hard wrap
/// introduced by the source model and collapses into a space.
fn reflow(text: &str) -> String {
    let mut out = String::new();
    let mut saw_blank = false;

    for line in text.lines() {
        let kind = classify(line);
        if kind == LineKind::Blank {
            saw_blank = true;
            continue;
        }

        let collapsed = collapse_spaces(line);
        if out.is_empty() {
            out.push_str(&collapsed);
        } else if saw_blank {
            out.push_str("\n\n");
            out.push_str(&collapsed);
        } else if matches!(kind, LineKind::Heading | LineKind::ListItem) {
            out.push('\n');
            out.push_str(&collapsed);
        } else {
            out.push(' ');
            out.push_str(&collapsed);
        }
        saw_blank = false;
    }

    out.trim().to_string()
}

/// Last resort: strip tag-like and brace-delimited segments from the
/// original text; placeholder if even that yields nothing
fn fallback_strip(raw: &str) -> String {
    let mut text = raw.to_string();
    loop {
        let next = BRACE_SEGMENT.replace_all(&text, "").to_string();
        if next == text {
            break;
        }
        text = next;
    }
    text = TAG_SEGMENT.replace_all(&text, "").to_string();

    let collapsed = collapse_spaces(&text);
    if collapsed.is_empty() {
        "...".to_string()
    } else {
        collapsed
    }
}
