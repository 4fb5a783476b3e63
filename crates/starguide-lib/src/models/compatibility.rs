// Compatibility matching models
// Feature: Relationship Matching (016-compatibility)

use serde::{Deserialize, Serialize};

/// Fast partial result: the headline score arrives before the full report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityScore {
    pub score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Complete result, persisted by the backend under a durable match id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityReport {
    /// Durable identifier assigned once the match is persisted
    pub match_id: String,
    pub score: u8,
    pub summary: String,
    #[serde(default)]
    pub sections: Vec<ReportSection>,
}

/// One titled section of the full report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportSection {
    pub title: String,
    pub body: String,
}
