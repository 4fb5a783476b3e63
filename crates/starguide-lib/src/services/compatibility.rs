// Compatibility result merging
// Feature: Relationship Matching (016-compatibility)
//
// The score endpoint answers fast with a partial result; the full report
// arrives later with a durable match id. The two race: a partial score
// must never overwrite a state that already holds the durable id.

use crate::models::compatibility::{CompatibilityReport, CompatibilityScore, ReportSection};

/// Merged state of one compatibility check
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    match_id: Option<String>,
    score: Option<u8>,
    summary: Option<String>,
    sections: Vec<ReportSection>,
}

impl MatchOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn match_id(&self) -> Option<&str> {
        self.match_id.as_deref()
    }

    pub fn score(&self) -> Option<u8> {
        self.score
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    /// Whether the durable full report has landed
    pub fn is_complete(&self) -> bool {
        self.match_id.is_some()
    }

    /// Apply the fast partial score
    ///
    /// No-ops when the full report already landed (presence of the durable
    /// id), so a late partial never downgrades a complete result.
    pub fn apply_score(&mut self, partial: CompatibilityScore) -> bool {
        if self.is_complete() {
            log::debug!("[match] ignoring partial score, report already landed");
            return false;
        }
        self.score = Some(partial.score);
        if partial.summary.is_some() {
            self.summary = partial.summary;
        }
        true
    }

    /// Apply the full report; always commits and pins the durable id
    pub fn apply_report(&mut self, report: CompatibilityReport) {
        self.match_id = Some(report.match_id);
        self.score = Some(report.score);
        self.summary = Some(report.summary);
        self.sections = report.sections;
    }
}
