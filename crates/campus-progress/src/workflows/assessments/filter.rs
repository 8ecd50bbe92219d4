use serde::{Deserialize, Serialize};

use super::domain::{AssessmentKind, ItemStatus, ResolvedItem, SubjectId};

/// Learner-facing filter. Every supplied field must match; absent fields impose no constraint.
/// `Some(false)` and `Some(0.0)` are real constraints, not "unset".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<ItemStatus>,
    #[serde(default)]
    pub kind: Option<AssessmentKind>,
    #[serde(default)]
    pub subject_id: Option<SubjectId>,
    #[serde(default)]
    pub is_passed: Option<bool>,
    #[serde(default)]
    pub min_score: Option<f64>,
}

impl ItemFilter {
    pub fn matches(&self, item: &ResolvedItem) -> bool {
        if let Some(needle) = search_needle(self.search.as_deref()) {
            let haystacks = [
                item.title.as_str(),
                item.subject_name.as_str(),
                item.subject_code.as_str(),
                item.assessment_id.0.as_str(),
            ];
            if !contains_any(&haystacks, &needle) {
                return false;
            }
        }

        if let Some(status) = self.status {
            if item.status() != status {
                return false;
            }
        }

        if let Some(kind) = self.kind {
            if item.kind != kind {
                return false;
            }
        }

        if let Some(subject_id) = &self.subject_id {
            if &item.subject_id != subject_id {
                return false;
            }
        }

        if let Some(expected) = self.is_passed {
            let verdict = item.state.outcome().and_then(|outcome| outcome.is_passed);
            if verdict != Some(expected) {
                return false;
            }
        }

        if let Some(min_score) = self.min_score {
            match item.derived_score {
                Some(score) if score >= min_score => {}
                _ => return false,
            }
        }

        true
    }

    /// Returns the matching items in their original order; the input is left untouched.
    pub fn apply(&self, items: &[ResolvedItem]) -> Vec<ResolvedItem> {
        items
            .iter()
            .filter(|item| self.matches(item))
            .cloned()
            .collect()
    }
}

/// Lowercased, trimmed search text. Blank input means no search constraint.
pub(crate) fn search_needle(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

pub(crate) fn contains_any(haystacks: &[&str], needle: &str) -> bool {
    haystacks
        .iter()
        .any(|haystack| haystack.to_lowercase().contains(needle))
}
