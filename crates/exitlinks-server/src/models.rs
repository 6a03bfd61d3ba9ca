//! API request and response models.

use exitlinks_core::{ContentKind, FilterOutcome, RenderContext, SkipReason};
use serde::{Deserialize, Serialize};

/// Request body for POST /api/filter.
#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    /// HTML fragment to filter.
    pub html: String,
    /// What the fragment is (default: content).
    #[serde(default)]
    pub kind: ContentKind,
    /// Where it will be rendered (default: public).
    #[serde(default)]
    pub context: RenderContext,
}

/// Response body for POST /api/filter.
#[derive(Debug, Serialize)]
pub struct FilterResponse {
    pub html: String,
    pub rewritten: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
}

impl From<FilterOutcome> for FilterResponse {
    fn from(outcome: FilterOutcome) -> Self {
        Self {
            html: outcome.html,
            rewritten: outcome.rewritten,
            skipped: outcome.skipped,
        }
    }
}

/// Request body for POST /api/classify.
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    /// The href to classify, as written in the content.
    pub href: String,
}
