//! Content filtering entry point.
//!
//! Hosts hand every piece of rendered content (post bodies, excerpts, widget
//! text) to [`ContentFilter::apply`]. The filter decides whether rewriting
//! applies at all and otherwise runs the [`LinkRewriter`] with the current
//! settings.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classifier::Classifier;
use crate::rewriter::{LinkRewriter, RewriteOutcome};
use crate::settings::Settings;

/// Where the content is being rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderContext {
    /// Public site pages.
    #[default]
    Public,
    /// Administrative screens. Links are never rewritten here.
    Admin,
}

/// The kind of content being filtered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Main body of a page or post.
    #[default]
    Content,
    /// Short summary shown in listings.
    Excerpt,
    /// Text of a sidebar or footer widget.
    Widget,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Content => write!(f, "content"),
            ContentKind::Excerpt => write!(f, "excerpt"),
            ContentKind::Widget => write!(f, "widget"),
        }
    }
}

/// Why a fragment was passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Redirects are switched off.
    Disabled,
    /// Rendering for an administrative screen.
    Admin,
    /// Nothing to rewrite.
    Empty,
    /// The configured site URL is unusable.
    Misconfigured,
}

/// Result of filtering one fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    /// The filtered fragment.
    pub html: String,
    /// Number of anchors routed through the gate.
    pub rewritten: usize,
    /// Set when rewriting did not run.
    pub skipped: Option<SkipReason>,
}

impl FilterOutcome {
    fn skipped(html: &str, reason: SkipReason) -> Self {
        Self {
            html: html.to_string(),
            rewritten: 0,
            skipped: Some(reason),
        }
    }
}

impl From<RewriteOutcome> for FilterOutcome {
    fn from(outcome: RewriteOutcome) -> Self {
        Self {
            html: outcome.html,
            rewritten: outcome.rewritten,
            skipped: None,
        }
    }
}

/// Applies link rewriting to host content according to [`Settings`].
#[derive(Debug, Clone)]
pub struct ContentFilter {
    settings: Settings,
}

impl ContentFilter {
    /// Creates a filter for the given settings.
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Returns the settings this filter applies.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Filters one fragment.
    ///
    /// The site origin is derived from the settings on every call, so a
    /// settings change takes effect without rebuilding the filter. Content
    /// is returned unchanged when redirects are disabled, when rendering for
    /// an administrative screen, or when the site URL cannot be parsed.
    pub fn apply(&self, html: &str, kind: ContentKind, context: RenderContext) -> FilterOutcome {
        if !self.settings.enable_redirects {
            return FilterOutcome::skipped(html, SkipReason::Disabled);
        }
        if context == RenderContext::Admin {
            return FilterOutcome::skipped(html, SkipReason::Admin);
        }
        if html.is_empty() {
            return FilterOutcome::skipped(html, SkipReason::Empty);
        }

        let origin = match self.settings.origin() {
            Ok(origin) => origin,
            Err(e) => {
                warn!(error = %e, "Cannot rewrite links without a valid site URL");
                return FilterOutcome::skipped(html, SkipReason::Misconfigured);
            }
        };

        let classifier = Classifier::new(origin).with_options(self.settings.classifier_options());
        let outcome = LinkRewriter::new(classifier)
            .with_mode(self.settings.rewrite_mode)
            .rewrite(html);

        debug!(%kind, rewritten = outcome.rewritten, "Filtered content");
        outcome.into()
    }
}
