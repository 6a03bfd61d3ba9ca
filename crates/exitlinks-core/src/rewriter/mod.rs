//! Link rewriting.
//!
//! Routes every external http(s) anchor in an HTML fragment through the
//! redirect gate. Only href values change; the rest of the fragment is left
//! as written.
//!
//! ```text
//! <a href="https://other.com/x">Go</a>
//!   → <a href="https://mysite.com/leaving?url=https%3A%2F%2Fother.com%2Fx">Go</a>
//! ```
//!
//! Rewriting is idempotent because gate URLs classify as internal. An href
//! is only rewritten when the gate would accept its destination, so a
//! working link never turns into a gate error page.

mod pattern;
mod scanner;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classifier::Classifier;
use crate::error::Result;
use crate::gate::validate_destination;
use crate::html::{decode_char_refs, escape};
use crate::origin::SiteOrigin;

pub use scanner::{find_anchor_hrefs, HrefSpan};

/// How anchors are located in a fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteMode {
    /// Tag-level scan that understands quoting, comments and raw text.
    #[default]
    Structural,
    /// Regex over `<a ...href="...">...</a>`.
    Pattern,
}

impl RewriteMode {
    /// Returns the mode name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RewriteMode::Structural => "structural",
            RewriteMode::Pattern => "pattern",
        }
    }
}

/// Result of rewriting one fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// The rewritten fragment.
    pub html: String,
    /// Number of anchors routed through the gate.
    pub rewritten: usize,
}

impl RewriteOutcome {
    fn unchanged(html: &str) -> Self {
        Self {
            html: html.to_string(),
            rewritten: 0,
        }
    }
}

/// Rewrites external anchors to point at the redirect gate.
#[derive(Debug, Clone)]
pub struct LinkRewriter {
    classifier: Classifier,
    mode: RewriteMode,
}

impl LinkRewriter {
    /// Creates a rewriter using the structural scan.
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier,
            mode: RewriteMode::default(),
        }
    }

    /// Sets the scan mode.
    pub fn with_mode(mut self, mode: RewriteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the scan mode.
    pub fn mode(&self) -> RewriteMode {
        self.mode
    }

    /// Rewrites a fragment, returning the fragment unchanged if it cannot be
    /// scanned.
    pub fn rewrite(&self, html: &str) -> RewriteOutcome {
        match self.try_rewrite(html) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, len = html.len(), "Leaving unparsable content unchanged");
                RewriteOutcome::unchanged(html)
            }
        }
    }

    /// Rewrites a fragment.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LinkError::UnparsableContent`] if the structural scan
    /// cannot make sense of the fragment. The pattern scan never fails.
    pub fn try_rewrite(&self, html: &str) -> Result<RewriteOutcome> {
        if html.is_empty() {
            return Ok(RewriteOutcome::unchanged(html));
        }

        let outcome = match self.mode {
            RewriteMode::Structural => self.rewrite_structural(html)?,
            RewriteMode::Pattern => {
                let (html, rewritten) = pattern::rewrite_anchors(html, |raw| self.gate_href(raw));
                RewriteOutcome { html, rewritten }
            }
        };

        debug!(
            mode = self.mode.as_str(),
            rewritten = outcome.rewritten,
            "Rewrote fragment"
        );
        Ok(outcome)
    }

    fn rewrite_structural(&self, html: &str) -> Result<RewriteOutcome> {
        let spans = find_anchor_hrefs(html)?;

        let mut out = String::with_capacity(html.len() + spans.len() * 48);
        let mut copied = 0;
        let mut rewritten = 0;

        for span in spans {
            if let Some(href) = self.gate_href(&html[span.start..span.end]) {
                out.push_str(&html[copied..span.start]);
                out.push_str(&href);
                copied = span.end;
                rewritten += 1;
            }
        }
        out.push_str(&html[copied..]);

        Ok(RewriteOutcome {
            html: out,
            rewritten,
        })
    }

    /// Returns the attribute-safe gate href for a raw href value, or `None`
    /// if the link stays as it is.
    fn gate_href(&self, raw: &str) -> Option<String> {
        let href = decode_char_refs(raw);
        let link = self.classifier.classify(&href);
        if !link.should_rewrite() {
            return None;
        }

        let origin = self.classifier.origin();
        let trimmed = href.trim();
        let destination = match trimmed.strip_prefix("//") {
            // The gate only accepts absolute URLs.
            Some(rest) => format!("{}://{}", origin.scheme(), rest),
            None => trimmed.to_string(),
        };

        // A link the gate would refuse stays as written.
        if let Err(e) = validate_destination(&destination) {
            debug!(href = %destination, error = %e, "Leaving link the gate would reject");
            return None;
        }

        debug!(href = %destination, "Routing external link through gate");
        Some(escape(&origin.gate_url(&destination)).into_owned())
    }
}

/// Rewrites `html` for `origin` using the structural scan and default
/// classifier options.
pub fn rewrite(html: &str, origin: &SiteOrigin) -> String {
    LinkRewriter::new(Classifier::new(origin.clone()))
        .rewrite(html)
        .html
}
