//! URL classification.
//!
//! Decides whether an href leaves the hosting site. The rules are applied in
//! order and the first one that matches wins:
//!
//! 1. Empty, fragment (`#...`) or root-relative (`/...`) hrefs are internal.
//! 2. Hrefs that already point at the redirect gate are internal.
//! 3. Protocol-relative hrefs (`//host/...`) are parsed as `http:` URLs.
//! 4. Anything that is not `http(s)://` or protocol-relative is internal.
//! 5. Hrefs without a resolvable host are internal.
//! 6. The href is external iff its host differs from the site's host once a
//!    leading `www.` is stripped from both.
//!
//! Rule 1 catches `//host` as well, so rule 3 only applies when
//! [`ClassifierOptions::protocol_relative_external`] is set.
//!
//! ```
//! use exitlinks_core::{classify, SiteOrigin};
//!
//! let origin = SiteOrigin::parse("https://mysite.com").unwrap();
//! assert!(classify("https://other.com/x", &origin).is_external);
//! assert!(!classify("https://www.mysite.com/about", &origin).is_external);
//! assert!(!classify("mailto:a@b.com", &origin).is_external);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{LinkError, Result};
use crate::origin::{is_gate_url, strip_www, SiteOrigin};

/// Tunables for [`Classifier`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierOptions {
    /// Classify `//host/...` hrefs by host instead of treating them as
    /// root-relative.
    #[serde(default)]
    pub protocol_relative_external: bool,
}

/// The outcome of classifying one href.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedLink {
    /// The href exactly as given.
    pub href: String,
    /// Whether the href leaves the site.
    pub is_external: bool,
    /// Whether the href has an `http` or `https` scheme.
    pub is_http: bool,
}

impl ClassifiedLink {
    /// Returns true if the link should be routed through the gate.
    pub fn should_rewrite(&self) -> bool {
        self.is_external && self.is_http && !is_gate_url(&self.href)
    }
}

/// Classifies hrefs relative to one site origin.
#[derive(Debug, Clone)]
pub struct Classifier {
    origin: SiteOrigin,
    options: ClassifierOptions,
}

impl Classifier {
    /// Creates a classifier with default options.
    pub fn new(origin: SiteOrigin) -> Self {
        Self {
            origin,
            options: ClassifierOptions::default(),
        }
    }

    /// Sets the classifier options.
    pub fn with_options(mut self, options: ClassifierOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the origin links are classified against.
    pub fn origin(&self) -> &SiteOrigin {
        &self.origin
    }

    /// Classifies a single href.
    pub fn classify(&self, href: &str) -> ClassifiedLink {
        let is_external = match self.check_external(href) {
            Ok(external) => external,
            Err(e) => {
                debug!(href, error = %e, "Treating href as internal");
                false
            }
        };

        ClassifiedLink {
            href: href.to_string(),
            is_external,
            is_http: is_http_href(href),
        }
    }

    fn check_external(&self, href: &str) -> Result<bool> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return Ok(false);
        }

        let protocol_relative = href.starts_with("//");
        if href.starts_with('/') && !(protocol_relative && self.options.protocol_relative_external)
        {
            return Ok(false);
        }

        if is_gate_url(href) {
            return Ok(false);
        }

        if !protocol_relative && !has_http_prefix(href) {
            return Ok(false);
        }

        let host = resolve_host(href)?;
        Ok(strip_www(&host) != self.origin.normalized_host())
    }
}

/// Classifies `href` against `origin` with default options.
pub fn classify(href: &str, origin: &SiteOrigin) -> ClassifiedLink {
    Classifier::new(origin.clone()).classify(href)
}

/// Parses an href, treating protocol-relative values as `http:`.
pub fn parse_href(href: &str) -> Option<Url> {
    let href = href.trim();
    if href.starts_with("//") {
        Url::parse(&format!("http:{href}")).ok()
    } else {
        Url::parse(href).ok()
    }
}

/// Extracts the lowercased host of an href.
///
/// # Errors
///
/// Returns [`LinkError::UnresolvableHost`] if the href does not parse or has
/// no host.
pub fn resolve_host(href: &str) -> Result<String> {
    parse_href(href)
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        .filter(|host| !host.is_empty())
        .ok_or_else(|| LinkError::UnresolvableHost(href.to_string()))
}

/// Returns true if `scheme` is `http` or `https`, ignoring case.
pub fn is_http_scheme(scheme: &str) -> bool {
    scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
}

fn is_http_href(href: &str) -> bool {
    parse_href(href).is_some_and(|url| is_http_scheme(url.scheme()))
}

fn has_http_prefix(href: &str) -> bool {
    let lower = href.get(..8).unwrap_or(href).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> SiteOrigin {
        SiteOrigin::parse("https://mysite.com").unwrap()
    }

    fn external(href: &str) -> bool {
        classify(href, &origin()).is_external
    }

    // ==================== Internal Link Tests ====================

    #[test]
    fn empty_href_is_internal() {
        assert!(!external(""));
        assert!(!external("   "));
    }

    #[test]
    fn fragment_and_relative_hrefs_are_internal() {
        for href in ["#", "#top", "/", "/about", "/leaving", "//other.com/x"] {
            assert!(!external(href), "{href} should be internal");
        }
    }

    #[test]
    fn gate_urls_are_internal() {
        let origin = origin();
        for tail in ["", "https%3A%2F%2Fother.com", "garbage", "https://other.com"] {
            let href = format!("{}/leaving?url={}", origin.base(), tail);
            assert!(!external(&href), "{href} should be internal");
        }
        assert!(!external("https://elsewhere.com/leaving?url=x"));
    }

    #[test]
    fn non_http_schemes_are_internal() {
        for href in [
            "mailto:a@b.com",
            "tel:+15555555555",
            "javascript:void(0)",
            "ftp://other.com/file",
            "data:text/html,hi",
        ] {
            assert!(!external(href), "{href} should be internal");
        }
    }

    #[test]
    fn relative_path_without_slash_is_internal() {
        assert!(!external("page.html"));
        assert!(!external("?q=1"));
    }

    #[test]
    fn unparsable_url_is_internal() {
        assert!(!external("http://"));
        assert!(!external("https://exa mple.com/"));
        assert!(!external("http://[::1"));
    }

    // ==================== Host Comparison Tests ====================

    #[test]
    fn different_host_is_external() {
        assert!(external("https://other.com/x"));
        assert!(external("http://other.com"));
        assert!(external("HTTPS://OTHER.COM/Path"));
    }

    #[test]
    fn same_host_is_internal() {
        assert!(!external("https://mysite.com/about"));
        assert!(!external("http://mysite.com"));
        assert!(!external("https://MySite.COM/about"));
    }

    #[test]
    fn www_alias_is_internal() {
        assert!(!external("https://www.mysite.com/about"));
        let www_origin = SiteOrigin::parse("https://www.mysite.com").unwrap();
        assert!(!classify("https://mysite.com/about", &www_origin).is_external);
    }

    #[test]
    fn other_subdomain_is_external() {
        assert!(external("https://blog.mysite.com/post"));
        assert!(external("https://www.blog.mysite.com/post"));
    }

    #[test]
    fn port_does_not_affect_host_comparison() {
        assert!(!external("https://mysite.com:8443/x"));
        assert!(external("https://other.com:8443/x"));
    }

    #[test]
    fn lookalike_host_is_external() {
        assert!(external("https://mysite.com.evil.net/"));
        assert!(external("https://notmysite.com/"));
    }

    // ==================== Protocol-Relative Tests ====================

    #[test]
    fn protocol_relative_is_classified_by_host_when_enabled() {
        let classifier = Classifier::new(origin()).with_options(ClassifierOptions {
            protocol_relative_external: true,
        });
        assert!(classifier.classify("//other.com/x").is_external);
        assert!(!classifier.classify("//www.mysite.com/x").is_external);
        assert!(!classifier.classify("/about").is_external);
        assert!(!classifier.classify("//").is_external);
    }

    // ==================== is_http Tests ====================

    #[test]
    fn is_http_reflects_scheme() {
        assert!(classify("https://other.com", &origin()).is_http);
        assert!(classify("HTTP://other.com", &origin()).is_http);
        assert!(classify("//other.com", &origin()).is_http);
        assert!(!classify("mailto:a@b.com", &origin()).is_http);
        assert!(!classify("/about", &origin()).is_http);
        assert!(!classify("ftp://other.com", &origin()).is_http);
    }

    #[test]
    fn should_rewrite_requires_external_http_non_gate() {
        let origin = origin();
        assert!(classify("https://other.com/x", &origin).should_rewrite());
        assert!(!classify("https://mysite.com/x", &origin).should_rewrite());
        assert!(!classify("mailto:a@b.com", &origin).should_rewrite());
        assert!(!classify(&origin.gate_url("https://other.com"), &origin).should_rewrite());
    }

    #[test]
    fn classified_link_keeps_href_verbatim() {
        let link = classify(" https://other.com/x ", &origin());
        assert_eq!(link.href, " https://other.com/x ");
        assert!(link.is_external);
    }

    #[test]
    fn resolve_host_errors() {
        assert_eq!(resolve_host("https://Other.com/x").unwrap(), "other.com");
        assert_eq!(resolve_host("//other.com").unwrap(), "other.com");
        assert!(matches!(
            resolve_host("not a url"),
            Err(LinkError::UnresolvableHost(_))
        ));
    }
}
