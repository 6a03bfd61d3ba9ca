//! The hosting site's origin and the gate URLs built from it.

use url::Url;

use crate::error::{LinkError, Result};

/// Path of the redirect gate, relative to the site base.
pub const GATE_PATH: &str = "/leaving";

/// Query parameter carrying the encoded destination.
pub const GATE_PARAM: &str = "url";

/// Substring that identifies an href already pointing at the gate.
pub const GATE_MARKER: &str = "/leaving?url=";

/// The scheme and host of the hosting site, derived from its base URL.
///
/// Built fresh from configuration for every filter invocation or gate
/// request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteOrigin {
    /// Base URL without a trailing slash, e.g. `https://mysite.com/blog`.
    base: String,
    /// Lowercased host as configured, e.g. `www.mysite.com`.
    host: String,
    /// Base path without a trailing slash, e.g. `/blog`, or empty.
    path: String,
}

impl SiteOrigin {
    /// Parses the site's base URL.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::InvalidSiteUrl`] unless the value is an absolute
    /// http(s) URL with a host.
    pub fn parse(site_url: &str) -> Result<Self> {
        let trimmed = site_url.trim();
        let invalid = |reason: &str| LinkError::InvalidSiteUrl {
            url: trimmed.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_ascii_lowercase(),
            _ => return Err(invalid("missing host")),
        };

        let path = url.path().trim_end_matches('/').to_string();
        let base = format!("{}{}", url.origin().ascii_serialization(), path);

        Ok(Self { base, host, path })
    }

    /// Returns the base URL without a trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Returns the site's scheme, `http` or `https`.
    pub fn scheme(&self) -> &str {
        self.base.split_once("://").map_or("https", |(scheme, _)| scheme)
    }

    /// Returns the configured host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the host with any leading `www.` removed.
    pub fn normalized_host(&self) -> &str {
        strip_www(&self.host)
    }

    /// Returns the gate endpoint, e.g. `https://mysite.com/leaving`.
    pub fn gate_base(&self) -> String {
        format!("{}{}", self.base, GATE_PATH)
    }

    /// Returns the request path the gate is served at, e.g. `/blog/leaving`.
    pub fn gate_path(&self) -> String {
        format!("{}{}", self.path, GATE_PATH)
    }

    /// Builds the gate URL that carries `href` as its encoded destination.
    pub fn gate_url(&self, href: &str) -> String {
        format!(
            "{}?{}={}",
            self.gate_base(),
            GATE_PARAM,
            urlencoding::encode(href)
        )
    }
}

/// Strips a leading `www.` (any case) from a host.
pub fn strip_www(host: &str) -> &str {
    match host.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("www.") => &host[4..],
        _ => host,
    }
}

/// Returns true if `href` already points at a redirect gate.
pub fn is_gate_url(href: &str) -> bool {
    href.contains(GATE_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_origin() {
        let origin = SiteOrigin::parse("https://mysite.com").unwrap();
        assert_eq!(origin.base(), "https://mysite.com");
        assert_eq!(origin.host(), "mysite.com");
        assert_eq!(origin.scheme(), "https");
    }

    #[test]
    fn parse_strips_trailing_slash_and_keeps_subdirectory() {
        let origin = SiteOrigin::parse("https://mysite.com/blog/").unwrap();
        assert_eq!(origin.base(), "https://mysite.com/blog");
        assert_eq!(origin.gate_base(), "https://mysite.com/blog/leaving");
        assert_eq!(origin.gate_path(), "/blog/leaving");
    }

    #[test]
    fn gate_path_at_root() {
        let origin = SiteOrigin::parse("https://mysite.com/").unwrap();
        assert_eq!(origin.gate_path(), GATE_PATH);
    }

    #[test]
    fn parse_keeps_non_default_port() {
        let origin = SiteOrigin::parse("http://localhost:8080/").unwrap();
        assert_eq!(origin.base(), "http://localhost:8080");
        assert_eq!(origin.host(), "localhost");
        assert_eq!(origin.scheme(), "http");
    }

    #[test]
    fn parse_lowercases_host() {
        let origin = SiteOrigin::parse("https://WWW.MySite.com").unwrap();
        assert_eq!(origin.host(), "www.mysite.com");
        assert_eq!(origin.normalized_host(), "mysite.com");
    }

    #[test]
    fn parse_rejects_relative_and_non_http() {
        assert!(matches!(
            SiteOrigin::parse("/just/a/path"),
            Err(LinkError::InvalidSiteUrl { .. })
        ));
        assert!(matches!(
            SiteOrigin::parse("ftp://mysite.com"),
            Err(LinkError::InvalidSiteUrl { .. })
        ));
        assert!(SiteOrigin::parse("").is_err());
    }

    #[test]
    fn gate_url_encodes_destination() {
        let origin = SiteOrigin::parse("https://mysite.com").unwrap();
        assert_eq!(
            origin.gate_url("https://other.com/x"),
            "https://mysite.com/leaving?url=https%3A%2F%2Fother.com%2Fx"
        );
    }

    #[test]
    fn gate_url_is_recognized() {
        let origin = SiteOrigin::parse("https://mysite.com").unwrap();
        assert!(is_gate_url(&origin.gate_url("https://other.com/?a=1&b=2")));
        assert!(!is_gate_url("https://other.com/leaving"));
    }

    #[test]
    fn strip_www_variants() {
        assert_eq!(strip_www("www.example.com"), "example.com");
        assert_eq!(strip_www("WWW.example.com"), "example.com");
        assert_eq!(strip_www("blog.example.com"), "blog.example.com");
        assert_eq!(strip_www("www"), "www");
        assert_eq!(strip_www("wwwexample.com"), "wwwexample.com");
    }
}
