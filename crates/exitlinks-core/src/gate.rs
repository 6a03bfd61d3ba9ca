//! Redirect gate validation.
//!
//! The gate receives the `url` parameter of a rewritten link and decides
//! whether the warning page may offer it. Input is handled in a fixed order:
//! sanitize for transport, percent-decode exactly once, then validate as an
//! absolute http(s) URL. The gate never redirects on its own; a validated
//! target is only ever offered behind a confirmation page.

use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::classifier::is_http_scheme;
use crate::error::{LinkError, Result};
use crate::origin::GATE_PARAM;

/// A destination that passed gate validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectTarget {
    url: String,
    label: String,
}

impl RedirectTarget {
    /// The decoded destination, exactly as it was carried by the gate URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The destination host, shown to the user.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Validates the destination carried by a raw (undecoded) query string.
///
/// # Errors
///
/// - [`LinkError::MissingDestination`] if there is no non-empty `url`
///   parameter.
/// - [`LinkError::InvalidDestination`] if the decoded value is not an
///   absolute http(s) URL.
///
/// # Examples
///
/// ```
/// use exitlinks_core::gate;
///
/// let target = gate::handle(Some("url=https%3A%2F%2Fexample.org%2Fpage")).unwrap();
/// assert_eq!(target.url(), "https://example.org/page");
/// assert_eq!(target.label(), "example.org");
///
/// assert!(gate::handle(None).is_err());
/// ```
pub fn handle(raw_query: Option<&str>) -> Result<RedirectTarget> {
    let raw = raw_query
        .and_then(|query| query_param(query, GATE_PARAM))
        .map(sanitize)
        .unwrap_or_default();

    if raw.is_empty() {
        debug!("Gate request without destination");
        return Err(LinkError::MissingDestination);
    }

    let decoded = urlencoding::decode(&raw)
        .map_err(|_| LinkError::InvalidDestination("not valid UTF-8".to_string()))?;

    let target = validate_destination(&decoded)?;
    info!(label = %target.label, "Gate destination accepted");
    Ok(target)
}

/// Validates an already-decoded destination.
///
/// # Errors
///
/// Returns [`LinkError::InvalidDestination`] with the reason for rejection.
pub fn validate_destination(decoded: &str) -> Result<RedirectTarget> {
    let invalid = |reason: &str| LinkError::InvalidDestination(reason.to_string());

    if decoded.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(invalid("contains whitespace or control characters"));
    }

    let Some((scheme, rest)) = decoded.split_once("://") else {
        return Err(invalid("not an absolute URL"));
    };
    if !is_http_scheme(scheme) {
        return Err(invalid("scheme must be http or https"));
    }
    if rest.starts_with(['/', '\\']) {
        return Err(invalid("malformed authority"));
    }

    let url = Url::parse(decoded).map_err(|e| invalid(&e.to_string()))?;
    let label = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => return Err(invalid("missing host")),
    };

    Ok(RedirectTarget {
        url: decoded.to_string(),
        label,
    })
}

/// Returns the raw value of the first `name` parameter in a query string.
pub fn query_param<'a>(raw_query: &'a str, name: &str) -> Option<&'a str> {
    raw_query
        .trim_start_matches('?')
        .split('&')
        .find_map(|pair| match pair.split_once('=') {
            Some((key, value)) if key == name => Some(value),
            None if pair == name => Some(""),
            _ => None,
        })
}

/// Strips control characters and surrounding whitespace.
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(url: &str) -> String {
        format!("url={}", urlencoding::encode(url))
    }

    // ==================== Missing Destination Tests ====================

    #[test]
    fn no_query_is_missing() {
        assert_eq!(handle(None), Err(LinkError::MissingDestination));
    }

    #[test]
    fn absent_or_empty_param_is_missing() {
        for query in ["", "other=1", "url=", "url", "?url=", "url=\t", "url=\u{7} "] {
            assert_eq!(
                handle(Some(query)),
                Err(LinkError::MissingDestination),
                "{query:?}"
            );
        }
    }

    // ==================== Invalid Destination Tests ====================

    #[test]
    fn not_a_url_is_invalid() {
        assert!(matches!(
            handle(Some(&encoded("not a url"))),
            Err(LinkError::InvalidDestination(_))
        ));
        assert!(matches!(
            handle(Some("url=not a url")),
            Err(LinkError::InvalidDestination(_))
        ));
    }

    #[test]
    fn non_http_schemes_are_invalid() {
        for url in [
            "javascript:alert(1)",
            "javascript://example.org/%0Aalert(1)",
            "data:text/html,hi",
            "ftp://example.org/file",
            "mailto:a@b.com",
        ] {
            assert!(
                matches!(
                    handle(Some(&encoded(url))),
                    Err(LinkError::InvalidDestination(_))
                ),
                "{url}"
            );
        }
    }

    #[test]
    fn relative_and_malformed_urls_are_invalid() {
        for url in [
            "/about",
            "//example.org/x",
            "http:example.org",
            "https:///example.org",
            "https:/\\example.org",
            "https://",
            "https://exa mple.org",
        ] {
            assert!(
                matches!(
                    handle(Some(&encoded(url))),
                    Err(LinkError::InvalidDestination(_))
                ),
                "{url}"
            );
        }
    }

    #[test]
    fn decoded_control_characters_are_invalid() {
        assert!(matches!(
            handle(Some("url=https%3A%2F%2Fexample.org%2F%0D%0ASet-Cookie")),
            Err(LinkError::InvalidDestination(_))
        ));
    }

    #[test]
    fn invalid_utf8_is_invalid() {
        assert!(matches!(
            handle(Some("url=https%3A%2F%2Fexample.org%2F%FF")),
            Err(LinkError::InvalidDestination(_))
        ));
    }

    #[test]
    fn decodes_exactly_once() {
        let double = format!("url={}", urlencoding::encode(&urlencoding::encode("https://x.com/")));
        assert!(matches!(
            handle(Some(&double)),
            Err(LinkError::InvalidDestination(_))
        ));
    }

    // ==================== Accepted Destination Tests ====================

    #[test]
    fn valid_destination_is_accepted() {
        let target = handle(Some(&encoded("https://example.org/page"))).unwrap();
        assert_eq!(target.url(), "https://example.org/page");
        assert_eq!(target.label(), "example.org");
    }

    #[test]
    fn destination_passes_through_unchanged() {
        let url = "HTTPS://Example.org:8443/a/../b?q=a+b&x=%20#frag";
        let target = handle(Some(&encoded(url))).unwrap();
        assert_eq!(target.url(), url);
        assert_eq!(target.label(), "example.org");
    }

    #[test]
    fn unencoded_value_is_accepted() {
        let target = handle(Some("url=https://example.org/page")).unwrap();
        assert_eq!(target.url(), "https://example.org/page");
    }

    #[test]
    fn first_url_param_wins() {
        let query = format!("ref=home&{}&{}", encoded("https://a.com/"), encoded("https://b.com/"));
        assert_eq!(handle(Some(&query)).unwrap().label(), "a.com");
    }

    #[test]
    fn raw_whitespace_is_trimmed_but_encoded_whitespace_is_not() {
        let err = handle(Some("url=%20https%3A%2F%2Fexample.org%2F")).unwrap_err();
        assert!(matches!(err, LinkError::InvalidDestination(_)));
        let target = handle(Some("url= https%3A%2F%2Fexample.org%2F ")).unwrap();
        assert_eq!(target.url(), "https://example.org/");
    }

    #[test]
    fn userinfo_is_not_part_of_label() {
        let target = handle(Some(&encoded("https://user:pw@example.org/"))).unwrap();
        assert_eq!(target.label(), "example.org");
    }

    // ==================== Helper Tests ====================

    #[test]
    fn query_param_lookup() {
        assert_eq!(query_param("a=1&url=x&url=y", "url"), Some("x"));
        assert_eq!(query_param("?url=x", "url"), Some("x"));
        assert_eq!(query_param("urls=x", "url"), None);
        assert_eq!(query_param("url", "url"), Some(""));
    }

    #[test]
    fn sanitize_strips_controls() {
        assert_eq!(sanitize("\u{7}abc\u{0}def\n "), "abcdef");
    }
}
