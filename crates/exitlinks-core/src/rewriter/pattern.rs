//! Regex-based anchor rewriting.
//!
//! Fallback for hosts that want the simpler scan. It only sees anchors that
//! have a quoted href and an explicit `</a>`, and the rewritten href is
//! always double-quoted. The attribute name must be exactly `href`, so
//! `data-href` and similar are never touched.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ANCHOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\s+((?:[^>]*?\s)?)href\s*=\s*["']([^"']*?)["']([^>]*?)>(.*?)</a>"#)
        .expect("Invalid anchor pattern")
});

/// Rewrites every matched anchor whose href `replace` maps to a new value.
///
/// Returns the new HTML and the number of anchors rewritten.
pub(crate) fn rewrite_anchors<F>(html: &str, mut replace: F) -> (String, usize)
where
    F: FnMut(&str) -> Option<String>,
{
    let mut rewritten = 0;
    let output = ANCHOR_PATTERN.replace_all(html, |caps: &Captures<'_>| {
        match replace(&caps[2]) {
            Some(href) => {
                rewritten += 1;
                format!(
                    "<a {}href=\"{}\"{}>{}</a>",
                    &caps[1], href, &caps[3], &caps[4]
                )
            }
            None => caps[0].to_string(),
        }
    });

    (output.into_owned(), rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper(href: &str) -> Option<String> {
        href.starts_with("http").then(|| href.to_uppercase())
    }

    #[test]
    fn rewrites_matching_anchor() {
        let (html, n) = rewrite_anchors(r#"<a class="x" href='http://a' id="y">t</a>"#, upper);
        assert_eq!(html, r#"<a class="x" href="HTTP://A" id="y">t</a>"#);
        assert_eq!(n, 1);
    }

    #[test]
    fn leaves_declined_anchor_verbatim() {
        let input = r#"<A HREF='/local'>t</A>"#;
        let (html, n) = rewrite_anchors(input, upper);
        assert_eq!(html, input);
        assert_eq!(n, 0);
    }

    #[test]
    fn spans_newlines_in_link_text() {
        let (html, n) = rewrite_anchors("<a href=\"http://a\">line\nbreak</a>", upper);
        assert_eq!(html, "<a href=\"HTTP://A\">line\nbreak</a>");
        assert_eq!(n, 1);
    }

    #[test]
    fn skips_attributes_ending_in_href() {
        let (html, n) = rewrite_anchors(r#"<a data-href="x" href="http://a">t</a>"#, upper);
        assert_eq!(html, r#"<a data-href="x" href="HTTP://A">t</a>"#);
        assert_eq!(n, 1);
    }

    #[test]
    fn only_attribute_ending_in_href_is_not_an_href() {
        let input = r#"<a data-href="http://a">t</a>"#;
        assert_eq!(rewrite_anchors(input, upper), (input.to_string(), 0));
    }

    #[test]
    fn tolerates_spaces_around_equals() {
        let (html, n) = rewrite_anchors(r#"<a href = "http://a">t</a>"#, upper);
        assert_eq!(html, r#"<a href="HTTP://A">t</a>"#);
        assert_eq!(n, 1);
    }

    #[test]
    fn ignores_unquoted_href() {
        let input = "<a href=http://a>t</a>";
        assert_eq!(rewrite_anchors(input, upper).0, input);
    }
}
