//! HTML pages served by the redirect gate.

use exitlinks_core::html::escape;
use exitlinks_core::RedirectTarget;

const WARNING_PAGE_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="robots" content="noindex, nofollow">
    <meta name="referrer" content="no-referrer">
    <title>Leaving Site - {{SITE_NAME}}</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #f4f5f7;
            margin: 0;
        }
        .leaving-page-container {
            max-width: 600px;
            margin: 50px auto;
            padding: 40px;
            background: white;
            border-radius: 8px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
            text-align: center;
        }
        .warning-icon { font-size: 48px; color: #ff6b35; margin-bottom: 20px; }
        h1 { color: #2c3e50; margin-bottom: 20px; font-size: 28px; }
        .domain { font-weight: bold; color: #3498db; word-break: break-all; }
        .warning-message {
            background-color: #fff3cd;
            border: 1px solid #ffeaa7;
            border-radius: 4px;
            padding: 20px;
            margin: 20px 0;
            color: #856404;
        }
        .button {
            display: inline-block;
            color: white;
            padding: 12px 30px;
            text-decoration: none;
            border-radius: 4px;
            font-weight: bold;
            margin: 20px 10px;
        }
        .continue-button { background-color: #007cba; }
        .continue-button:hover { background-color: #005a87; }
        .cancel-button { background-color: #6c757d; }
        .cancel-button:hover { background-color: #545b62; }
        .countdown { font-size: 18px; color: #007cba; margin: 20px 0; font-weight: bold; }
        .site-info {
            margin-top: 30px;
            padding-top: 20px;
            border-top: 1px solid #eee;
            color: #666;
            font-size: 14px;
        }
    </style>
</head>
<body>
    <div class="leaving-page-container">
        <div class="warning-icon">&#9888;&#65039;</div>
        <h1>You are leaving our website</h1>

        <p>You are about to visit:</p>
        <p class="domain">{{DOMAIN}}</p>

        <div class="warning-message">
            <p>This is an external website. We are not responsible for the content, privacy policies, or practices of external sites.</p>
        </div>
{{COUNTDOWN}}
        <div>
            <a href="{{URL}}" class="button continue-button" id="continue-btn" rel="noopener noreferrer">Continue to External Site</a>
            <a href="#" class="button cancel-button" id="back-btn">Go Back</a>
        </div>

        <div class="site-info">
            <p>{{SITE_NAME}} - External Link Redirect</p>
        </div>
    </div>
    <script>
        document.getElementById('back-btn').addEventListener('click', function (event) {
            event.preventDefault();
            if (window.opener) {
                window.close();
            } else {
                history.back();
            }
        });
    </script>
</body>
</html>
"##;

const COUNTDOWN_HTML: &str = r#"
        <div class="countdown" id="countdown">Redirecting automatically in <span id="countdown-seconds">{{DELAY}}</span> seconds...</div>
        <script>
            (function () {
                var remaining = {{DELAY}};
                var label = document.getElementById('countdown-seconds');
                var timer = setInterval(function () {
                    remaining -= 1;
                    label.textContent = remaining;
                    if (remaining <= 0) {
                        clearInterval(timer);
                        window.location.href = document.getElementById('continue-btn').href;
                    }
                }, 1000);
            })();
        </script>
"#;

const ERROR_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="robots" content="noindex, nofollow">
    <title>Error - {{SITE_NAME}}</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #f4f5f7;
            margin: 0;
        }
        .error-container {
            max-width: 600px;
            margin: 50px auto;
            padding: 40px;
            background: white;
            border-radius: 8px;
            text-align: center;
            color: #2c3e50;
        }
    </style>
</head>
<body>
    <div class="error-container">
        <h1>{{MESSAGE}}</h1>
        <p><a href="{{HOME}}">Return to {{SITE_NAME}}</a></p>
    </div>
</body>
</html>
"#;

/// The confirmation page shown before leaving the site.
#[derive(Debug, Clone, Copy)]
pub struct WarningPage<'a> {
    pub target: &'a RedirectTarget,
    pub site_name: &'a str,
    /// Countdown seconds; 0 disables the automatic redirect.
    pub delay: u32,
}

impl WarningPage<'_> {
    pub fn render(&self) -> String {
        let delay = self.delay.to_string();
        let countdown = if self.delay > 0 {
            fill(COUNTDOWN_HTML, &[("DELAY", delay.as_str())])
        } else {
            String::new()
        };

        fill(
            WARNING_PAGE_HTML,
            &[
                ("SITE_NAME", &*escape(self.site_name)),
                ("DOMAIN", &*escape(self.target.label())),
                ("URL", &*escape(self.target.url())),
                ("COUNTDOWN", countdown.as_str()),
            ],
        )
    }
}

/// Terminal page for a gate request that cannot be honored.
#[derive(Debug, Clone, Copy)]
pub struct ErrorPage<'a> {
    pub message: &'a str,
    pub site_name: &'a str,
    pub home_url: &'a str,
}

impl ErrorPage<'_> {
    pub fn render(&self) -> String {
        fill(
            ERROR_PAGE_HTML,
            &[
                ("MESSAGE", &*escape(self.message)),
                ("SITE_NAME", &*escape(self.site_name)),
                ("HOME", &*escape(self.home_url)),
            ],
        )
    }
}

/// Substitutes `{{NAME}}` placeholders in a single pass, so substituted
/// values are never scanned for placeholders themselves.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let value = after.find("}}").and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });

        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use exitlinks_core::gate;

    fn target(url: &str) -> RedirectTarget {
        gate::validate_destination(url).unwrap()
    }

    #[test]
    fn warning_page_contains_destination() {
        let target = target("https://example.org/page?a=1&b=2");
        let html = WarningPage {
            target: &target,
            site_name: "My Site",
            delay: 0,
        }
        .render();

        assert!(html.contains("<title>Leaving Site - My Site</title>"));
        assert!(html.contains("You are leaving our website"));
        assert!(html.contains(r#"<p class="domain">example.org</p>"#));
        assert!(html.contains(r#"href="https://example.org/page?a=1&amp;b=2""#));
        assert!(html.contains("My Site - External Link Redirect"));
        assert!(!html.contains("Redirecting automatically"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn warning_page_countdown() {
        let target = target("https://example.org/");
        let html = WarningPage {
            target: &target,
            site_name: "My Site",
            delay: 5,
        }
        .render();

        assert!(html.contains(r#"<span id="countdown-seconds">5</span> seconds..."#));
        assert!(html.contains("var remaining = 5;"));
        assert!(html.contains("document.getElementById('continue-btn').href"));
    }

    #[test]
    fn site_name_is_escaped() {
        let target = target("https://example.org/");
        let html = WarningPage {
            target: &target,
            site_name: "<b>Tom & Jerry's</b> {{URL}}",
            delay: 0,
        }
        .render();

        assert!(html.contains("&lt;b&gt;Tom &amp; Jerry&#39;s&lt;/b&gt; {{URL}}"));
        assert!(!html.contains("<b>Tom"));
    }

    #[test]
    fn destination_cannot_break_out_of_attribute() {
        let target = target("https://example.org/\"><script>alert(1)</script>");
        let html = WarningPage {
            target: &target,
            site_name: "My Site",
            delay: 0,
        }
        .render();

        assert!(!html.contains("<script>alert(1)"));
        assert!(html.contains("&quot;&gt;&lt;script&gt;"));
    }

    #[test]
    fn error_page_renders_message() {
        let html = ErrorPage {
            message: "Invalid URL provided.",
            site_name: "My Site",
            home_url: "https://mysite.com/",
        }
        .render();

        assert!(html.contains("<h1>Invalid URL provided.</h1>"));
        assert!(html.contains(r#"<a href="https://mysite.com/">Return to My Site</a>"#));
        assert!(!html.contains("continue-btn"));
    }

    #[test]
    fn fill_leaves_unknown_placeholders() {
        assert_eq!(fill("a {{X}} {{Y}} {{", &[("X", "1")]), "a 1 {{Y}} {{");
    }
}
