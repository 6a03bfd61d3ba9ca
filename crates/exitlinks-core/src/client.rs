//! Browser-side click interceptor.
//!
//! The interceptor catches clicks on anchors the server never saw, such as
//! content injected after page load. It applies the same classification rules
//! in the browser and opens the gate in a new tab. Its configuration is
//! injected as `window.exitLinksConfig` ahead of the script body.

use serde::Serialize;

use crate::error::Result;
use crate::settings::{Settings, PROCESSED_ATTRIBUTE};

/// The interceptor script body.
pub const INTERCEPTOR_SCRIPT: &str = include_str!("../assets/exit-links.js");

/// Configuration injected ahead of the interceptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub site_origin: String,
    pub gate_base_url: String,
    pub enabled: bool,
    pub content_selectors: Vec<String>,
    pub fallback_selectors: Vec<String>,
    pub processed_attribute: String,
    pub protocol_relative_external: bool,
}

impl ClientConfig {
    /// Builds the client configuration from settings.
    ///
    /// # Errors
    ///
    /// Returns [`crate::LinkError::InvalidSiteUrl`] if the site URL is unusable.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let origin = settings.origin()?;
        Ok(Self {
            site_origin: origin.base().to_string(),
            gate_base_url: origin.gate_base(),
            enabled: settings.enable_redirects,
            content_selectors: settings.content_selectors.clone(),
            fallback_selectors: settings.fallback_selectors.clone(),
            processed_attribute: PROCESSED_ATTRIBUTE.to_string(),
            protocol_relative_external: settings.protocol_relative_external,
        })
    }

    /// Renders the `window.exitLinksConfig = {...};` prelude.
    pub fn prelude(&self) -> String {
        // Serializing a struct of strings and bools cannot fail.
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        // Keep `</script>` in a selector from closing an inline script tag.
        format!("window.exitLinksConfig = {};\n", json.replace("</", "<\\/"))
    }

    /// Returns the prelude followed by the interceptor script.
    pub fn bundle(&self) -> String {
        let mut out = self.prelude();
        out.push_str(INTERCEPTOR_SCRIPT);
        out
    }
}
