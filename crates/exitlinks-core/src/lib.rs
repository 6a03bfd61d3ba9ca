//! Exitlinks Core - External link classification, rewriting, and gate validation.
//!
//! Routes outbound links through a same-site warning page:
//!
//! - [`classifier`] decides whether an href leaves the site
//! - [`rewriter`] points external anchors in an HTML fragment at the gate
//! - [`gate`] validates the destination a gate request carries
//! - [`filter`] applies rewriting to host content according to [`Settings`]
//! - [`client`] provides the browser-side click interceptor
//!
//! ## Example
//!
//! ```
//! use exitlinks_core::{rewrite, SiteOrigin};
//!
//! let origin = SiteOrigin::parse("https://mysite.com").unwrap();
//! assert_eq!(
//!     rewrite(r#"<a href="https://other.com/x">Go</a>"#, &origin),
//!     r#"<a href="https://mysite.com/leaving?url=https%3A%2F%2Fother.com%2Fx">Go</a>"#,
//! );
//! ```

pub mod classifier;
pub mod client;
pub mod error;
pub mod filter;
pub mod gate;
pub mod html;
pub mod origin;
pub mod rewriter;
pub mod settings;

pub use classifier::{classify, ClassifiedLink, Classifier, ClassifierOptions};
pub use client::{ClientConfig, INTERCEPTOR_SCRIPT};
pub use error::{LinkError, Result};
pub use filter::{ContentFilter, ContentKind, FilterOutcome, RenderContext, SkipReason};
pub use gate::RedirectTarget;
pub use origin::{SiteOrigin, GATE_MARKER, GATE_PARAM, GATE_PATH};
pub use rewriter::{rewrite, LinkRewriter, RewriteMode, RewriteOutcome};
pub use settings::{Settings, SettingsError};
