//! Route handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{RawQuery, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use tracing::{debug, warn};

use exitlinks_core::{gate, ClassifiedLink, Classifier, ClientConfig};

use crate::error::{GateError, Result};
use crate::models::{ClassifyRequest, FilterRequest, FilterResponse};
use crate::pages::WarningPage;
use crate::state::AppState;

/// GET /leaving - Validate the destination and show the warning page.
///
/// The query string is read raw so the destination is decoded exactly once.
pub async fn leaving(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> std::result::Result<Response, GateError> {
    let target = gate::handle(query.as_deref()).map_err(|e| {
        warn!(code = e.code(), "Gate request rejected");
        GateError {
            source: e,
            site_name: state.settings.site_name.clone(),
            home_url: state.home_url(),
        }
    })?;

    let html = WarningPage {
        target: &target,
        site_name: &state.settings.site_name,
        delay: state.settings.effective_delay(),
    }
    .render();

    Ok((
        [
            (header::CACHE_CONTROL, "no-store"),
            (header::REFERRER_POLICY, "no-referrer"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        Html(html),
    )
        .into_response())
}

/// POST /api/filter - Rewrite external links in an HTML fragment.
pub async fn filter_content(
    State(state): State<AppState>,
    payload: std::result::Result<Json<FilterRequest>, JsonRejection>,
) -> Result<Json<FilterResponse>> {
    let Json(req) = payload?;
    debug!(
        html_len = req.html.len(),
        kind = %req.kind,
        context = ?req.context,
        "Filtering content"
    );

    let outcome = state.filter.apply(&req.html, req.kind, req.context);
    Ok(Json(outcome.into()))
}

/// POST /api/classify - Classify a single href.
pub async fn classify_href(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ClassifyRequest>, JsonRejection>,
) -> Result<Json<ClassifiedLink>> {
    let Json(req) = payload?;
    let classifier =
        Classifier::new(state.settings.origin()?).with_options(state.settings.classifier_options());
    Ok(Json(classifier.classify(&req.href)))
}

/// GET /assets/exit-links.js - The click interceptor with its configuration.
pub async fn interceptor_script(State(state): State<AppState>) -> Result<Response> {
    let config = ClientConfig::from_settings(&state.settings)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        config.bundle(),
    )
        .into_response())
}
