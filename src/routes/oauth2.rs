// ABOUTME: Local OAuth helper route handlers for consent start, callback, refresh and peek
// ABOUTME: Validates the consent state and maps lifecycle failures to JSON error bodies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use qbo_core::TokenSummary;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    errors::{AppError, AppResult},
    lifecycle::TokenLifecycleManager,
    oauth2_client::{IntuitTokenClient, PendingAuthorizations},
};

/// Shared state for the helper routes
#[derive(Clone)]
pub struct OAuthHelperContext {
    /// Lifecycle orchestrator
    pub lifecycle: Arc<TokenLifecycleManager>,
    /// Consent URL builder; also knows the registered redirect URI
    pub consent: Arc<IntuitTokenClient>,
    /// Outstanding consent `state` values
    pub pending: Arc<PendingAuthorizations>,
}

/// Query parameters Intuit appends to the redirect URI
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code
    pub code: Option<String>,
    /// Company (realm) the user connected
    #[serde(rename = "realmId")]
    pub realm_id: Option<String>,
    /// Echo of the `state` sent to the consent page
    pub state: Option<String>,
    /// Error code when the user declined or the request was invalid
    pub error: Option<String>,
    /// Provider's description of `error`
    pub error_description: Option<String>,
}

/// Optional realm selector for refresh and peek
#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    /// Realm to operate on instead of the default one
    #[serde(rename = "realmId")]
    pub realm_id: Option<String>,
}

/// Body returned by callback and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSavedResponse {
    /// What happened
    pub message: String,
    /// Redacted view of the stored credential
    pub summary: TokenSummary,
}

/// Local OAuth helper routes
pub struct OAuthHelperRoutes;

impl OAuthHelperRoutes {
    const HOME_TEMPLATE: &'static str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>QBO OAuth Helper</title></head>
<body>
<h2>QBO OAuth Helper</h2>
<ul>
  <li><a href="/start">Authenticate in Browser</a></li>
  <li><a href="/refresh">Refresh</a></li>
  <li><a href="/peek">Peek</a></li>
</ul>
<p>Environment: <code>{{ENVIRONMENT}}</code></p>
<p>Redirect URI: <code>{{REDIRECT_URI}}</code></p>
</body>
</html>
"#;

    /// Create the helper router
    ///
    /// # Endpoints
    ///
    /// - `GET /` - Home page with links to the other endpoints
    /// - `GET /start` - Redirect to the Intuit consent page
    /// - `GET /callback` - Consent redirect target; exchanges the code
    /// - `GET /refresh` - Rotate the stored tokens
    /// - `GET /peek` - Redacted view of the stored tokens
    pub fn router(context: OAuthHelperContext) -> Router {
        Router::new()
            .route("/", get(Self::handle_home))
            .route("/start", get(Self::handle_start))
            .route("/callback", get(Self::handle_callback))
            .route("/refresh", get(Self::handle_refresh))
            .route("/peek", get(Self::handle_peek))
            .with_state(context)
    }

    /// Render the home page
    #[must_use]
    pub fn home_html(redirect_uri: &str, environment: &str) -> String {
        Self::HOME_TEMPLATE
            .replace("{{REDIRECT_URI}}", &html_escape::encode_text(redirect_uri))
            .replace("{{ENVIRONMENT}}", &html_escape::encode_text(environment))
    }

    async fn handle_home(State(context): State<OAuthHelperContext>) -> Html<String> {
        Html(Self::home_html(
            &context.consent.config().redirect_uri,
            context.lifecycle.environment().as_str(),
        ))
    }

    async fn handle_start(State(context): State<OAuthHelperContext>) -> Redirect {
        let state = context.pending.issue();
        info!("Redirecting to Intuit consent page");
        Redirect::to(&context.consent.authorization_url(&state))
    }

    async fn handle_callback(
        State(context): State<OAuthHelperContext>,
        Query(query): Query<CallbackQuery>,
    ) -> AppResult<Response> {
        let state_ok = query
            .state
            .as_deref()
            .is_some_and(|state| context.pending.consume(state));
        if !state_ok {
            warn!("Rejected callback with unknown or expired state");
            return Err(AppError::invalid_input(
                "invalid_state",
                "Unknown or expired state parameter; start again from /start",
            ));
        }

        if let Some(error) = query.error.as_deref() {
            let description = query.error_description.as_deref().unwrap_or(error);
            warn!(provider_error = %error, "Consent was not granted");
            return Err(AppError::invalid_input(
                "authorization_denied",
                format!("Authorization failed: {error}: {description}"),
            ));
        }

        let code = query
            .code
            .as_deref()
            .filter(|code| !code.is_empty())
            .ok_or_else(|| AppError::invalid_input("missing_code", "Missing code"))?;

        let summary = context
            .lifecycle
            .authenticate(
                code,
                &context.consent.config().redirect_uri,
                query.realm_id.as_deref(),
            )
            .await?;

        Ok((
            StatusCode::OK,
            Json(TokenSavedResponse {
                message: "Tokens saved".to_owned(),
                summary,
            }),
        )
            .into_response())
    }

    async fn handle_refresh(
        State(context): State<OAuthHelperContext>,
        Query(query): Query<ScopeQuery>,
    ) -> AppResult<Response> {
        let summary = context
            .lifecycle
            .refresh_scope(query.realm_id.as_deref())
            .await?;

        Ok((
            StatusCode::OK,
            Json(TokenSavedResponse {
                message: "Refreshed".to_owned(),
                summary,
            }),
        )
            .into_response())
    }

    async fn handle_peek(
        State(context): State<OAuthHelperContext>,
        Query(query): Query<ScopeQuery>,
    ) -> AppResult<Response> {
        let summary = context
            .lifecycle
            .peek_scope(query.realm_id.as_deref())
            .await?
            .ok_or_else(|| AppError::not_found("No QBO token stored"))?;

        Ok((StatusCode::OK, Json(summary)).into_response())
    }
}
