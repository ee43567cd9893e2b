//! Endpoint handlers for the demo server.
//!
//! The SMS endpoint is an ordinary handler: it never sees a request the
//! guard has not already checked.

use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, Form, FromRequest, Request},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::GuardConfig;
use crate::twiml::Twiml;
use crate::web::guard::twilio_route;

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

// =============================================================================
// Inbound SMS
// =============================================================================

/// The subset of Twilio's inbound message fields the demo reads.
///
/// Twilio sends form-encoded data with PascalCase field names.
#[derive(Debug, Deserialize)]
pub struct InboundSms {
    #[serde(rename = "MessageSid", default)]
    pub message_sid: String,
    #[serde(rename = "From", default)]
    pub from: String,
    #[serde(rename = "To", default)]
    pub to: String,
    #[serde(rename = "Body", default)]
    pub body: String,
}

/// Reply to an inbound SMS by echoing its body.
pub async fn sms_reply(request: Request) -> Result<Twiml, FormRejection> {
    let Form(sms) = Form::<InboundSms>::from_request(request, &()).await?;

    info!(
        message_sid = %sms.message_sid,
        from = %sms.from,
        to = %sms.to,
        body_length = sms.body.len(),
        "sms_received"
    );

    Ok(Twiml::new().message(format!("You said: {}", sms.body)))
}

/// Build the demo router: `/health` plus the guarded `/sms` endpoint.
pub fn router(config: Arc<GuardConfig>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sms", twilio_route(config, sms_reply))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::request::SIGNATURE_HEADER;
    use crate::web::signature::RequestValidator;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request as HttpRequest, StatusCode},
    };
    use tower::ServiceExt;

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(Arc::new(GuardConfig::with_auth_token("token")));
        let response = app
            .oneshot(HttpRequest::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let parsed: HealthResponse = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(parsed.status, "ok");
    }

    #[tokio::test]
    async fn test_sms_reply_echoes_body() {
        let token = "token";
        let params = vec![
            ("MessageSid".to_string(), "SM1".to_string()),
            ("From".to_string(), "+15551234567".to_string()),
            ("To".to_string(), "+15557654321".to_string()),
            ("Body".to_string(), "hello & bye".to_string()),
        ];
        let signature =
            RequestValidator::new(token).compute_signature("http://localhost:8080/sms", &params)
            .unwrap();

        let app = router(Arc::new(GuardConfig::with_auth_token(token)));
        let response = app
            .oneshot(
                HttpRequest::post("/sms")
                    .header(header::HOST, "localhost:8080")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .header(SIGNATURE_HEADER, signature)
                    .body(Body::from(
                        "MessageSid=SM1&From=%2B15551234567&To=%2B15557654321&Body=hello+%26+bye",
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_text(response).await,
            Twiml::new().message("You said: hello & bye").to_xml()
        );
    }

    #[tokio::test]
    async fn test_sms_rejects_get() {
        let app = router(Arc::new(GuardConfig::with_auth_token("token")));
        let response = app
            .oneshot(HttpRequest::get("/sms").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_sms_without_form_content_type_fails_in_handler() {
        let config = GuardConfig {
            skip_signature_validation: true,
            ..GuardConfig::default()
        };
        let app = router(Arc::new(config));
        let response = app
            .oneshot(HttpRequest::post("/sms").body(Body::from("Body=hi")).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
