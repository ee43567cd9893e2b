//! The inbound webhook guard.
//!
//! [`twilio_view`] wraps an application handler so that it only ever sees
//! POST requests signed by Twilio:
//! 1. Reject anything but POST with 405
//! 2. Rebuild the URL Twilio signed and read `X-Twilio-Signature`
//! 3. Verify the HMAC-SHA1 signature (unless validation is skipped)
//! 4. Run the handler on the original request
//! 5. Coerce the handler's [`TwimlReply`] into an `application/xml` response

use std::{future::Future, sync::Arc};

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::Request,
    http::{request::Parts, Method},
    response::{IntoResponse, Response},
    routing::{any, MethodRouter},
};
use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, error, warn};

use crate::config::GuardConfig;
use crate::error::GuardError;
use crate::web::reply::{coerce, TwimlReply};
use crate::web::request::{extract_signature, form_params, reconstruct_url};
use crate::web::signature::{body_sha256_param, RequestValidator};

/// Marker placed in the request extensions of every guarded request.
///
/// Twilio posts from its own servers rather than a browser session, so
/// cross-site request forgery protection does not apply to these routes;
/// the signature check stands in for it. CSRF layers nested inside a
/// guarded route should skip requests carrying this marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsrfExempt;

/// Pre-handler checks for Twilio webhooks, sharing one configuration.
#[derive(Debug, Clone)]
pub struct TwilioGuard {
    config: Arc<GuardConfig>,
    validator: Option<RequestValidator>,
}

impl TwilioGuard {
    pub fn new(config: Arc<GuardConfig>) -> Self {
        let validator = config.auth_token.as_deref().map(RequestValidator::new);
        Self { config, validator }
    }

    /// Run every check that precedes the handler.
    ///
    /// On success the request is handed back with its body re-attached
    /// byte for byte and a [`CsrfExempt`] marker in its extensions.
    pub async fn check(&self, request: Request) -> Result<Request, GuardError> {
        if *request.method() != Method::POST {
            error!(
                method = %request.method(),
                uri = %request.uri(),
                "twilio_method_not_allowed"
            );
            return Err(GuardError::MethodNotAllowed {
                method: request.method().clone(),
            });
        }

        let (mut parts, body) = request.into_parts();
        let body = match to_bytes(body, self.config.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(
                    error = %e,
                    uri = %parts.uri,
                    max_body_bytes = self.config.max_body_bytes,
                    "twilio_body_unreadable"
                );
                return Err(GuardError::UnreadableBody);
            }
        };

        if self.config.skip_signature_validation {
            debug!(uri = %parts.uri, "twilio_signature_validation_skipped");
        } else {
            self.verify(&parts, &body)?;
        }

        parts.extensions.insert(CsrfExempt);
        Ok(Request::from_parts(parts, Body::from(body)))
    }

    /// Verify the request signature against the configured auth token.
    fn verify(&self, parts: &Parts, body: &Bytes) -> Result<(), GuardError> {
        let (url, signature, validator) = self
            .validation_inputs(parts)
            .inspect_err(|e| {
                error!(
                    method = %parts.method,
                    uri = %parts.uri,
                    error = %e,
                    "twilio_missing_validation_field"
                );
            })?;

        let valid = if body_sha256_param(&url).is_some() {
            validator.validate_body(&url, body, &signature)
        } else {
            validator.validate(&url, &form_params(&parts.headers, body), &signature)
        };

        if valid {
            debug!(uri = %parts.uri, url = %url, "twilio_request_validated");
            return Ok(());
        }

        if self.config.debug {
            warn!(
                method = %parts.method,
                uri = %parts.uri,
                url = %url,
                signature = %signature,
                "twilio_signature_invalid_debug_bypass"
            );
            return Ok(());
        }

        error!(
            method = %parts.method,
            uri = %parts.uri,
            url = %url,
            signature = %signature,
            "twilio_signature_invalid"
        );
        Err(GuardError::InvalidSignature)
    }

    fn validation_inputs(
        &self,
        parts: &Parts,
    ) -> Result<(String, String, &RequestValidator), GuardError> {
        let validator = self
            .validator
            .as_ref()
            .ok_or_else(|| GuardError::missing("TWILIO_AUTH_TOKEN"))?;
        let url = reconstruct_url(parts, &self.config.local_scheme)?;
        let signature = extract_signature(&parts.headers)?;
        Ok((url, signature, validator))
    }
}

/// Wrap `handler` in the Twilio guard.
///
/// The result is itself an axum handler taking the raw request. Mount it
/// with [`axum::routing::any`] (or use [`twilio_route`]) so that the guard,
/// not the router, answers non-POST requests.
pub fn twilio_view<F, Fut, R>(
    config: Arc<GuardConfig>,
    handler: F,
) -> impl Fn(Request) -> BoxFuture<'static, Response> + Clone + Send + Sync + 'static
where
    F: Fn(Request) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: Into<TwimlReply>,
{
    let guard = TwilioGuard::new(config);

    move |request: Request| {
        let guard = guard.clone();
        let handler = handler.clone();
        async move {
            let request = match guard.check(request).await {
                Ok(request) => request,
                Err(rejection) => return rejection.into_response(),
            };
            coerce(handler(request).await.into())
        }
        .boxed()
    }
}

/// [`twilio_view`] mounted for every method.
pub fn twilio_route<F, Fut, R, S>(config: Arc<GuardConfig>, handler: F) -> MethodRouter<S>
where
    F: Fn(Request) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: Into<TwimlReply> + 'static,
    S: Clone + Send + Sync + 'static,
{
    any(twilio_view(config, handler))
}
