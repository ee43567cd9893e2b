//! Web module for guarding inbound Twilio webhooks.
//!
//! This module provides:
//! - The request guard wrapping application handlers ([`twilio_view`])
//! - Twilio signature verification
//! - Coercion of TwiML replies into `application/xml` responses
//! - The demo server's handlers and router

pub mod guard;
pub mod handlers;
pub mod reply;
pub mod request;
pub mod signature;

pub use guard::{twilio_route, twilio_view, CsrfExempt, TwilioGuard};
pub use handlers::{health, router, sms_reply, HealthResponse, InboundSms};
pub use reply::{coerce, TwimlReply, XML_CONTENT_TYPE};
pub use request::{extract_signature, form_params, reconstruct_url, SIGNATURE_HEADER};
pub use signature::RequestValidator;
