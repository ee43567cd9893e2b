//! Twilio Guard - signature-verifying wrapper for inbound Twilio webhooks.
//!
//! This library wraps ordinary axum handlers so that they:
//! - Only accept POST requests
//! - Only run for requests signed by Twilio (HMAC-SHA1 over URL and form)
//! - May return TwiML as text or as a [`Twiml`] document
//!
//! ## Request Flow
//!
//! ```text
//! Request → method check → URL rebuild → signature check → handler → TwiML response
//! ```

pub mod config;
pub mod error;
pub mod twiml;
pub mod web;

// Re-export commonly used types
pub use config::{ConfigError, GuardConfig};
pub use error::GuardError;
pub use twiml::{Twiml, Verb};
pub use web::{coerce, twilio_route, twilio_view, RequestValidator, TwilioGuard, TwimlReply};
