//! TwiML markup: the XML documents Twilio expects back from a webhook.

pub mod render;
pub mod types;

pub use render::{escape, XML_DECLARATION};
pub use types::{Twiml, Verb};
