//! Type definitions for TwiML documents.

/// A single TwiML verb nested under the root `<Response>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    /// Reply with a message. `to`/`from` default to the inbound pair.
    Message {
        body: String,
        to: Option<String>,
        from: Option<String>,
    },
    /// Legacy SMS verb, kept for older messaging endpoints.
    Sms(String),
    /// Speak text to a caller.
    Say { text: String, voice: Option<String> },
    /// Play an audio file.
    Play(String),
    /// Hand control to another TwiML URL.
    Redirect { url: String, method: Option<String> },
    /// Wait silently, in seconds.
    Pause { length: Option<u32> },
    Hangup,
    Reject,
}

impl Verb {
    /// Element name as it appears in the XML.
    pub fn tag(&self) -> &'static str {
        match self {
            Verb::Message { .. } => "Message",
            Verb::Sms(_) => "Sms",
            Verb::Say { .. } => "Say",
            Verb::Play(_) => "Play",
            Verb::Redirect { .. } => "Redirect",
            Verb::Pause { .. } => "Pause",
            Verb::Hangup => "Hangup",
            Verb::Reject => "Reject",
        }
    }
}

/// Root TwiML document, built verb by verb.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Twiml {
    pub(crate) verbs: Vec<Verb>,
}

impl Twiml {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an arbitrary verb.
    pub fn verb(mut self, verb: Verb) -> Self {
        self.verbs.push(verb);
        self
    }

    pub fn message(self, body: impl Into<String>) -> Self {
        self.verb(Verb::Message {
            body: body.into(),
            to: None,
            from: None,
        })
    }

    /// Message addressed to an explicit number, optionally from a given sender.
    pub fn message_to(
        self,
        body: impl Into<String>,
        to: impl Into<String>,
        from: Option<String>,
    ) -> Self {
        self.verb(Verb::Message {
            body: body.into(),
            to: Some(to.into()),
            from,
        })
    }

    pub fn sms(self, body: impl Into<String>) -> Self {
        self.verb(Verb::Sms(body.into()))
    }

    pub fn say(self, text: impl Into<String>) -> Self {
        self.verb(Verb::Say {
            text: text.into(),
            voice: None,
        })
    }

    pub fn say_with_voice(self, text: impl Into<String>, voice: impl Into<String>) -> Self {
        self.verb(Verb::Say {
            text: text.into(),
            voice: Some(voice.into()),
        })
    }

    pub fn play(self, url: impl Into<String>) -> Self {
        self.verb(Verb::Play(url.into()))
    }

    pub fn redirect(self, url: impl Into<String>) -> Self {
        self.verb(Verb::Redirect {
            url: url.into(),
            method: None,
        })
    }

    pub fn redirect_with_method(self, url: impl Into<String>, method: impl Into<String>) -> Self {
        self.verb(Verb::Redirect {
            url: url.into(),
            method: Some(method.into()),
        })
    }

    pub fn pause(self, length: u32) -> Self {
        self.verb(Verb::Pause {
            length: Some(length),
        })
    }

    pub fn hangup(self) -> Self {
        self.verb(Verb::Hangup)
    }

    pub fn reject(self) -> Self {
        self.verb(Verb::Reject)
    }

    /// Verbs in document order.
    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }
}
