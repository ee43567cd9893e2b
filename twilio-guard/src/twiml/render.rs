//! XML rendering for TwiML documents.

use std::fmt::{self, Display};

use super::types::{Twiml, Verb};

/// Declaration emitted ahead of every document.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

impl Twiml {
    /// Render the document to its wire form.
    pub fn to_xml(&self) -> String {
        self.to_string()
    }
}

impl Display for Twiml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(XML_DECLARATION)?;
        if self.verbs.is_empty() {
            return f.write_str("<Response />");
        }

        f.write_str("<Response>")?;
        for verb in &self.verbs {
            write_verb(f, verb)?;
        }
        f.write_str("</Response>")
    }
}

fn write_verb(f: &mut fmt::Formatter<'_>, verb: &Verb) -> fmt::Result {
    let tag = verb.tag();
    match verb {
        Verb::Message { body, to, from } => {
            let attrs = [("to", to.as_deref()), ("from", from.as_deref())];
            write_element(f, tag, &attrs, Some(body.as_str()))
        }
        Verb::Sms(body) => write_element(f, tag, &[], Some(body.as_str())),
        Verb::Say { text, voice } => {
            write_element(f, tag, &[("voice", voice.as_deref())], Some(text.as_str()))
        }
        Verb::Play(url) => write_element(f, tag, &[], Some(url.as_str())),
        Verb::Redirect { url, method } => {
            write_element(f, tag, &[("method", method.as_deref())], Some(url.as_str()))
        }
        Verb::Pause { length } => {
            let length = length.map(|l| l.to_string());
            write_element(f, tag, &[("length", length.as_deref())], None)
        }
        Verb::Hangup | Verb::Reject => write_element(f, tag, &[], None),
    }
}

fn write_element(
    f: &mut fmt::Formatter<'_>,
    tag: &str,
    attrs: &[(&str, Option<&str>)],
    text: Option<&str>,
) -> fmt::Result {
    write!(f, "<{tag}")?;
    for (name, value) in attrs {
        if let Some(value) = value {
            write!(f, " {name}=\"{}\"", escape(value))?;
        }
    }

    match text {
        Some(text) => write!(f, ">{}</{tag}>", escape(text)),
        None => f.write_str(" />"),
    }
}

/// Escape the five XML special characters.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_response() {
        assert_eq!(
            Twiml::new().to_xml(),
            format!("{XML_DECLARATION}<Response />")
        );
    }

    #[test]
    fn test_message_reply() {
        let doc = Twiml::new().message("Thanks for the SMS message!");
        assert_eq!(
            doc.to_xml(),
            format!("{XML_DECLARATION}<Response><Message>Thanks for the SMS message!</Message></Response>")
        );
    }

    #[test]
    fn test_verbs_keep_order_and_attributes() {
        let doc = Twiml::new()
            .say("Hello")
            .pause(2)
            .message_to("hi", "+15551234567", Some("+15557654321".to_string()))
            .hangup();

        assert_eq!(
            doc.to_xml(),
            format!(
                "{XML_DECLARATION}<Response><Say>Hello</Say><Pause length=\"2\" />\
                 <Message to=\"+15551234567\" from=\"+15557654321\">hi</Message>\
                 <Hangup /></Response>"
            )
        );
    }

    #[test]
    fn test_text_is_escaped() {
        let doc = Twiml::new()
            .sms("Tom & Jerry <3")
            .redirect("https://example.com/next?a=1&b=\"2\"");
        let xml = doc.to_xml();
        assert!(xml.contains("<Sms>Tom &amp; Jerry &lt;3</Sms>"));
        assert!(xml.contains("<Redirect>https://example.com/next?a=1&amp;b=&quot;2&quot;</Redirect>"));
    }

    #[test]
    fn test_call_verbs_render_with_attributes() {
        let doc = Twiml::new()
            .say_with_voice("Goodbye", "alice")
            .play("https://example.com/tone.mp3")
            .redirect_with_method("https://example.com/next", "GET")
            .reject();

        assert_eq!(
            doc.to_xml(),
            format!(
                "{XML_DECLARATION}<Response><Say voice=\"alice\">Goodbye</Say>\
                 <Play>https://example.com/tone.mp3</Play>\
                 <Redirect method=\"GET\">https://example.com/next</Redirect>\
                 <Reject /></Response>"
            )
        );
    }

    #[test]
    fn test_builder_tracks_verbs() {
        let empty = Twiml::new();
        assert!(empty.is_empty());

        let doc = empty.play("https://example.com/a.mp3").reject();
        assert!(!doc.is_empty());
        assert_eq!(
            doc.verbs(),
            &[
                Verb::Play("https://example.com/a.mp3".to_string()),
                Verb::Reject,
            ]
        );
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a'b"), "a&apos;b");
        assert_eq!(escape("plain"), "plain");
    }
}
