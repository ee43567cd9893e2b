//! Coercion of handler results into HTTP responses.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::twiml::Twiml;

/// Content type for TwiML replies.
pub const XML_CONTENT_TYPE: &str = "application/xml";

/// What a wrapped handler may hand back to Twilio.
#[derive(Debug)]
pub enum TwimlReply {
    /// TwiML already rendered to text; sent as is, never re-parsed.
    Text(String),
    /// Structured markup, rendered on the way out.
    Markup(Twiml),
    /// A finished response, passed through untouched.
    Response(Response),
}

/// Turn a handler result into the response sent back to Twilio.
///
/// Text and markup become `200 application/xml`; a prepared response is
/// returned exactly as built.
pub fn coerce(reply: TwimlReply) -> Response {
    match reply {
        TwimlReply::Text(text) => xml_response(text),
        TwimlReply::Markup(doc) => xml_response(doc.to_xml()),
        TwimlReply::Response(response) => response,
    }
}

fn xml_response(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, HeaderValue::from_static(XML_CONTENT_TYPE))],
        body,
    )
        .into_response()
}

impl IntoResponse for TwimlReply {
    fn into_response(self) -> Response {
        coerce(self)
    }
}

impl From<String> for TwimlReply {
    fn from(text: String) -> Self {
        TwimlReply::Text(text)
    }
}

impl From<&str> for TwimlReply {
    fn from(text: &str) -> Self {
        TwimlReply::Text(text.to_string())
    }
}

impl From<Twiml> for TwimlReply {
    fn from(doc: Twiml) -> Self {
        TwimlReply::Markup(doc)
    }
}

impl From<Response> for TwimlReply {
    fn from(response: Response) -> Self {
        TwimlReply::Response(response)
    }
}

/// A failing handler's error is rendered by its own `IntoResponse`, untouched.
impl<T, E> From<Result<T, E>> for TwimlReply
where
    T: Into<TwimlReply>,
    E: IntoResponse,
{
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(reply) => reply.into(),
            Err(err) => TwimlReply::Response(err.into_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_text_reply_is_xml_and_unchanged() {
        let text = "<Response><Sms>hi</Sms></Response>";
        let response = coerce(TwimlReply::from(text));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            XML_CONTENT_TYPE
        );
        assert_eq!(body_text(response).await, text);
    }

    #[tokio::test]
    async fn test_markup_reply_is_rendered() {
        let doc = Twiml::new().message("pong");
        let expected = doc.to_xml();
        let response = coerce(doc.into());

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            XML_CONTENT_TYPE
        );
        assert_eq!(body_text(response).await, expected);
    }

    #[tokio::test]
    async fn test_prebuilt_response_passes_through() {
        let prebuilt = (
            StatusCode::ACCEPTED,
            [("X-Custom", "kept")],
            "custom body",
        )
            .into_response();
        let response = coerce(TwimlReply::from(prebuilt));

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers().get("X-Custom").unwrap(), "kept");
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(body_text(response).await, "custom body");
    }

    #[tokio::test]
    async fn test_handler_error_is_not_rewritten() {
        let failed: Result<Twiml, (StatusCode, &str)> =
            Err((StatusCode::INTERNAL_SERVER_ERROR, "boom"));
        let response = coerce(failed.into());

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "boom");
    }
}
