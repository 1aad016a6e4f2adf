//! Session creation response parsers.
//!
//! The session endpoint answers with a session descriptor in one of two
//! formats: the legacy XML document or JSON. Each format has its own parser
//! behind [`SessionDescriptorParser`]; [`parser_for`] picks one by sniffing
//! the body.
//!
//! Legacy XML:
//!
//! ```text
//! <sessions><Session><session_id>1_MX4...</session_id>...</Session></sessions>
//! <Errors><error code="-1"><notLoggedIn message="Invalid partner credentials"/></error></Errors>
//! ```
//!
//! JSON:
//!
//! ```text
//! [{"session_id": "1_MX4...", ...}]
//! {"code": -1, "message": "Invalid partner credentials"}
//! ```

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::Value;
use thiserror::Error;

/// The part of a session descriptor the SDK uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescriptor {
    pub session_id: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    /// The platform reported an error instead of a session.
    #[error("platform error (code={code}): {message}")]
    Platform { code: String, message: String },

    /// The body is not a well-formed document.
    #[error("malformed response: {0}")]
    Syntax(String),

    /// Well-formed, but no session ID in it.
    #[error("no session ID in response: {0}")]
    MissingSessionId(String),
}

/// Parses one session descriptor format.
pub trait SessionDescriptorParser: Send + Sync {
    fn parse(&self, body: &str) -> Result<SessionDescriptor, DescriptorError>;
}

/// Parser for the legacy XML format.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlSessionParser;

/// Parser for the JSON format.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSessionParser;

/// Choose a parser from the first non-whitespace character of `body`.
pub fn parser_for(body: &str) -> &'static dyn SessionDescriptorParser {
    match body.trim_start().chars().next() {
        Some('{') | Some('[') => &JsonSessionParser,
        _ => &XmlSessionParser,
    }
}

impl SessionDescriptorParser for XmlSessionParser {
    fn parse(&self, body: &str) -> Result<SessionDescriptor, DescriptorError> {
        let mut reader = Reader::from_str(body);
        reader.config_mut().trim_text(true);

        let mut in_session_id = false;
        let mut session_id: Option<String> = None;
        // (code, message) of the first <error> element
        let mut error: Option<(String, Option<String>)> = None;
        let mut in_error = false;
        let mut saw_root = false;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| DescriptorError::Syntax(e.to_string()))?;

            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    saw_root = true;
                    let is_empty = matches!(event, Event::Empty(_));
                    match e.name().as_ref() {
                        b"session_id" if session_id.is_none() => in_session_id = !is_empty,
                        b"error" if error.is_none() => {
                            let code = attribute(e, "code")?.unwrap_or_default();
                            let message = attribute(e, "message")?;
                            error = Some((code, message));
                            in_error = !is_empty;
                        }
                        _ if in_error => {
                            // The first child carrying a message wins
                            if let Some((_, message @ None)) = error.as_mut() {
                                *message = attribute(e, "message")?;
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(ref t) => {
                    if in_session_id {
                        let text = t
                            .unescape()
                            .map_err(|e| DescriptorError::Syntax(e.to_string()))?;
                        if !text.is_empty() {
                            session_id = Some(text.into_owned());
                        }
                    } else if in_error {
                        if let Some((_, message @ None)) = error.as_mut() {
                            let text = t
                                .unescape()
                                .map_err(|e| DescriptorError::Syntax(e.to_string()))?;
                            *message = Some(text.into_owned());
                        }
                    }
                }
                Event::End(ref e) => match e.name().as_ref() {
                    b"session_id" => in_session_id = false,
                    b"error" => in_error = false,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_root {
            return Err(DescriptorError::Syntax("no XML elements".to_string()));
        }

        if let Some((code, message)) = error {
            return Err(DescriptorError::Platform {
                code,
                message: message.unwrap_or_default(),
            });
        }

        session_id
            .map(|session_id| SessionDescriptor { session_id })
            .ok_or_else(|| DescriptorError::MissingSessionId("no <session_id> element".to_string()))
    }
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Result<Option<String>, DescriptorError> {
    let attr = element
        .try_get_attribute(name)
        .map_err(|e| DescriptorError::Syntax(e.to_string()))?;
    match attr {
        Some(attr) => attr
            .unescape_value()
            .map(|v| Some(v.into_owned()))
            .map_err(|e| DescriptorError::Syntax(e.to_string())),
        None => Ok(None),
    }
}

impl SessionDescriptorParser for JsonSessionParser {
    fn parse(&self, body: &str) -> Result<SessionDescriptor, DescriptorError> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| DescriptorError::Syntax(e.to_string()))?;

        let descriptor = match &value {
            Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
            other => other.clone(),
        };

        if let Some(session_id) = descriptor
            .get("session_id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        {
            return Ok(SessionDescriptor {
                session_id: session_id.to_string(),
            });
        }

        let error = descriptor.get("error").unwrap_or(&descriptor);
        if let Some(message) = error.get("message").and_then(Value::as_str) {
            let code = match error.get("code") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => String::new(),
            };
            return Err(DescriptorError::Platform {
                code,
                message: message.to_string(),
            });
        }

        Err(DescriptorError::MissingSessionId(
            "no session_id field".to_string(),
        ))
    }
}
