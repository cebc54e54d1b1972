//! Frames clients may send over the realtime transport.
//!
//! Only `typing` is handled here; messages go through the HTTP send path.
//!
//! ```json
//! {"type": "typing", "chat_partner_id": 2, "is_typing": true}
//! ```

use serde::Deserialize;

use crate::domain::foundation::UserId;

use super::errors::DeliveryError;

/// A decoded client frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    Typing {
        chat_partner_id: UserId,
        is_typing: bool,
    },
    /// Well-formed frame of a type this subsystem does not handle.
    Unsupported(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct TypingFrame {
    chat_partner_id: i64,
    #[serde(default = "default_is_typing")]
    is_typing: bool,
}

fn default_is_typing() -> bool {
    true
}

impl ClientFrame {
    /// Decode a text frame.
    pub fn parse(text: &str) -> Result<Self, DeliveryError> {
        let envelope: Envelope = serde_json::from_str(text)
            .map_err(|e| DeliveryError::invalid_request(format!("Malformed frame: {}", e)))?;

        match envelope.kind.as_str() {
            "typing" => {
                let frame: TypingFrame = serde_json::from_str(text).map_err(|e| {
                    DeliveryError::invalid_request(format!("Malformed typing frame: {}", e))
                })?;
                Ok(ClientFrame::Typing {
                    chat_partner_id: UserId::new(frame.chat_partner_id)?,
                    is_typing: frame.is_typing,
                })
            }
            _ => Ok(ClientFrame::Unsupported(envelope.kind)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_frame_parses() {
        let frame =
            ClientFrame::parse(r#"{"type":"typing","chat_partner_id":2,"is_typing":false}"#)
                .unwrap();

        assert_eq!(
            frame,
            ClientFrame::Typing {
                chat_partner_id: UserId::new(2).unwrap(),
                is_typing: false,
            }
        );
    }

    #[test]
    fn is_typing_defaults_to_true() {
        let frame = ClientFrame::parse(r#"{"type":"typing","chat_partner_id":2}"#).unwrap();

        assert!(matches!(frame, ClientFrame::Typing { is_typing: true, .. }));
    }

    #[test]
    fn unknown_type_is_unsupported() {
        let frame = ClientFrame::parse(r#"{"type":"message","content":"hi"}"#).unwrap();

        assert_eq!(frame, ClientFrame::Unsupported("message".to_string()));
    }

    #[test]
    fn malformed_json_is_invalid_request() {
        assert!(matches!(
            ClientFrame::parse("{not json"),
            Err(DeliveryError::InvalidRequest(_))
        ));
    }

    #[test]
    fn typing_without_partner_is_invalid_request() {
        assert!(matches!(
            ClientFrame::parse(r#"{"type":"typing"}"#),
            Err(DeliveryError::InvalidRequest(_))
        ));
    }

    #[test]
    fn non_positive_partner_is_invalid_request() {
        assert!(matches!(
            ClientFrame::parse(r#"{"type":"typing","chat_partner_id":0}"#),
            Err(DeliveryError::InvalidRequest(_))
        ));
    }
}
