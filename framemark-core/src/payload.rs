//! Payload framing: `"<watermark text>|<auth code>"`.
//!
//! This is the only in-band format the crate guarantees byte for byte. The
//! watermark text may never contain the delimiter, which is enforced when
//! encoding, so a well-formed payload always has exactly one `|`.

use crate::auth::AuthCode;
use crate::error::{ParseError, PayloadError};

/// Separator between watermark text and auth code.
pub const DELIMITER: char = '|';

/// A decoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub text: String,
    pub auth_code: String,
}

/// Check that `text` can be framed unambiguously. Empty text frames fine.
pub fn validate_text(text: &str) -> Result<(), PayloadError> {
    if text.contains(DELIMITER) {
        return Err(PayloadError::DelimiterInText {
            delimiter: DELIMITER,
        });
    }
    Ok(())
}

/// Frame watermark text and auth code into a single payload string.
pub fn encode(text: &str, auth_code: &AuthCode) -> Result<String, PayloadError> {
    validate_text(text)?;

    let mut payload = String::with_capacity(text.len() + 1 + auth_code.len());
    payload.push_str(text);
    payload.push(DELIMITER);
    payload.push_str(auth_code.as_str());
    Ok(payload)
}

/// Split an extracted payload back into text and auth code.
pub fn decode(payload: &str) -> Result<Payload, ParseError> {
    let (text, auth_code) = payload.split_once(DELIMITER).ok_or(ParseError::Malformed {
        reason: "missing delimiter",
    })?;

    if auth_code.contains(DELIMITER) {
        return Err(ParseError::Malformed {
            reason: "more than one delimiter",
        });
    }

    Ok(Payload {
        text: text.to_string(),
        auth_code: auth_code.to_string(),
    })
}

/// Byte length of a payload carrying `text_len` bytes of text and an auth code
/// of `auth_len` hex characters. This is the length to ask a codec to extract.
pub const fn payload_len(text_len: usize, auth_len: usize) -> usize {
    text_len + 1 + auth_len
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthCodeGenerator, SecretKey};
    use crate::fingerprint::{Fingerprint, HashAlgorithm};

    fn code(hex: &str) -> AuthCode {
        // Route through the generator so tests only use codes it can produce.
        let gen = AuthCodeGenerator::new(SecretKey::new(b"k".to_vec()).unwrap());
        let fp = Fingerprint::from_hex(hex, HashAlgorithm::PHash).unwrap();
        gen.code_for_fingerprint(&fp, 16).unwrap()
    }

    #[test]
    fn test_encode_format() {
        let auth = code("0011223344556677");
        let payload = encode("MyWatermark", &auth).unwrap();
        assert_eq!(payload, format!("MyWatermark|{auth}"));
        assert_eq!(payload.len(), payload_len("MyWatermark".len(), 16));
    }

    #[test]
    fn test_roundtrip() {
        let auth = code("8899aabbccddeeff");
        for text in ["MyWatermark", "", "a", "with spaces and ünïcode", "trailing-"] {
            let decoded = decode(&encode(text, &auth).unwrap()).unwrap();
            assert_eq!(decoded.text, text);
            assert_eq!(decoded.auth_code, auth.as_str());
        }
    }

    #[test]
    fn test_encode_rejects_delimiter_in_text() {
        let auth = code("0011223344556677");
        assert_eq!(
            encode("My|Watermark", &auth),
            Err(PayloadError::DelimiterInText { delimiter: '|' })
        );
    }

    #[test]
    fn test_empty_text_frames_as_bare_auth_code() {
        let auth = code("0011223344556677");
        assert_eq!(encode("", &auth).unwrap(), format!("|{auth}"));
    }

    #[test]
    fn test_decode_missing_delimiter() {
        assert_eq!(
            decode("MyWatermarkabc123"),
            Err(ParseError::Malformed {
                reason: "missing delimiter"
            })
        );
    }

    #[test]
    fn test_decode_multiple_delimiters() {
        assert_eq!(
            decode("My|Watermark|abc123"),
            Err(ParseError::Malformed {
                reason: "more than one delimiter"
            })
        );
    }

    #[test]
    fn test_decode_allows_empty_segments() {
        let decoded = decode("|").unwrap();
        assert_eq!(decoded.text, "");
        assert_eq!(decoded.auth_code, "");
    }

    #[test]
    fn test_payload_len() {
        assert_eq!(payload_len(11, 16), 28);
        assert_eq!(payload_len(0, 1), 2);
    }
}
