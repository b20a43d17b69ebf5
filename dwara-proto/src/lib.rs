//! Dwara wire protocol - pinpad write parsing and BLE constants
//!
//! A pinpad submission is a single GATT write: two UTF-8 tokens joined by a
//! `:` byte, `originator:payload`. There is no framing beyond the write
//! itself; the peripheral sees one complete buffer or nothing.

pub mod ble;

/// Longest write the pinpad accepts. Anything larger is dropped before it
/// is copied anywhere, to bound memory use on the device.
pub const MAX_WRITE_LEN: usize = 128;

/// Delimiter between the originator token and the command token.
pub const TOKEN_DELIMITER: u8 = b':';

/// A decoded pinpad write.
///
/// Produced per write and consumed immediately by the session state machine;
/// not retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingCommand {
    /// Identity claimed by the remote peer. Empty when the write carried no
    /// delimiter.
    pub who: String,
    /// The submitted payload, usually a numeric passcode.
    pub what: String,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty write")]
    Empty,
    #[error("write of {len} bytes exceeds the {MAX_WRITE_LEN}-byte limit")]
    TooLarge { len: usize },
    #[error("write is not valid UTF-8")]
    InvalidUtf8,
}

/// Split a raw write into `who` and `what` tokens.
///
/// A write without the delimiter is treated as payload-only with an empty
/// originator, so single-field submissions stay actionable.
pub fn parse(bytes: &[u8]) -> Result<IncomingCommand, ParseError> {
    if bytes.is_empty() {
        return Err(ParseError::Empty);
    }
    if bytes.len() > MAX_WRITE_LEN {
        return Err(ParseError::TooLarge { len: bytes.len() });
    }

    match bytes.iter().position(|&b| b == TOKEN_DELIMITER) {
        Some(pos) => Ok(IncomingCommand {
            who: token(&bytes[..pos])?,
            what: token(&bytes[pos + 1..])?,
        }),
        None => Ok(IncomingCommand {
            who: String::new(),
            what: token(bytes)?,
        }),
    }
}

fn token(bytes: &[u8]) -> Result<String, ParseError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| ParseError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_delimiter() {
        let cmd = parse(b"alice:123456").unwrap();
        assert_eq!(cmd.who, "alice");
        assert_eq!(cmd.what, "123456");

        // Only the first delimiter splits; the rest stays in the payload.
        let cmd = parse(b"alice:12:34").unwrap();
        assert_eq!(cmd.who, "alice");
        assert_eq!(cmd.what, "12:34");
    }

    #[test]
    fn delimiterless_write_is_payload_only() {
        // Permissive fallback carried over for compatibility: a lone token
        // is a payload with an unknown originator.
        let cmd = parse(b"123456").unwrap();
        assert_eq!(cmd.who, "");
        assert_eq!(cmd.what, "123456");
    }

    #[test]
    fn empty_tokens_are_allowed() {
        let cmd = parse(b":123456").unwrap();
        assert_eq!(cmd.who, "");
        assert_eq!(cmd.what, "123456");

        let cmd = parse(b"alice:").unwrap();
        assert_eq!(cmd.who, "alice");
        assert_eq!(cmd.what, "");
    }

    #[test]
    fn rejects_empty_write() {
        assert_eq!(parse(b"").unwrap_err(), ParseError::Empty);
    }

    #[test]
    fn rejects_oversized_write() {
        let big = vec![b'9'; MAX_WRITE_LEN + 1];
        assert_eq!(
            parse(&big).unwrap_err(),
            ParseError::TooLarge { len: MAX_WRITE_LEN + 1 }
        );

        // Exactly at the limit is fine.
        let ok = vec![b'9'; MAX_WRITE_LEN];
        assert!(parse(&ok).is_ok());
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert_eq!(parse(&[0x61, 0xff, 0xfe]).unwrap_err(), ParseError::InvalidUtf8);
        assert_eq!(parse(b"alice:\xff\xff").unwrap_err(), ParseError::InvalidUtf8);
    }
}
