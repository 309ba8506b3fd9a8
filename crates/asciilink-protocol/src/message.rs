use bytes::{BufMut, BytesMut};

use crate::device_error::describe_device_error;
use crate::error::{ProtocolError, Result};

/// Every message and reply ends with carriage return, line feed.
pub const TERMINATOR: &[u8] = b"\r\n";

/// Replaces the echoed tag when the device rejects a request.
pub const ERROR_MARKER: &str = "E:";

/// Encode a request into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────────────────────┬──────────┐
/// │ Tag      │ Payload fragments        │ CR LF    │
/// │ "i:76"   │ (concatenated, no gaps)  │ 0D 0A    │
/// └──────────┴──────────────────────────┴──────────┘
/// ```
pub fn encode_message(tag: &str, payload: &[&str], dst: &mut BytesMut) -> Result<()> {
    for part in std::iter::once(&tag).chain(payload) {
        if !part.is_ascii() || part.contains(['\r', '\n']) {
            return Err(ProtocolError::InvalidEncoding(part.to_string()));
        }
    }

    let len = tag.len() + payload.iter().map(|p| p.len()).sum::<usize>() + TERMINATOR.len();
    dst.reserve(len);
    dst.put_slice(tag.as_bytes());
    for part in payload {
        dst.put_slice(part.as_bytes());
    }
    dst.put_slice(TERMINATOR);
    Ok(())
}

/// Check a terminator-stripped reply against the tag that was sent and
/// split its payload into whitespace-separated tokens.
///
/// 1. `E:<code>` fails with [`ProtocolError::DeviceError`], `code` being
///    everything after the marker.
/// 2. A reply that does not start with `expected_tag` fails with
///    [`ProtocolError::HeaderMismatch`].
/// 3. Otherwise the tokens after the tag are returned, possibly none.
pub fn parse_response(raw: &str, expected_tag: &str) -> Result<Vec<String>> {
    if let Some(code) = raw.strip_prefix(ERROR_MARKER) {
        return Err(ProtocolError::DeviceError {
            code: code.to_string(),
            message: describe_device_error(code),
        });
    }

    let Some(rest) = raw.strip_prefix(expected_tag) else {
        return Err(ProtocolError::HeaderMismatch {
            received: raw.to_string(),
            expected: expected_tag.to_string(),
        });
    };

    Ok(rest.split_ascii_whitespace().map(str::to_string).collect())
}

/// Strip the terminator from a line returned by `read_until` and check it
/// is ASCII.
pub(crate) fn decode_line(line: &[u8]) -> Result<&str> {
    let body = line.strip_suffix(TERMINATOR).unwrap_or(line);
    match std::str::from_utf8(body) {
        Ok(text) if text.is_ascii() => Ok(text),
        _ => Err(ProtocolError::InvalidEncoding(
            String::from_utf8_lossy(body).into_owned(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_tag_payload_terminator() {
        let mut buf = BytesMut::new();
        encode_message("R:", &["000500"], &mut buf).unwrap();
        assert_eq!(buf.as_ref(), b"R:000500\r\n");

        buf.clear();
        encode_message("s:21", &["1", "0001000"], &mut buf).unwrap();
        assert_eq!(buf.as_ref(), b"s:210001000\r\n");
    }

    #[test]
    fn encodes_bare_tag() {
        let mut buf = BytesMut::new();
        encode_message("C:", &[], &mut buf).unwrap();
        assert_eq!(buf.as_ref(), b"C:\r\n");
    }

    #[test]
    fn rejects_embedded_terminator_and_non_ascii() {
        let mut buf = BytesMut::new();
        assert!(matches!(
            encode_message("P:", &["12\r\n34"], &mut buf),
            Err(ProtocolError::InvalidEncoding(_))
        ));
        assert!(matches!(
            encode_message("P:", &["12°"], &mut buf),
            Err(ProtocolError::InvalidEncoding(_))
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn parses_echoed_tag() {
        assert_eq!(parse_response("R:001234", "R:").unwrap(), vec!["001234"]);
    }

    #[test]
    fn parses_empty_payload() {
        assert!(parse_response("C:", "C:").unwrap().is_empty());
        assert!(parse_response("C:   ", "C:").unwrap().is_empty());
    }

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(
            parse_response("i:83 VAT  590 ", "i:83").unwrap(),
            vec!["VAT", "590"]
        );
    }

    #[test]
    fn rejects_foreign_header() {
        let err = parse_response("X:001234", "R:").unwrap_err();
        match err {
            ProtocolError::HeaderMismatch { received, expected } => {
                assert_eq!(received, "X:001234");
                assert_eq!(expected, "R:");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn header_check_uses_whole_tag() {
        let err = parse_response("i:31000", "i:30").unwrap_err();
        assert!(matches!(err, ProtocolError::HeaderMismatch { .. }));
    }

    #[test]
    fn device_error_keeps_code_verbatim() {
        let err = parse_response("E:000001:", "R:").unwrap_err();
        match err {
            ProtocolError::DeviceError { code, message } => {
                assert_eq!(code, "000001:");
                assert_eq!(message, Some("Parity error"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_device_error_is_opaque() {
        let err = parse_response("E:123456:", "P:").unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::DeviceError { ref code, message: None } if code == "123456:"
        ));
        assert_eq!(err.to_string(), "device error 123456:: unknown error code");
    }

    #[test]
    fn decode_line_strips_terminator() {
        assert_eq!(decode_line(b"A:000100\r\n").unwrap(), "A:000100");
        assert_eq!(decode_line(b"\r\n").unwrap(), "");
        assert!(matches!(
            decode_line(b"A:\xff\r\n"),
            Err(ProtocolError::InvalidEncoding(_))
        ));
    }
}
