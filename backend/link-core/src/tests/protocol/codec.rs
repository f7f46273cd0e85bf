use crate::error::link::LinkError;
use crate::protocol::{
    PeerStatus, STATUS_ERROR, STATUS_OK, TYPE_ARRAY, TYPE_BOOL, TYPE_CHAR, TYPE_DOUBLE, TYPE_INT,
    TYPE_STRING, put_int, put_string, put_value, read_bytes, read_status, read_string, read_value,
};

use models::VarValue;

const MAX: usize = 1024;

fn prefixed(declared: i32, body: &[u8]) -> Vec<u8> {
    let mut bytes = declared.to_le_bytes().to_vec();
    bytes.extend_from_slice(body);
    bytes
}

/// **VALUE**: Pins the string encoding to a little-endian byte-length prefix followed by UTF-8.
///
/// **WHY THIS MATTERS**: The peer decodes the prefix as a 4-byte little-endian word counting
/// bytes, not characters. Any other layout desynchronizes the stream on the first message.
///
/// **BUG THIS CATCHES**: Would catch a big-endian prefix, or a prefix counting chars instead
/// of bytes for non-ASCII text.
#[test]
fn given_non_ascii_string_when_put_string_then_prefix_counts_utf8_bytes_little_endian() {
    // GIVEN: A string with a two-byte UTF-8 character
    let mut buf = Vec::new();

    // WHEN: Encoding it
    put_string(&mut buf, "hé").unwrap();

    // THEN: Length is 3 bytes, little-endian, followed by the raw UTF-8
    assert_eq!(buf, vec![3, 0, 0, 0, b'h', 0xC3, 0xA9]);
}

/// **VALUE**: Verifies fixed-width values are written little-endian at their exact width.
///
/// **WHY THIS MATTERS**: The peer reads exactly as many bytes as the type tag declares.
///
/// **BUG THIS CATCHES**: Would catch a char written as UTF-8, a bool written as an int,
/// or a double written big-endian.
#[test]
fn given_fixed_width_values_when_put_value_then_writes_exact_little_endian_bytes() {
    // GIVEN/WHEN: Encoding one value of several fixed-width kinds
    let mut int = Vec::new();
    put_value(&mut int, &VarValue::Int(-2)).unwrap();

    let mut short = Vec::new();
    put_value(&mut short, &VarValue::Short(0x0102)).unwrap();

    let mut ch = Vec::new();
    put_value(&mut ch, &VarValue::Char('é')).unwrap();

    let mut flag = Vec::new();
    put_value(&mut flag, &VarValue::Bool(true)).unwrap();

    let mut double = Vec::new();
    put_value(&mut double, &VarValue::Double(1.5)).unwrap();

    // THEN: Each matches its wire representation
    assert_eq!(int, vec![0xFE, 0xFF, 0xFF, 0xFF]);
    assert_eq!(short, vec![0x02, 0x01]);
    assert_eq!(ch, vec![0xE9, 0x00]);
    assert_eq!(flag, vec![1]);
    assert_eq!(double, 1.5f64.to_le_bytes().to_vec());
}

/// **VALUE**: Characters outside the Basic Multilingual Plane are refused before encoding.
///
/// **WHY THIS MATTERS**: The peer's character is one 16-bit unit. Writing half a surrogate
/// pair would silently corrupt the value.
///
/// **BUG THIS CATCHES**: Would catch truncating the UTF-16 encoding to its first unit.
#[test]
fn given_astral_char_when_put_value_then_returns_validation_error() {
    // GIVEN: A character that needs a surrogate pair
    let mut buf = Vec::new();

    // WHEN: Encoding it
    let result = put_value(&mut buf, &VarValue::Char('😀'));

    // THEN: Validation error, nothing written
    assert!(matches!(result, Err(LinkError::Validation { .. })));
    assert!(buf.is_empty());
}

/// **VALUE**: A length prefix above the configured maximum is rejected as an I/O error.
///
/// **WHY THIS MATTERS**: A corrupt or hostile peer could declare a 2 GiB string. The client
/// must refuse before allocating anything.
///
/// **BUG THIS CATCHES**: Would catch allocating `vec![0; len]` before checking `len`.
#[tokio::test]
async fn given_length_above_max_when_read_string_then_returns_io_error() {
    // GIVEN: A prefix declaring MAX + 1 bytes and no body
    let bytes = prefixed(MAX as i32 + 1, &[]);
    let mut reader: &[u8] = &bytes;

    // WHEN: Reading a string
    let result = read_string(&mut reader, MAX).await;

    // THEN: Io error mentioning the limit
    match result {
        Err(LinkError::Io { message, .. }) => assert!(message.contains("exceeds maximum")),
        other => panic!("Expected Io error, got {other:?}"),
    }
}

/// **VALUE**: Negative length prefixes are rejected as I/O errors.
///
/// **WHY THIS MATTERS**: Casting a negative i32 to usize yields an enormous allocation.
///
/// **BUG THIS CATCHES**: Would catch `declared as usize` in place of a checked conversion.
#[tokio::test]
async fn given_negative_length_when_read_string_then_returns_io_error() {
    // GIVEN: A prefix of -1
    let bytes = (-1i32).to_le_bytes();
    let mut reader: &[u8] = &bytes;

    // WHEN: Reading a string
    let result = read_string(&mut reader, MAX).await;

    // THEN: Io error
    match result {
        Err(LinkError::Io { message, .. }) => assert!(message.contains("Negative")),
        other => panic!("Expected Io error, got {other:?}"),
    }
}

/// **VALUE**: A stream that ends mid-payload surfaces as an I/O error.
///
/// **BUG THIS CATCHES**: Would catch returning a truncated string on EOF.
#[tokio::test]
async fn given_truncated_payload_when_read_string_then_returns_io_error() {
    // GIVEN: A prefix declaring 5 bytes but only 2 present
    let bytes = prefixed(5, b"ab");
    let mut reader: &[u8] = &bytes;

    // WHEN: Reading a string
    let result = read_string(&mut reader, MAX).await;

    // THEN: Io error naming the closed connection
    match result {
        Err(LinkError::Io { message, .. }) => assert!(message.contains("Connection closed")),
        other => panic!("Expected Io error, got {other:?}"),
    }
}

#[tokio::test]
async fn given_invalid_utf8_when_read_string_then_returns_protocol_error() {
    // GIVEN: Two bytes that are not UTF-8
    let bytes = prefixed(2, &[0xFF, 0xFE]);
    let mut reader: &[u8] = &bytes;

    // WHEN/THEN: Protocol error
    let result = read_string(&mut reader, MAX).await;
    assert!(matches!(result, Err(LinkError::Protocol { .. })));
}

/// **VALUE**: The array tag and unknown tags are protocol violations.
///
/// **WHY THIS MATTERS**: The value width depends on the tag. Guessing would desynchronize
/// every following frame.
///
/// **BUG THIS CATCHES**: Would catch treating tag 0 (reserved for arrays) as an int.
#[tokio::test]
async fn given_unsupported_tags_when_read_value_then_returns_protocol_error() {
    for tag in [TYPE_ARRAY, 10, 42, -7] {
        // GIVEN: Some trailing bytes that must not be consumed as a value
        let bytes = [0u8; 8];
        let mut reader: &[u8] = &bytes;

        // WHEN: Decoding with an unsupported tag
        let result = read_value(&mut reader, tag, MAX).await;

        // THEN: Protocol error, and the payload was left untouched
        assert!(
            matches!(result, Err(LinkError::Protocol { .. })),
            "tag {tag} should be rejected"
        );
        assert_eq!(reader.len(), 8);
    }
}

#[tokio::test]
async fn given_bool_byte_other_than_zero_or_one_when_read_value_then_returns_protocol_error() {
    // GIVEN: A bool payload of 2
    let bytes = [2u8];
    let mut reader: &[u8] = &bytes;

    // WHEN/THEN: Protocol error
    let result = read_value(&mut reader, TYPE_BOOL, MAX).await;
    assert!(matches!(result, Err(LinkError::Protocol { .. })));
}

#[tokio::test]
async fn given_lone_surrogate_when_read_char_then_returns_protocol_error() {
    // GIVEN: A high surrogate with no partner
    let bytes = 0xD800u16.to_le_bytes();
    let mut reader: &[u8] = &bytes;

    // WHEN/THEN: Protocol error
    let result = read_value(&mut reader, TYPE_CHAR, MAX).await;
    assert!(matches!(result, Err(LinkError::Protocol { .. })));
}

/// **VALUE**: Decoding reads exactly the declared width and leaves the rest of the stream.
///
/// **WHY THIS MATTERS**: The connection is a single byte stream. Over-reading one value eats
/// the start of the next reply.
///
/// **BUG THIS CATCHES**: Would catch reading a double as 4 bytes or an int as 8.
#[tokio::test]
async fn given_values_back_to_back_when_read_value_then_each_consumes_exact_width() {
    // GIVEN: An int, a double and a string concatenated
    let mut bytes = Vec::new();
    put_int(&mut bytes, 7);
    bytes.extend_from_slice(&2.25f64.to_le_bytes());
    put_string(&mut bytes, "ok").unwrap();
    let mut reader: &[u8] = &bytes;

    // WHEN: Reading them in order
    let int = read_value(&mut reader, TYPE_INT, MAX).await.unwrap();
    let double = read_value(&mut reader, TYPE_DOUBLE, MAX).await.unwrap();
    let string = read_value(&mut reader, TYPE_STRING, MAX).await.unwrap();

    // THEN: Each value decodes and the stream is fully consumed
    assert_eq!(int, VarValue::Int(7));
    assert_eq!(double, VarValue::Double(2.25));
    assert_eq!(string, VarValue::String("ok".to_string()));
    assert!(reader.is_empty());
}

#[tokio::test]
async fn given_status_frames_when_read_status_then_decodes_ok_failed_and_rejects_unknown() {
    // GIVEN: OK, ERROR with message, and an unknown status
    let ok = STATUS_OK.to_le_bytes();
    let mut failed = STATUS_ERROR.to_le_bytes().to_vec();
    put_string(&mut failed, "boom").unwrap();
    let unknown = 9i32.to_le_bytes();

    // WHEN: Decoding each
    let ok = read_status(&mut &ok[..], MAX).await.unwrap();
    let failed = read_status(&mut &failed[..], MAX).await.unwrap();
    let unknown = read_status(&mut &unknown[..], MAX).await;

    // THEN: OK, Failed("boom"), Protocol error
    assert_eq!(ok, PeerStatus::Ok);
    assert_eq!(failed, PeerStatus::Failed("boom".to_string()));
    assert!(matches!(unknown, Err(LinkError::Protocol { .. })));
}

/// **VALUE**: A caller asking for more than the limit is told so without any read.
///
/// **BUG THIS CATCHES**: Would catch an unchecked `vec![0; size]` for caller-chosen sizes.
#[tokio::test]
async fn given_size_above_max_when_read_bytes_then_returns_validation_error() {
    // GIVEN: Plenty of bytes available
    let bytes = [0u8; 16];
    let mut reader: &[u8] = &bytes;

    // WHEN: Requesting more than the maximum
    let result = read_bytes(&mut reader, 17, 16).await;

    // THEN: Validation error, nothing consumed
    assert!(matches!(result, Err(LinkError::Validation { .. })));
    assert_eq!(reader.len(), 16);
}

#[tokio::test]
async fn given_short_stream_when_read_bytes_then_returns_io_error() {
    // GIVEN: Only 3 bytes available
    let bytes = [1u8, 2, 3];
    let mut reader: &[u8] = &bytes;

    // WHEN/THEN: Asking for 4 is an Io error
    let result = read_bytes(&mut reader, 4, MAX).await;
    assert!(matches!(result, Err(LinkError::Io { .. })));
}

/// **VALUE**: A negative string length inside a GET reply is a malformed reply.
///
/// **WHY THIS MATTERS**: `get_var` reports bad replies as protocol failures. Only a raw
/// `read_message` treats a bad prefix as a stream failure.
///
/// **BUG THIS CATCHES**: Would catch the value decoder reusing the raw string reader and
/// surfacing an `Io` error for a reply the peer got wrong.
#[tokio::test]
async fn given_negative_length_in_string_value_when_read_value_then_returns_protocol_error() {
    // GIVEN: The body of a string value whose prefix is -1
    let bytes = (-1i32).to_le_bytes();
    let mut reader: &[u8] = &bytes;

    // WHEN: Decoding it as a string value
    let result = read_value(&mut reader, TYPE_STRING, MAX).await;

    // THEN: Protocol error naming the bad prefix
    match result {
        Err(LinkError::Protocol { message, .. }) => assert!(message.contains("Negative")),
        other => panic!("Expected Protocol error, got {other:?}"),
    }
}

#[tokio::test]
async fn given_oversized_failure_message_when_read_status_then_returns_protocol_error() {
    // GIVEN: An error status whose message declares more than the limit
    let mut bytes = STATUS_ERROR.to_le_bytes().to_vec();
    bytes.extend_from_slice(&prefixed(MAX as i32 + 1, &[]));
    let mut reader: &[u8] = &bytes;

    // WHEN: Reading the acknowledgement
    let result = read_status(&mut reader, MAX).await;

    // THEN: Protocol error, not a stream failure
    match result {
        Err(LinkError::Protocol { message, .. }) => assert!(message.contains("exceeds maximum")),
        other => panic!("Expected Protocol error, got {other:?}"),
    }
}
