//! A minimal [`Codec`] used by this crate's own integration tests
//! (`tests/`). Not part of the public wire contract for any real NameNode
//! dialect — it exists only to give the engine's tests a concrete,
//! deterministic framing to drive against, the way `semi-hsms-rs`'s test
//! modules build a throwaway in-memory SECS-II peer rather than talking to
//! real equipment.
//!
//! Frame layout: `[u32 frame_len][i64 msgno][u8 tag][payload]`, where
//! `frame_len` counts only the bytes after itself. `tag` values:
//!
//! | tag | meaning               | payload                          |
//! |-----|-----------------------|-----------------------------------|
//! | 0   | void                  | (none)                            |
//! | 1   | bool                  | 1 byte                            |
//! | 2   | i64                   | 8 bytes, big-endian                |
//! | 3   | object(kind)          | 1 kind byte, u32 len, bytes        |
//! | 4   | null-typed(kind)      | 1 kind byte                        |
//! | 5   | protocol exception    | u32 len + class, u32 len + message |

use crate::codec::{
    DeserializeOutcome, Invocation, ObjectKind, ProtocolException, Response, ResponseTag, ResponseValue, Value,
};
use crate::codec::Codec;

const LEN_PREFIX: usize = 4;

fn object_kind_to_byte(kind: ObjectKind) -> u8 {
    match kind {
        ObjectKind::BlockLocations => 0,
        ObjectKind::LocatedBlock => 1,
        ObjectKind::DirectoryListing => 2,
        ObjectKind::FileStatus => 3,
        ObjectKind::ContentSummary => 4,
        ObjectKind::DelegationToken => 5,
        ObjectKind::DatanodeReport => 6,
        ObjectKind::UpgradeProgress => 7,
        ObjectKind::ServerDefaults => 8,
        ObjectKind::FileLinkInfo => 9,
        ObjectKind::LinkTarget => 10,
        ObjectKind::Stats => 11,
    }
}

fn byte_to_object_kind(b: u8) -> Option<ObjectKind> {
    Some(match b {
        0 => ObjectKind::BlockLocations,
        1 => ObjectKind::LocatedBlock,
        2 => ObjectKind::DirectoryListing,
        3 => ObjectKind::FileStatus,
        4 => ObjectKind::ContentSummary,
        5 => ObjectKind::DelegationToken,
        6 => ObjectKind::DatanodeReport,
        7 => ObjectKind::UpgradeProgress,
        8 => ObjectKind::ServerDefaults,
        9 => ObjectKind::FileLinkInfo,
        10 => ObjectKind::LinkTarget,
        11 => ObjectKind::Stats,
        _ => return None,
    })
}

fn encode_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Unit => out.push(0),
        Value::Bool(b) => {
            out.push(1);
            out.push(*b as u8);
        }
        Value::I64(v) => {
            out.push(2);
            out.extend_from_slice(&v.to_be_bytes());
        }
        Value::U64(v) => {
            out.push(3);
            out.extend_from_slice(&v.to_be_bytes());
        }
        Value::Str(s) => {
            out.push(4);
            out.extend_from_slice(&(s.len() as u32).to_be_bytes());
            out.extend_from_slice(s.as_bytes());
        }
        Value::Bytes(b) => {
            out.push(5);
            out.extend_from_slice(&(b.len() as u32).to_be_bytes());
            out.extend_from_slice(b);
        }
        Value::StrList(items) => {
            out.push(6);
            out.extend_from_slice(&(items.len() as u32).to_be_bytes());
            for item in items {
                out.extend_from_slice(&(item.len() as u32).to_be_bytes());
                out.extend_from_slice(item.as_bytes());
            }
        }
    }
}

/// A `Codec` with a simple, self-consistent request/response framing. Its
/// `serialize` output is never parsed back by `deserialize` (that's the
/// *server's* job in a real deployment); this crate's tests instead use
/// [`encode_response`] directly to synthesize server replies.
pub struct StubCodec;

impl Codec for StubCodec {
    fn serialize(&self, invocation: &Invocation) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&invocation.msgno.to_be_bytes());
        body.extend_from_slice(&(invocation.name.len() as u16).to_be_bytes());
        body.extend_from_slice(invocation.name.as_bytes());
        for arg in &invocation.args {
            encode_value(&mut body, arg);
        }
        let mut frame = Vec::with_capacity(LEN_PREFIX + body.len());
        frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
        frame.extend_from_slice(&body);
        frame
    }

    fn deserialize(&self, bytes: &[u8]) -> DeserializeOutcome {
        if bytes.len() < LEN_PREFIX {
            return DeserializeOutcome::Incomplete;
        }
        let body_len = u32::from_be_bytes(bytes[0..4].try_into().unwrap()) as usize;
        let frame_size = LEN_PREFIX + body_len;
        if bytes.len() < frame_size {
            return DeserializeOutcome::Incomplete;
        }
        let body = &bytes[LEN_PREFIX..frame_size];
        if body.len() < 9 {
            return DeserializeOutcome::Invalid;
        }
        let msgno = i64::from_be_bytes(body[0..8].try_into().unwrap());
        let tag_byte = body[8];
        let rest = &body[9..];

        let parsed = match tag_byte {
            0 => Some((ResponseTag::Void, ResponseValue::Void)),
            1 => rest.first().map(|b| (ResponseTag::Bool, ResponseValue::Bool(*b != 0))),
            2 => {
                if rest.len() < 8 {
                    None
                } else {
                    let v = i64::from_be_bytes(rest[0..8].try_into().unwrap());
                    Some((ResponseTag::I64, ResponseValue::I64(v)))
                }
            }
            3 => {
                if rest.is_empty() || rest.len() < 5 {
                    None
                } else {
                    let kind = byte_to_object_kind(rest[0]);
                    let len = u32::from_be_bytes(rest[1..5].try_into().unwrap()) as usize;
                    match kind {
                        Some(kind) if rest.len() >= 5 + len => {
                            Some((ResponseTag::Object(kind), ResponseValue::Object(rest[5..5 + len].to_vec())))
                        }
                        _ => None,
                    }
                }
            }
            4 => rest
                .first()
                .and_then(|b| byte_to_object_kind(*b))
                .map(|kind| (ResponseTag::NullTyped(kind), ResponseValue::Null)),
            5 => parse_exception(rest),
            _ => None,
        };

        match parsed {
            Some((tag, value)) => {
                DeserializeOutcome::Parsed { msgno, response: Response { tag, value }, frame_size }
            }
            None => DeserializeOutcome::Invalid,
        }
    }

    fn build_auth_header(&self, username: &str) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(username.len() as u16).to_be_bytes());
        out.extend_from_slice(username.as_bytes());
        out
    }
}

fn parse_exception(rest: &[u8]) -> Option<(ResponseTag, ResponseValue)> {
    if rest.len() < 4 {
        return None;
    }
    let class_len = u32::from_be_bytes(rest[0..4].try_into().unwrap()) as usize;
    let after_class = 4 + class_len;
    if rest.len() < after_class + 4 {
        return None;
    }
    let class = String::from_utf8(rest[4..after_class].to_vec()).ok()?;
    let msg_len = u32::from_be_bytes(rest[after_class..after_class + 4].try_into().unwrap()) as usize;
    let msg_start = after_class + 4;
    if rest.len() < msg_start + msg_len {
        return None;
    }
    let message = String::from_utf8(rest[msg_start..msg_start + msg_len].to_vec()).ok()?;
    Some((ResponseTag::ProtocolException, ResponseValue::Exception(ProtocolException { class, message })))
}

/// Builds one complete wire frame for a synthetic server reply, in the
/// format [`StubCodec::deserialize`] expects. Used by integration tests to
/// act as the NameNode side of the connection.
pub fn encode_response(msgno: i64, tag: ResponseTag, value: &ResponseValue) -> Vec<u8> {
    let mut body = msgno.to_be_bytes().to_vec();
    match (tag, value) {
        (ResponseTag::Void, ResponseValue::Void) => body.push(0),
        (ResponseTag::Bool, ResponseValue::Bool(b)) => {
            body.push(1);
            body.push(*b as u8);
        }
        (ResponseTag::I64, ResponseValue::I64(v)) => {
            body.push(2);
            body.extend_from_slice(&v.to_be_bytes());
        }
        (ResponseTag::Object(kind), ResponseValue::Object(bytes)) => {
            body.push(3);
            body.push(object_kind_to_byte(kind));
            body.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
            body.extend_from_slice(bytes);
        }
        (ResponseTag::NullTyped(kind), ResponseValue::Null) => {
            body.push(4);
            body.push(object_kind_to_byte(kind));
        }
        (ResponseTag::ProtocolException, ResponseValue::Exception(e)) => {
            body.push(5);
            body.extend_from_slice(&(e.class.len() as u32).to_be_bytes());
            body.extend_from_slice(e.class.as_bytes());
            body.extend_from_slice(&(e.message.len() as u32).to_be_bytes());
            body.extend_from_slice(e.message.as_bytes());
        }
        _ => panic!("encode_response: tag/value mismatch"),
    }
    let mut frame = (body.len() as u32).to_be_bytes().to_vec();
    frame.extend_from_slice(&body);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_bool_response() {
        let codec = StubCodec;
        let frame = encode_response(5, ResponseTag::Bool, &ResponseValue::Bool(true));
        match codec.deserialize(&frame) {
            DeserializeOutcome::Parsed { msgno, response, frame_size } => {
                assert_eq!(msgno, 5);
                assert_eq!(frame_size, frame.len());
                assert!(matches!(response.tag, ResponseTag::Bool));
                assert!(matches!(response.value, ResponseValue::Bool(true)));
            }
            _ => panic!("expected Parsed"),
        }
    }

    #[test]
    fn reports_incomplete_on_partial_frame() {
        let codec = StubCodec;
        let frame = encode_response(1, ResponseTag::I64, &ResponseValue::I64(42));
        assert!(matches!(codec.deserialize(&frame[..frame.len() - 1]), DeserializeOutcome::Incomplete));
    }

    #[test]
    fn round_trips_an_object_response() {
        let codec = StubCodec;
        let payload = vec![1, 2, 3, 4];
        let frame = encode_response(9, ResponseTag::Object(ObjectKind::FileStatus), &ResponseValue::Object(payload.clone()));
        match codec.deserialize(&frame) {
            DeserializeOutcome::Parsed { response, .. } => {
                assert!(matches!(response.tag, ResponseTag::Object(ObjectKind::FileStatus)));
                match response.value {
                    ResponseValue::Object(bytes) => assert_eq!(bytes, payload),
                    _ => panic!("expected Object value"),
                }
            }
            _ => panic!("expected Parsed"),
        }
    }

    #[test]
    fn round_trips_a_protocol_exception() {
        let codec = StubCodec;
        let exc = ProtocolException { class: "java.io.FileNotFoundException".into(), message: "/x missing".into() };
        let frame = encode_response(2, ResponseTag::ProtocolException, &ResponseValue::Exception(exc.clone()));
        match codec.deserialize(&frame) {
            DeserializeOutcome::Parsed { response, .. } => match response.value {
                ResponseValue::Exception(got) => assert_eq!(got, exc),
                _ => panic!("expected Exception value"),
            },
            _ => panic!("expected Parsed"),
        }
    }
}
