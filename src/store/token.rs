//! Store tokens and their length-prefixed MessagePack framing.
//!
//! Framing: `[4 bytes: payload length, big-endian u32][N bytes: MessagePack payload]`
//!
//! Each payload is one [`Token`], a map `{kind, value}`. A store file is a
//! flat sequence of tokens; the grammar lives in `snapshot_codec` and
//! `store_codec`.

use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use tokio_util::codec::{Decoder, Encoder};

use super::StoreError;

/// Maximum token payload size (64 MiB).
pub const MAX_TOKEN_SIZE: usize = 64 * 1024 * 1024;

/// Reserved framing markers. Never used as data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Sentinel {
    #[serde(rename = "cliptk/file-header")]
    FileHeader,
    #[serde(rename = "cliptk/file-footer")]
    FileFooter,
    #[serde(rename = "cliptk/snapshot")]
    HasContent,
    #[serde(rename = "cliptk/empty-snapshot")]
    NoContent,
}

/// One framed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Token {
    Sentinel(Sentinel),
    Str(String),
    Int(i64),
    Bytes(#[serde(with = "serde_bytes")] Vec<u8>),
    Opaque(serde_json::Value),
}

impl Token {
    /// Human-readable shape, used in `MalformedField` errors.
    pub fn describe(&self) -> String {
        match self {
            Token::Sentinel(s) => format!("sentinel {s:?}"),
            Token::Str(_) => "string".to_string(),
            Token::Int(v) => format!("integer {v}"),
            Token::Bytes(b) => format!("byte sequence ({} bytes)", b.len()),
            Token::Opaque(_) => "opaque value".to_string(),
        }
    }
}

/// Length-prefixed MessagePack codec for [`Token`]s.
///
/// Enforces [`MAX_TOKEN_SIZE`] in both directions.
#[derive(Debug, Default)]
pub struct TokenCodec {
    /// Length of the current frame being read, if the header has been consumed.
    pending_len: Option<usize>,
}

impl TokenCodec {
    pub fn new() -> Self {
        Self { pending_len: None }
    }
}

impl Decoder for TokenCodec {
    type Item = Token;
    type Error = StoreError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let payload_len = match self.pending_len {
            Some(len) => len,
            None => {
                if src.len() < 4 {
                    return Ok(None);
                }
                let len = src.get_u32() as usize;
                if len > MAX_TOKEN_SIZE {
                    return Err(StoreError::TokenTooLarge(len));
                }
                self.pending_len = Some(len);
                len
            }
        };

        if src.len() < payload_len {
            src.reserve(payload_len - src.len());
            return Ok(None);
        }

        let payload = src.split_to(payload_len);
        self.pending_len = None;

        let token: Token = rmp_serde::from_slice(&payload)?;
        Ok(Some(token))
    }
}

impl Encoder<Token> for TokenCodec {
    type Error = StoreError;

    fn encode(&mut self, item: Token, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = rmp_serde::to_vec_named(&item)?;
        if payload.len() > MAX_TOKEN_SIZE {
            return Err(StoreError::TokenTooLarge(payload.len()));
        }
        dst.reserve(4 + payload.len());
        dst.put_u32(payload.len() as u32);
        dst.extend_from_slice(&payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode(token: Token) -> BytesMut {
        let mut buf = BytesMut::new();
        TokenCodec::new().encode(token, &mut buf).unwrap();
        buf
    }

    #[test]
    fn sentinel_through_codec() {
        let mut buf = encode(Token::Sentinel(Sentinel::FileHeader));
        let decoded = TokenCodec::new().decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, Token::Sentinel(Sentinel::FileHeader));
        assert!(buf.is_empty());
    }

    #[test]
    fn negative_integer_survives() {
        let mut buf = encode(Token::Int(-42));
        let decoded = TokenCodec::new().decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, Token::Int(-42));
    }

    #[test]
    fn binary_content_fidelity() {
        let content: Vec<u8> = (0..=255).collect();
        let mut buf = encode(Token::Bytes(content.clone()));
        match TokenCodec::new().decode(&mut buf).unwrap().unwrap() {
            Token::Bytes(decoded) => assert_eq!(decoded, content),
            other => panic!("wrong token: {other:?}"),
        }
    }

    #[test]
    fn opaque_tree_survives() {
        let value = json!({"files": ["/a", "/b"], "count": 2, "ok": true, "ratio": 0.5});
        let mut buf = encode(Token::Opaque(value.clone()));
        let decoded = TokenCodec::new().decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, Token::Opaque(value));
    }

    #[test]
    fn string_and_sentinel_are_distinct_kinds() {
        let mut buf = encode(Token::Str("cliptk/file-header".into()));
        let decoded = TokenCodec::new().decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, Token::Str("cliptk/file-header".into()));
    }

    #[test]
    fn partial_payload_returns_none() {
        let mut full = encode(Token::Str("hello world".into()));
        let half = full.len() / 2;
        let mut partial = full.split_to(half);

        let mut codec = TokenCodec::new();
        assert!(codec.decode(&mut partial).unwrap().is_none());

        partial.extend_from_slice(&full);
        let decoded = codec.decode(&mut partial).unwrap().unwrap();
        assert_eq!(decoded, Token::Str("hello world".into()));
    }

    #[test]
    fn partial_header_returns_none() {
        let mut buf = BytesMut::from(&[0u8, 0][..]);
        assert!(TokenCodec::new().decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn oversized_length_rejected() {
        let mut buf = BytesMut::new();
        buf.put_u32((MAX_TOKEN_SIZE + 1) as u32);
        buf.extend_from_slice(&[0u8; 16]);
        let err = TokenCodec::new().decode(&mut buf).unwrap_err();
        assert!(matches!(err, StoreError::TokenTooLarge(_)));
    }

    #[test]
    fn garbage_payload_is_decode_error() {
        let mut buf = BytesMut::new();
        buf.put_u32(3);
        buf.extend_from_slice(&[0xc1, 0xc1, 0xc1]);
        let err = TokenCodec::new().decode(&mut buf).unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[test]
    fn length_header_is_big_endian() {
        let buf = encode(Token::Int(7));
        let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
        assert_eq!(buf.len() - 4, len);
    }

    #[test]
    fn describe_names_shapes() {
        assert_eq!(Token::Str("x".into()).describe(), "string");
        assert_eq!(Token::Int(-1).describe(), "integer -1");
        assert_eq!(Token::Bytes(vec![1, 2]).describe(), "byte sequence (2 bytes)");
        assert_eq!(
            Token::Sentinel(Sentinel::FileFooter).describe(),
            "sentinel FileFooter"
        );
    }
}
