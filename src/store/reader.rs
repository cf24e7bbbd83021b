//! Typed token reader and buffered token writer.
//!
//! Every read names the field it is reading, so a type mismatch or an
//! early end of stream becomes a [`StoreError`] that says where and what.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use super::StoreError;
use super::token::{Sentinel, Token, TokenCodec};

/// Field names reported in `MalformedField` errors.
pub mod field {
    pub const NAME: &str = "name";
    pub const CAPTURED_AT: &str = "capturedAt";
    pub const WRITABLE_COUNT: &str = "writableCount";
    pub const IDENTIFIER_COUNT: &str = "identifierCount";
    pub const IDENTIFIER: &str = "identifier";
    pub const PAYLOAD: &str = "payload";
    pub const CURSOR: &str = "cursor";
    pub const SNAPSHOT_HEADER: &str = "snapshot header";
}

/// Pulls tokens one at a time from an in-memory buffer.
#[derive(Debug)]
pub struct TokenReader {
    buf: BytesMut,
    codec: TokenCodec,
    peeked: Option<Token>,
    consumed: usize,
}

impl TokenReader {
    pub fn new(bytes: impl Into<BytesMut>) -> Self {
        Self {
            buf: bytes.into(),
            codec: TokenCodec::new(),
            peeked: None,
            consumed: 0,
        }
    }

    /// Number of tokens read so far.
    pub fn position(&self) -> usize {
        self.consumed
    }

    /// Bytes not yet decoded into tokens.
    pub fn remaining_bytes(&self) -> usize {
        self.buf.len()
    }

    /// Next token, or `None` at end of stream.
    ///
    /// A trailing partial frame counts as end of stream.
    pub fn try_next(&mut self) -> Result<Option<Token>, StoreError> {
        if let Some(token) = self.peeked.take() {
            return Ok(Some(token));
        }
        let token = self.codec.decode(&mut self.buf)?;
        if let Some(token) = &token {
            self.consumed += 1;
            tracing::trace!(index = self.consumed, token = %token.describe(), "read token");
        }
        Ok(token)
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self, field: &'static str) -> Result<&Token, StoreError> {
        if self.peeked.is_none() {
            let token = self.next(field)?;
            self.peeked = Some(token);
        }
        self.peeked
            .as_ref()
            .ok_or(StoreError::MissingFileFooter { while_reading: field })
    }

    /// Next token; end of stream means the footer never arrived.
    pub fn next(&mut self, field: &'static str) -> Result<Token, StoreError> {
        self.try_next()?
            .ok_or(StoreError::MissingFileFooter { while_reading: field })
    }

    pub fn read_str(&mut self, field: &'static str) -> Result<String, StoreError> {
        match self.next(field)? {
            Token::Str(s) => Ok(s),
            other => Err(StoreError::malformed(field, "string", &other)),
        }
    }

    pub fn read_int(&mut self, field: &'static str) -> Result<i64, StoreError> {
        match self.next(field)? {
            Token::Int(v) => Ok(v),
            other => Err(StoreError::malformed(field, "integer", &other)),
        }
    }

    /// Non-negative integer, as a count or offset.
    pub fn read_count(&mut self, field: &'static str) -> Result<usize, StoreError> {
        match self.next(field)? {
            Token::Int(v) => usize::try_from(v)
                .map_err(|_| StoreError::malformed(field, "non-negative integer", &Token::Int(v))),
            other => Err(StoreError::malformed(field, "non-negative integer", &other)),
        }
    }
}

/// Accumulates encoded tokens.
#[derive(Debug, Default)]
pub struct TokenWriter {
    buf: BytesMut,
    codec: TokenCodec,
    written: usize,
}

impl TokenWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, token: Token) -> Result<(), StoreError> {
        self.codec.encode(token, &mut self.buf)?;
        self.written += 1;
        Ok(())
    }

    pub fn sentinel(&mut self, sentinel: Sentinel) -> Result<(), StoreError> {
        self.write(Token::Sentinel(sentinel))
    }

    pub fn str(&mut self, value: &str) -> Result<(), StoreError> {
        self.write(Token::Str(value.to_owned()))
    }

    pub fn count(&mut self, value: usize) -> Result<(), StoreError> {
        let value = i64::try_from(value).map_err(|_| StoreError::CountOverflow(value))?;
        self.write(Token::Int(value))
    }

    /// Tokens written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_bytes(self) -> BytesMut {
        self.buf
    }
}
