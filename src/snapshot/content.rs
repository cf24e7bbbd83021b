//! Content values held by a snapshot.
//!
//! Values are classified once, when they enter a snapshot, through the
//! `From` conversions below. Downstream code matches on [`ContentValue`]
//! and never inspects runtime types again.

use std::any::Any;
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;

/// Returned when a cursor would point past the end of its payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cursor {cursor} is past the end of a {len}-byte payload")]
pub struct CursorOutOfRange {
    pub cursor: usize,
    pub len: usize,
}

/// Raw byte payload with a read position.
///
/// The cursor is part of the value: a buffer that a previous reader has
/// partly consumed resumes at the same offset after a round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteContent {
    payload: Bytes,
    cursor: usize,
}

impl ByteContent {
    pub fn new(payload: impl Into<Bytes>, cursor: usize) -> Result<Self, CursorOutOfRange> {
        let payload = payload.into();
        if cursor > payload.len() {
            return Err(CursorOutOfRange {
                cursor,
                len: payload.len(),
            });
        }
        Ok(Self { payload, cursor })
    }

    /// Payload positioned at the start.
    pub fn from_start(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            cursor: 0,
        }
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Bytes from the cursor to the end.
    pub fn remaining(&self) -> &[u8] {
        &self.payload[self.cursor..]
    }
}

/// In-memory value that cannot be written to a store.
///
/// Kept so a snapshot can still hand it back to the clipboard while the
/// process lives. Two handles are equal only if they share the value.
#[derive(Clone)]
pub struct NativeHandle {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl NativeHandle {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            value: Arc::new(value),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeHandle")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for NativeHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

/// A classified clipboard value.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentValue {
    /// Byte buffer with a cursor.
    Bytes(ByteContent),
    /// Structured value written through the structural codec.
    Opaque(serde_json::Value),
    /// Present in memory, never encoded.
    NonPersistable(NativeHandle),
}

impl ContentValue {
    /// Wrap a value that has no persistable shape.
    pub fn native<T: Any + Send + Sync>(value: T) -> Self {
        ContentValue::NonPersistable(NativeHandle::new(value))
    }

    pub fn is_persistable(&self) -> bool {
        !matches!(self, ContentValue::NonPersistable(_))
    }

    /// Short shape name for listings and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ContentValue::Bytes(_) => "bytes",
            ContentValue::Opaque(_) => "opaque",
            ContentValue::NonPersistable(_) => "native",
        }
    }
}

impl From<ByteContent> for ContentValue {
    fn from(value: ByteContent) -> Self {
        ContentValue::Bytes(value)
    }
}

impl From<Vec<u8>> for ContentValue {
    fn from(value: Vec<u8>) -> Self {
        ContentValue::Bytes(ByteContent::from_start(value))
    }
}

impl From<Bytes> for ContentValue {
    fn from(value: Bytes) -> Self {
        ContentValue::Bytes(ByteContent::from_start(value))
    }
}

impl From<Cursor<Vec<u8>>> for ContentValue {
    fn from(value: Cursor<Vec<u8>>) -> Self {
        let position = value.position();
        let payload = value.into_inner();
        // A Cursor may be positioned past its end; clamp like a read would.
        let cursor = usize::try_from(position)
            .unwrap_or(usize::MAX)
            .min(payload.len());
        ContentValue::Bytes(ByteContent {
            payload: payload.into(),
            cursor,
        })
    }
}

impl From<String> for ContentValue {
    fn from(value: String) -> Self {
        ContentValue::Opaque(serde_json::Value::String(value))
    }
}

impl From<&str> for ContentValue {
    fn from(value: &str) -> Self {
        ContentValue::Opaque(serde_json::Value::String(value.to_owned()))
    }
}

impl From<serde_json::Value> for ContentValue {
    fn from(value: serde_json::Value) -> Self {
        ContentValue::Opaque(value)
    }
}

impl From<NativeHandle> for ContentValue {
    fn from(value: NativeHandle) -> Self {
        ContentValue::NonPersistable(value)
    }
}
