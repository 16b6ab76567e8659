//! Byte View Module
//!
//! Immutable snapshot of a cached value.

use std::fmt;
use std::sync::Arc;

// == Byte View ==
/// An immutable, cheaply cloneable view over cached bytes.
///
/// The buffer is shared between clones and never mutated. Accessors that
/// hand out raw bytes return a fresh copy.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteView {
    bytes: Arc<[u8]>,
}

impl ByteView {
    /// Creates a view holding a copy of `bytes`.
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: Arc::from(bytes),
        }
    }

    /// The empty view, used for negative cache entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of bytes held.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    // == Byte Slice ==
    /// Returns a copy of the underlying bytes.
    pub fn byte_slice(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Lossy UTF-8 rendering of the value.
    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::from(bytes),
        }
    }
}

impl From<&str> for ByteView {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl From<String> for ByteView {
    fn from(s: String) -> Self {
        Self::from(s.into_bytes())
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.bytes))
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ByteView")
            .field(&String::from_utf8_lossy(&self.bytes))
            .finish()
    }
}
