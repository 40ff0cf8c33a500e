//! Order-sensitive hash chain over canonical elements
//!
//! For elements `(key_i, value_i)`:
//!
//! ```text
//! h_i = SHA256(key_i ":" canonical(value_i))
//! H_0 = h_0
//! H_i = SHA256(hex(H_{i-1}) ":" hex(h_i))
//! root = H_last
//! ```
//!
//! Links are joined as lowercase hex strings so independent implementations
//! reproduce the same root from the same canonical bytes.

use crate::canonical::canonical_bytes;
use crate::hash::ContentHash;
use serde_json::Value;

/// One appended element: its key and element hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEntry {
    /// Element key (e.g. `context`, `execution_0`)
    pub key: String,
    /// `h_i` for this element
    pub element_hash: ContentHash,
}

/// Append-only hash chain
#[derive(Debug, Clone, Default)]
pub struct HashChain {
    entries: Vec<ChainEntry>,
    current: Option<ContentHash>,
}

impl HashChain {
    /// Create an empty chain
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Element hash `h = SHA256(key ":" canonical(value))`
    #[must_use]
    pub fn element_hash(key: &str, value: &Value) -> ContentHash {
        let mut buf = Vec::with_capacity(key.len() + 64);
        buf.extend_from_slice(key.as_bytes());
        buf.push(b':');
        buf.extend_from_slice(&canonical_bytes(value));
        ContentHash::compute(&buf)
    }

    /// Link hash `SHA256(hex(prev) ":" hex(element))`
    #[must_use]
    pub fn link(prev: &ContentHash, element: &ContentHash) -> ContentHash {
        let joined = format!("{prev}:{element}");
        ContentHash::compute(joined.as_bytes())
    }

    /// Append an element and advance the running hash
    pub fn append(&mut self, key: impl Into<String>, value: &Value) -> ContentHash {
        let key = key.into();
        let element_hash = Self::element_hash(&key, value);
        let next = match &self.current {
            None => element_hash,
            Some(prev) => Self::link(prev, &element_hash),
        };
        self.entries.push(ChainEntry { key, element_hash });
        self.current = Some(next);
        next
    }

    /// Build a chain from ordered elements
    #[must_use]
    pub fn from_elements<'a, I>(elements: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a Value)>,
    {
        let mut chain = Self::new();
        for (key, value) in elements {
            chain.append(key, value);
        }
        chain
    }

    /// Running hash after the last append (`None` when empty)
    #[inline]
    #[must_use]
    pub fn current_hash(&self) -> Option<ContentHash> {
        self.current
    }

    /// Root of the chain, the running hash after all elements
    #[inline]
    #[must_use]
    pub fn root(&self) -> Option<ContentHash> {
        self.current
    }

    /// Appended entries in order
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[ChainEntry] {
        &self.entries
    }

    /// Number of appended elements
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been appended
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recompute the root over `elements` and compare with `expected`
    #[must_use]
    pub fn verify_root<'a, I>(elements: I, expected: &ContentHash) -> bool
    where
        I: IntoIterator<Item = (&'a str, &'a Value)>,
    {
        Self::from_elements(elements).root().as_ref() == Some(expected)
    }
}
