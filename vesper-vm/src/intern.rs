// vesper-vm - String interning
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! String interning.
//!
//! Every string value in a VM is canonicalized through one [`Interner`], so
//! two strings with the same bytes share the same underlying storage and a
//! [`StrRef`] compares and hashes by pointer:
//!
//! - **O(1) equality**: comparing strings is a pointer comparison
//! - **O(1) hashing**: the globals table hashes the pointer address
//! - **Memory efficiency**: identical strings share storage
//!
//! The interner is owned by the VM and threaded through string creation
//! (including runtime concatenation), rather than living in process-global
//! state. Dropping the VM drops the pool; any handle still held keeps its
//! bytes alive through the `Arc`, so teardown order needs no convention.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A handle to an interned string.
///
/// Two handles from the same [`Interner`] are equal iff their byte contents
/// are equal, because interning guarantees at most one allocation per
/// distinct contents.
#[derive(Clone)]
pub struct StrRef {
    inner: Arc<str>,
}

impl StrRef {
    /// View the string contents.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Byte length of the contents.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check whether the string is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Display for StrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl fmt::Debug for StrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StrRef({:?})", &*self.inner)
    }
}

impl PartialEq for StrRef {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        // Interning makes pointer comparison sufficient
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for StrRef {}

impl Hash for StrRef {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

/// The string pool.
#[derive(Debug, Default)]
pub struct Interner {
    strings: HashMap<String, StrRef>,
}

impl Interner {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            strings: HashMap::new(),
        }
    }

    /// Return the canonical handle for `s`, allocating on first sight.
    pub fn intern(&mut self, s: &str) -> StrRef {
        if let Some(existing) = self.strings.get(s) {
            return existing.clone();
        }
        let handle = StrRef {
            inner: Arc::from(s),
        };
        self.strings.insert(s.to_string(), handle.clone());
        handle
    }

    /// Number of distinct strings interned so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Check whether the pool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
