//! Append-only table from codec id to codec.
//!
//! Every codec is registered exactly once, when it is constructed, and receives the next id. The
//! self-describing codecs write these ids on the wire and look them up again on read, so ids are
//! part of the wire format of those codecs.
//!
//! # Stability
//!
//! Ids are assigned in construction order. The well-known codecs in [crate::builtins] are always
//! built first and in a fixed order, so their ids are stable for a given build of this crate. Ids
//! of codecs built by callers depend on the order the program builds them in: bytes produced by the
//! self-describing codecs are only safe to read back by the same build of the same program.

use crate::{Codec, Id};
use std::sync::{OnceLock, RwLock};
use tracing::trace;

/// Process-wide codec table.
pub struct Registry {
    codecs: RwLock<Vec<Codec>>,
}

impl Registry {
    fn new() -> Self {
        Self {
            codecs: RwLock::new(Vec::new()),
        }
    }

    /// Returns the registry shared by every codec in the process.
    pub fn global() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Registry::new)
    }

    /// Assigns the next id, builds the codec with it, and records it.
    ///
    /// The id is reserved and the codec recorded under the same lock, so ids are never reused or
    /// skipped even if codecs are constructed from several threads.
    pub(crate) fn register(&self, build: impl FnOnce(Id) -> Codec) -> Codec {
        let mut codecs = self.codecs.write().unwrap_or_else(|e| e.into_inner());
        let id = codecs.len() as Id;
        let codec = build(id);
        trace!(id, name = codec.name(), "registered codec");
        codecs.push(codec.clone());
        codec
    }

    /// Returns the codec registered under `id`.
    pub fn get(&self, id: Id) -> Option<Codec> {
        let codecs = self.codecs.read().unwrap_or_else(|e| e.into_inner());
        codecs.get(id as usize).cloned()
    }

    /// Number of registered codecs.
    pub fn len(&self) -> usize {
        self.codecs.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;

    #[test]
    fn test_lookup_returns_same_codec() {
        let b = builtins();
        let found = Registry::global().get(b.u16.id()).unwrap();
        assert_eq!(found, b.u16);
        assert_eq!(found.name(), "u16");
    }

    #[test]
    fn test_ids_increase() {
        let first = builtins().u8.array();
        let second = builtins().u8.array();
        assert!(second.id() > first.id());
        assert_ne!(first, second);
        assert!(Registry::global().len() > second.id() as usize);
    }

    #[test]
    fn test_unknown_id() {
        assert!(Registry::global().get(Id::MAX).is_none());
    }
}
