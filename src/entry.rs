//! Unified cache entry type.
//!
//! `CacheEntry<K, V, M>` is the payload every engine stores in its arena
//! slots. The generic `M` parameter carries whatever bookkeeping a
//! particular eviction policy needs beyond the key and value themselves
//! (use-count for LFU, a touch timestamp for LFUDA, an expiry instant for
//! the TTL variants) without forcing every other policy to carry fields it
//! doesn't use. Grounded on the grounding codebase's own unified
//! `CacheEntry<K, V, M = ()>`, with the size/timestamp bookkeeping that
//! backed its byte-budget admission control removed — nothing in this
//! crate's scope needs a size-aware capacity dimension (see DESIGN.md).

/// A key/value pair plus policy-specific metadata, as stored in an arena
/// slot.
#[derive(Clone)]
pub(crate) struct CacheEntry<K, V, M = ()> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) metadata: M,
}

impl<K, V, M> CacheEntry<K, V, M> {
    pub(crate) fn new(key: K, value: V, metadata: M) -> Self {
        CacheEntry {
            key,
            value,
            metadata,
        }
    }
}

impl<K: core::fmt::Debug, V: core::fmt::Debug, M: core::fmt::Debug> core::fmt::Debug
    for CacheEntry<K, V, M>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("metadata", &self.metadata)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stores_fields_verbatim() {
        let entry = CacheEntry::new(1, "one", 7_u64);
        assert_eq!(entry.key, 1);
        assert_eq!(entry.value, "one");
        assert_eq!(entry.metadata, 7);
    }

    #[test]
    fn unit_metadata_is_default_shape() {
        let entry: CacheEntry<&str, i32> = CacheEntry::new("k", 1, ());
        assert_eq!(entry.key, "k");
        assert_eq!(entry.value, 1);
    }
}
