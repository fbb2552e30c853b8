//! Fixed-capacity duplicate-suppression cache (spec §4.2, component C2).

use flud_proto::MacAddr;

/// One cache slot: the `(sequence, source)` identity plus when it was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    sequence: u32,
    source: MacAddr,
    timestamp_ms: u32,
}

/// Entries older than this are swept regardless of capacity pressure.
pub const CACHE_TIMEOUT_MS: u32 = 5 * 60 * 1000;

/// Default compile-time capacity (spec §4.2: "typical 64").
pub const DEFAULT_CAPACITY: usize = 64;

/// Rejects frames already seen as `(source_mac, sequence)` within the last
/// [`CACHE_TIMEOUT_MS`].
///
/// Backed by a `Vec` rather than the original firmware's fixed array since
/// this crate has no static-allocation constraint; `capacity` still bounds
/// growth the same way the firmware's compile-time array does.
#[derive(Debug, Clone)]
pub struct DupCache {
    capacity: usize,
    entries: Vec<Entry>,
}

impl DupCache {
    /// Build an empty cache with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { capacity, entries: Vec::with_capacity(capacity) }
    }

    /// True if `(sequence, source)` is already cached.
    ///
    /// Ordering rule (spec §4.2): ingress must call this before `insert`.
    #[must_use]
    pub fn contains(&self, sequence: u32, source: MacAddr) -> bool {
        self.entries.iter().any(|e| e.sequence == sequence && e.source == source)
    }

    /// Record `(sequence, source)` as seen at `now`.
    ///
    /// If the cache is full, overwrites the entry with the smallest
    /// timestamp (oldest first, spec §4.2).
    pub fn insert(&mut self, sequence: u32, source: MacAddr, now: u32) {
        let entry = Entry { sequence, source, timestamp_ms: now };
        if self.entries.len() < self.capacity {
            self.entries.push(entry);
            return;
        }
        let oldest = self
            .entries
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| e.timestamp_ms)
            .map(|(i, _)| i);
        if let Some(i) = oldest {
            self.entries[i] = entry;
        }
    }

    /// Remove entries older than [`CACHE_TIMEOUT_MS`].
    pub fn sweep(&mut self, now: u32) {
        self.entries.retain(|e| now.wrapping_sub(e.timestamp_ms) < CACHE_TIMEOUT_MS);
    }

    /// Current occupancy, mostly useful for tests and diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DupCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
