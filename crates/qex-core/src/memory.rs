//! Memory pool handle.
//!
//! The converter does not allocate through the engine allocator itself; the
//! pool is threaded through so that Values-node vector materialization is
//! accounted against the query that requested the conversion.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Accounting handle for vector allocations.
#[derive(Debug, Default)]
pub struct MemoryPool {
    reserved: AtomicUsize,
}

impl MemoryPool {
    pub fn new() -> Arc<MemoryPool> {
        Arc::new(MemoryPool::default())
    }

    /// Record `bytes` of vector storage against this pool.
    pub fn reserve(&self, bytes: usize) {
        self.reserved.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Total bytes reserved so far.
    pub fn reserved_bytes(&self) -> usize {
        self.reserved.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_accumulates() {
        let pool = MemoryPool::new();
        pool.reserve(64);
        pool.reserve(16);
        assert_eq!(pool.reserved_bytes(), 80);
    }
}
