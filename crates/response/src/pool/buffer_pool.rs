use crate::pool::FreeList;
use bytes::BytesMut;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Free lists of byte buffers keyed by size class.
///
/// A class is created the first time a buffer of its size is requested. Creation takes the
/// write lock and re-checks the map, so concurrent first requests share one class.
pub struct BufferPool {
    classes: RwLock<HashMap<usize, Arc<FreeList<BytesMut>>>>,
    max_idle: usize,
}

impl BufferPool {
    pub fn new(max_idle: usize) -> Self {
        Self { classes: RwLock::new(HashMap::new()), max_idle }
    }

    fn class(&self, size: usize) -> Arc<FreeList<BytesMut>> {
        if let Some(class) = self.classes.read().get(&size) {
            return Arc::clone(class);
        }

        let mut classes = self.classes.write();
        let class = classes.entry(size).or_insert_with(|| {
            debug!(size, "create buffer size class");
            Arc::new(FreeList::new(self.max_idle))
        });
        Arc::clone(class)
    }

    /// Claims an empty buffer with at least `size` bytes of capacity.
    pub fn get(&self, size: usize) -> BytesMut {
        self.class(size).get_or_else(|| BytesMut::with_capacity(size))
    }

    /// Returns a buffer to the `size` class.
    ///
    /// The buffer is cleared first. Buffers whose capacity dropped below `size` are discarded
    /// so every pooled buffer of a class offers its full capacity again.
    pub fn put(&self, size: usize, mut buf: BytesMut) {
        buf.clear();
        if buf.capacity() < size {
            return;
        }
        self.class(size).put(buf);
    }

    /// Number of idle buffers of the `size` class.
    pub fn idle(&self, size: usize) -> usize {
        self.classes.read().get(&size).map_or(0, |class| class.idle())
    }
}

impl fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sizes: Vec<usize> = self.classes.read().keys().copied().collect();
        sizes.sort_unstable();
        f.debug_struct("BufferPool").field("classes", &sizes).field("max_idle", &self.max_idle).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;

    #[test]
    fn test_reuse_cleared_buffer() {
        let pool = BufferPool::new(8);
        let mut buf = pool.get(2048);
        assert!(buf.capacity() >= 2048);
        buf.put_slice(b"secret");

        pool.put(2048, buf);
        assert_eq!(pool.idle(2048), 1);

        let buf = pool.get(2048);
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 2048);
        assert_eq!(pool.idle(2048), 0);
    }

    #[test]
    fn test_size_classes_are_separate() {
        let pool = BufferPool::new(8);
        pool.put(512, BytesMut::with_capacity(512));
        pool.put(4096, BytesMut::with_capacity(4096));

        assert_eq!(pool.idle(512), 1);
        assert_eq!(pool.idle(4096), 1);
        assert_eq!(pool.idle(1024), 0);
    }

    #[test]
    fn test_shrunk_buffer_is_dropped() {
        let pool = BufferPool::new(8);
        let mut buf = pool.get(1024);
        buf.put_slice(&[0u8; 1024]);
        let _head = buf.split_to(1000);

        pool.put(1024, buf);
        assert_eq!(pool.idle(1024), 0);
    }

    #[test]
    fn test_concurrent_class_creation() {
        let pool = Arc::new(BufferPool::new(64));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    let buf = pool.get(333);
                    pool.put(333, buf);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(pool.idle(333) >= 1);
        assert_eq!(pool.classes.read().len(), 1);
    }
}
