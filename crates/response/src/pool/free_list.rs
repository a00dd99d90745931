use parking_lot::Mutex;
use std::fmt;

/// A bounded, internally synchronized free list.
///
/// Callers must reset an object before handing it back with [`FreeList::put`]; the list itself
/// never inspects what it stores.
pub struct FreeList<T> {
    items: Mutex<Vec<T>>,
    max_idle: usize,
}

impl<T> FreeList<T> {
    pub fn new(max_idle: usize) -> Self {
        Self { items: Mutex::new(Vec::new()), max_idle }
    }

    /// Claims an idle object, if any.
    #[inline]
    pub fn get(&self) -> Option<T> {
        self.items.lock().pop()
    }

    /// Claims an idle object or builds a new one.
    #[inline]
    pub fn get_or_else<F: FnOnce() -> T>(&self, f: F) -> T {
        self.get().unwrap_or_else(f)
    }

    /// Returns an object to the list, dropping it when the list is already full.
    pub fn put(&self, item: T) {
        let mut items = self.items.lock();
        if items.len() < self.max_idle {
            items.push(item);
        }
    }

    /// Number of idle objects.
    pub fn idle(&self) -> usize {
        self.items.lock().len()
    }
}

impl<T> fmt::Debug for FreeList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FreeList").field("idle", &self.idle()).field("max_idle", &self.max_idle).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_get_put() {
        let list = FreeList::new(2);
        assert!(list.get().is_none());

        list.put(1);
        list.put(2);
        list.put(3);
        assert_eq!(list.idle(), 2);

        assert_eq!(list.get(), Some(2));
        assert_eq!(list.get(), Some(1));
        assert_eq!(list.get_or_else(|| 7), 7);
    }

    #[test]
    fn test_concurrent_claims_are_exclusive() {
        let list = Arc::new(FreeList::new(64));
        for i in 0..64 {
            list.put(i);
        }

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let list = Arc::clone(&list);
                std::thread::spawn(move || {
                    let mut claimed = Vec::new();
                    while let Some(item) = list.get() {
                        claimed.push(item);
                    }
                    claimed
                })
            })
            .collect();

        let mut all: Vec<i32> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort_unstable();
        assert_eq!(all, (0..64).collect::<Vec<_>>());
    }
}
