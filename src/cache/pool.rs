use log::trace;

/// Value that can be recycled through a [`Pool`].
pub trait Poolable: Sized {
    /// Builds a brand-new instance on a pool miss.
    fn create() -> Self;

    /// Restores the identity (matrices) or zero (vectors) state.
    fn reset(&mut self);
}

/// Running counters for a pool, mostly useful in logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub created: usize,
    pub recycled: usize,
    pub discarded: usize,
}

/// Bounded free list of reusable values.
///
/// The pool is not thread-safe; it is meant to be owned by a single script
/// context. Releasing moves the value into the pool, so an instance can never
/// be handed back twice.
#[derive(Debug)]
pub struct Pool<T> {
    free: Vec<T>,
    capacity: usize,
    stats: PoolStats,
}

impl<T: Poolable> Pool<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::new(),
            capacity,
            stats: PoolStats::default(),
        }
    }

    /// Returns a freshly reset instance, recycled when possible.
    pub fn get_fresh(&mut self) -> T {
        match self.free.pop() {
            Some(mut value) => {
                value.reset();
                self.stats.recycled += 1;
                value
            }
            None => {
                self.stats.created += 1;
                T::create()
            }
        }
    }

    /// Hands a value back. Returns `false` when the pool is full and the
    /// value was dropped instead.
    pub fn release(&mut self, value: T) -> bool {
        if self.free.len() < self.capacity {
            self.free.push(value);
            true
        } else {
            self.stats.discarded += 1;
            trace!("pool at capacity {}, discarding instance", self.capacity);
            false
        }
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Drops every pooled instance and zeroes the counters.
    pub fn clear(&mut self) {
        self.free.clear();
        self.stats = PoolStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Counter(u32);

    impl Poolable for Counter {
        fn create() -> Self {
            Counter(0)
        }

        fn reset(&mut self) {
            self.0 = 0;
        }
    }

    #[test]
    fn recycled_values_are_reset() {
        let mut pool: Pool<Counter> = Pool::new(4);
        let mut value = pool.get_fresh();
        value.0 = 42;
        assert!(pool.release(value));
        let value = pool.get_fresh();
        assert_eq!(value, Counter(0));
        assert_eq!(
            pool.stats(),
            PoolStats {
                created: 1,
                recycled: 1,
                discarded: 0
            }
        );
    }

    #[test]
    fn paired_checkout_and_release_do_not_grow() {
        let mut pool: Pool<Counter> = Pool::new(8);
        for _ in 0..1000 {
            let value = pool.get_fresh();
            pool.release(value);
        }
        assert_eq!(pool.free_count(), 1);
        assert_eq!(pool.stats().created, 1);
    }

    #[test]
    fn releases_beyond_capacity_are_discarded() {
        let mut pool: Pool<Counter> = Pool::new(3);
        let values: Vec<Counter> = (0..5).map(|_| pool.get_fresh()).collect();
        let kept = values
            .into_iter()
            .map(|value| pool.release(value))
            .filter(|kept| *kept)
            .count();
        assert_eq!(kept, 3);
        assert_eq!(pool.free_count(), 3);
        assert_eq!(pool.stats().discarded, 2);
    }

    #[test]
    fn zero_capacity_never_pools() {
        let mut pool: Pool<Counter> = Pool::new(0);
        let value = pool.get_fresh();
        assert!(!pool.release(value));
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn clear_empties_free_list() {
        let mut pool: Pool<Counter> = Pool::new(3);
        let value = pool.get_fresh();
        pool.release(value);
        pool.clear();
        assert_eq!(pool.free_count(), 0);
        assert_eq!(pool.stats(), PoolStats::default());
    }
}
