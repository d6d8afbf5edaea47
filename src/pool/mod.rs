//! Object pools for [`Field`] and [`Tag`].
//!
//! Ingestion workers acquire one instance per in-flight record and hand it
//! back when the record is done. Instances come back zero-valued: release
//! resets them before they reach the free list, so nothing from a previous
//! record can leak into the next one.
//!
//! - Lock-free free list (`crossbeam::queue::ArrayQueue`)
//! - Release consumes the instance, so a released value cannot be reused
//! - Overflow beyond capacity is simply dropped

use crate::core::{Code, Field, FlowTagError, PoolConfig, Result, Tag};
use crossbeam::queue::ArrayQueue;
use once_cell::sync::OnceCell;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

const DEFAULT_CAPACITY: usize = 10_000;

/// Bounded, concurrent free list of boxed `T`.
pub struct ObjectPool<T> {
    free: ArrayQueue<Box<T>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
    returns: AtomicU64,
}

/// Snapshot of pool counters.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolStats {
    pub hits: u64,
    pub misses: u64,
    pub returns: u64,
    pub available: usize,
    pub capacity: usize,
}

impl PoolStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            1.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl<T: Default> ObjectPool<T> {
    /// Creates an empty pool. Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self {
            free: ArrayQueue::new(capacity),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            returns: AtomicU64::new(0),
        }
    }

    /// Creates a pool with `count` instances pre-allocated.
    pub fn with_warm_up(capacity: usize, count: usize) -> Self {
        let pool = Self::new(capacity);
        pool.warm_up(count);
        pool
    }

    pub fn warm_up(&self, count: usize) {
        for _ in 0..count {
            if self.free.push(Box::default()).is_err() {
                break;
            }
        }
    }

    /// Returns a zero-valued instance, reused when one is free.
    #[inline]
    pub fn acquire(&self) -> Box<T> {
        match self.free.pop() {
            Some(item) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                item
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Box::default()
            }
        }
    }

    /// Resets the instance and puts it back. `None` is a no-op.
    #[inline]
    pub fn release(&self, item: Option<Box<T>>) {
        let Some(mut item) = item else {
            return;
        };
        *item = T::default();
        if self.free.push(item).is_ok() {
            self.returns.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Acquires an instance that releases itself when dropped.
    pub fn get(&self) -> Pooled<'_, T> {
        Pooled {
            item: Some(self.acquire()),
            pool: self,
        }
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            returns: self.returns.load(Ordering::Relaxed),
            available: self.free.len(),
            capacity: self.capacity,
        }
    }
}

impl<T: Default + Clone> ObjectPool<T> {
    /// Deep copy of `src` into a pooled instance.
    pub fn clone_from(&self, src: &T) -> Box<T> {
        let mut item = self.acquire();
        (*item).clone_from(src);
        item
    }
}

/// Scoped pool instance, released on drop unless taken.
pub struct Pooled<'a, T: Default> {
    item: Option<Box<T>>,
    pool: &'a ObjectPool<T>,
}

impl<T: Default> Pooled<'_, T> {
    /// Detaches the instance from the pool.
    pub fn take(mut self) -> Box<T> {
        self.item.take().unwrap_or_default()
    }
}

impl<T: Default> Deref for Pooled<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // only `take` empties the slot, and it consumes the guard
        match &self.item {
            Some(item) => &**item,
            None => unreachable!("pooled instance already taken"),
        }
    }
}

impl<T: Default> DerefMut for Pooled<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut **self.item.get_or_insert_with(Box::default)
    }
}

impl<T: Default> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        self.pool.release(self.item.take());
    }
}

struct GlobalPools {
    fields: ObjectPool<Field>,
    tags: ObjectPool<Tag>,
}

static GLOBAL_POOLS: OnceCell<GlobalPools> = OnceCell::new();

impl GlobalPools {
    fn from_config(config: &PoolConfig) -> Self {
        let pools = GlobalPools {
            fields: ObjectPool::with_warm_up(config.field_capacity, config.warm_up),
            tags: ObjectPool::with_warm_up(config.tag_capacity, config.warm_up),
        };
        tracing::info!(
            "Initialized field pool (capacity {}) and tag pool (capacity {}), warm-up {}",
            config.field_capacity,
            config.tag_capacity,
            config.warm_up
        );
        pools
    }

    /// Sized from `FLOWTAG_POOL_SIZE` when set, warmed with a tenth of it.
    fn from_env() -> Self {
        let capacity = std::env::var("FLOWTAG_POOL_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(DEFAULT_CAPACITY);
        Self::from_config(&PoolConfig {
            field_capacity: capacity,
            tag_capacity: capacity,
            warm_up: capacity / 10,
        })
    }
}

fn global() -> &'static GlobalPools {
    GLOBAL_POOLS.get_or_init(GlobalPools::from_env)
}

/// Sizes the global pools. Must run before the first acquire.
pub fn init_pools(config: &PoolConfig) -> Result<()> {
    if config.field_capacity == 0 || config.tag_capacity == 0 {
        return Err(FlowTagError::config("pool capacities must be greater than 0"));
    }
    GLOBAL_POOLS
        .set(GlobalPools::from_config(config))
        .map_err(|_| FlowTagError::config("global pools are already initialized"))
}

#[inline]
pub fn acquire_field() -> Box<Field> {
    global().fields.acquire()
}

#[inline]
pub fn release_field(field: Option<Box<Field>>) {
    global().fields.release(field)
}

/// Deep copy, including the IPv6 buffers.
pub fn clone_field(field: &Field) -> Box<Field> {
    global().fields.clone_from(field)
}

#[inline]
pub fn acquire_tag() -> Box<Tag> {
    global().tags.acquire()
}

#[inline]
pub fn release_tag(tag: Option<Box<Tag>>) {
    global().tags.release(tag)
}

pub fn clone_tag(tag: &Tag) -> Box<Tag> {
    global().tags.clone_from(tag)
}

pub fn field_pool_stats() -> PoolStats {
    global().fields.stats()
}

pub fn tag_pool_stats() -> PoolStats {
    global().tags.stats()
}

impl Field {
    /// Wraps this field in a pooled tag carrying `code`.
    pub fn new_tag(self, code: Code) -> Box<Tag> {
        let mut tag = acquire_tag();
        tag.field = self;
        tag.code = code;
        tag
    }
}
