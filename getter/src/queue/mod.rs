//! Bounded blocking queue for handing tasks to worker threads.
//!
//! The queue is a fixed-size ring of slots. Producers and consumers each
//! serialize on their own cursor lock, and two counting semaphores track
//! how many slots are free and how many are filled:
//!
//! ```text
//!   put ──► [write cursor] ──► slot[w] ──► filled.release()
//!                                               │
//!   get ◄── slot[r] ◄── [read cursor] ◄── filled.acquire()
//! ```
//!
//! A producer blocks on `free` while the ring is full and a consumer blocks on
//! `filled` while it is empty, so callers sleep instead of spinning and are
//! woken exactly when a slot changes state.
//!
//! # Example
//!
//! ```
//! use getter::queue::BoundedQueue;
//!
//! let queue = BoundedQueue::new(2).unwrap();
//! queue.put("first");
//! queue.put("second");
//!
//! assert_eq!(queue.get(), "first");
//! assert_eq!(queue.get(), "second");
//! ```

mod semaphore;

use parking_lot::Mutex;
use thiserror::Error;

use semaphore::Semaphore;

/// Errors raised when constructing a queue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// A queue must have room for at least one item.
    #[error("queue capacity must be at least 1")]
    ZeroCapacity,
}

// =============================================================================
// Bounded Queue
// =============================================================================

/// Fixed-capacity FIFO queue with blocking `put` and `get`.
///
/// Safe to share between any number of producer and consumer threads (wrap
/// it in an `Arc`). Storage is released when the last reference is dropped.
#[derive(Debug)]
pub struct BoundedQueue<T> {
    slots: Box<[Mutex<Option<T>>]>,
    write_cursor: Mutex<usize>,
    read_cursor: Mutex<usize>,
    /// Number of slots holding an item.
    filled: Semaphore,
    /// Number of slots free for writing.
    free: Semaphore,
}

impl<T> BoundedQueue<T> {
    /// Allocate a queue able to hold `capacity` pending items.
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }

        let slots = (0..capacity).map(|_| Mutex::new(None)).collect();

        Ok(Self {
            slots,
            write_cursor: Mutex::new(0),
            read_cursor: Mutex::new(0),
            filled: Semaphore::new(0),
            free: Semaphore::new(capacity),
        })
    }

    /// Insert an item, blocking while the queue is full.
    pub fn put(&self, item: T) {
        let mut cursor = self.write_cursor.lock();
        self.free.acquire();

        *self.slots[*cursor].lock() = Some(item);
        *cursor = (*cursor + 1) % self.slots.len();

        self.filled.release();
    }

    /// Remove the oldest item, blocking while the queue is empty.
    pub fn get(&self) -> T {
        let mut cursor = self.read_cursor.lock();
        self.filled.acquire();

        let item = self.slots[*cursor]
            .lock()
            .take()
            .expect("filled permit implies an occupied slot");
        *cursor = (*cursor + 1) % self.slots.len();

        self.free.release();
        item
    }

    /// Maximum number of items the queue holds at once.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of items currently waiting.
    ///
    /// Only a snapshot; other threads may change it immediately.
    pub fn len(&self) -> usize {
        self.filled.available()
    }

    /// Returns true if no items are waiting (snapshot).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
