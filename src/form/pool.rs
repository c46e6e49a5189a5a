use super::core::{BodyBuf, BODY_CAPACITY};
use crate::error::HttpdError;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Default number of request bodies that may be buffered at the same time.
pub const DEFAULT_POOL_SLOTS: usize = 8;

/// Fixed set of preallocated body buffers shared by all connections.
///
/// Each in-flight POST holds one slot for the duration of its handler. When
/// every slot is taken, [`BufferPool::acquire`] fails with
/// [`HttpdError::AllocationFailure`] instead of allocating more memory.
pub struct BufferPool {
    free: Mutex<Vec<Box<BodyBuf<BODY_CAPACITY>>>>,
    slots: usize,
}

impl BufferPool {
    #[must_use]
    pub fn new(slots: usize) -> Self {
        let free = (0..slots).map(|_| Box::new(BodyBuf::new())).collect();
        Self {
            free: Mutex::new(free),
            slots,
        }
    }

    /// Take a body buffer for the current request.
    ///
    /// The buffer goes back to the pool when the returned guard is dropped.
    pub fn acquire(&self) -> Result<PooledBuffer<'_>, HttpdError> {
        let buf = self
            .free
            .lock()
            .map_err(|_| HttpdError::AllocationFailure)?
            .pop();
        match buf {
            Some(buf) => {
                debug!(available = self.available(), "Body buffer acquired");
                Ok(PooledBuffer {
                    pool: self,
                    buf: Some(buf),
                })
            }
            None => {
                warn!(slots = self.slots, "Body buffer pool exhausted");
                Err(HttpdError::AllocationFailure)
            }
        }
    }

    /// Number of buffers currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Total number of slots.
    #[must_use]
    pub fn slots(&self) -> usize {
        self.slots
    }

    fn release(&self, mut buf: Box<BodyBuf<BODY_CAPACITY>>) {
        buf.clear();
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(buf);
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SLOTS)
    }
}

/// Scoped handle to a pooled body buffer.
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buf: Option<Box<BodyBuf<BODY_CAPACITY>>>,
}

impl Deref for PooledBuffer<'_> {
    type Target = BodyBuf<BODY_CAPACITY>;

    fn deref(&self) -> &Self::Target {
        // Only `drop` takes the buffer out.
        match &self.buf {
            Some(buf) => &**buf,
            None => unreachable_buffer(),
        }
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.buf {
            Some(buf) => &mut **buf,
            None => unreachable_buffer(),
        }
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.release(buf);
        }
    }
}

#[cold]
fn unreachable_buffer() -> ! {
    unreachable!("pooled buffer accessed after release")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_and_release() {
        let pool = BufferPool::new(2);
        {
            let _a = pool.acquire().unwrap();
            assert_eq!(pool.available(), 1);
        }
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn test_exhaustion_is_allocation_failure() {
        let pool = BufferPool::new(1);
        let _held = pool.acquire().unwrap();
        assert!(matches!(pool.acquire(), Err(HttpdError::AllocationFailure)));
    }

    #[test]
    fn test_released_buffer_is_cleared() {
        let pool = BufferPool::new(1);
        {
            let mut buf = pool.acquire().unwrap();
            let mut reader: &[u8] = b"ssid=secret";
            buf.read_from(&mut reader).unwrap();
        }
        let buf = pool.acquire().unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_release_on_error_path() {
        fn failing(pool: &BufferPool) -> Result<(), HttpdError> {
            let mut buf = pool.acquire()?;
            let mut reader: &[u8] = &[b'x'; BODY_CAPACITY + 1];
            buf.read_from(&mut reader)?;
            Ok(())
        }

        let pool = BufferPool::new(1);
        assert!(failing(&pool).is_err());
        assert_eq!(pool.available(), 1);
    }
}
