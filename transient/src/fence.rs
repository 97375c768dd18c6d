//! Counter fence: the CPU/GPU synchronization primitive.
//!
//! A [`CounterFence`] pairs a monotonic 64-bit counter with a backend fence
//! object. The CPU enqueues "signal to value N" commands on a queue; the GPU
//! writes N to the fence once it gets there. Comparing the GPU-completed
//! value against values recorded earlier tells the CPU which memory the GPU
//! can no longer read.
//!
//! # Example
//!
//! ```ignore
//! let fence = Arc::new(CounterFence::new(device.clone(), 0)?);
//!
//! // Once per submission
//! let value = fence.next_signal(queue)?;
//! ring.add_sync(value);
//! cache.add_sync(value);
//!
//! // Later
//! ring.update_completed();
//! cache.update_completed();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::backend::GpuDevice;
use crate::error::TransientError;
use crate::types::{EventHandle, FenceHandle, QueueHandle};

/// CPU/GPU counter fence.
///
/// `current_value` is the last value handed out by [`next_signal`]; the
/// backend-reported completed value never exceeds it.
///
/// # Thread Safety
///
/// The counter is stored atomically so the fence can be shared through an
/// `Arc` by the heaps that poll it, but [`next_signal`] has a single-writer
/// contract: only the thread recording submissions may call it.
///
/// [`next_signal`]: Self::next_signal
pub struct CounterFence {
    device: Arc<dyn GpuDevice>,
    fence: FenceHandle,
    event: EventHandle,
    current_value: AtomicU64,
}

impl CounterFence {
    /// Create the backend fence and the OS event used for blocking waits.
    ///
    /// Both the current and completed values start at `initial_value`.
    pub fn new(device: Arc<dyn GpuDevice>, initial_value: u64) -> Result<Self, TransientError> {
        let fence = device.create_fence(initial_value).map_err(|e| {
            TransientError::InitializationFailed(format!("failed to create fence: {e}"))
        })?;
        let event = match device.create_event() {
            Ok(event) => event,
            Err(e) => {
                device.destroy_fence(fence);
                return Err(TransientError::InitializationFailed(format!(
                    "failed to create fence event: {e}"
                )));
            }
        };

        log::debug!(
            "CounterFence: created on {} (initial value {})",
            device.name(),
            initial_value
        );

        Ok(Self {
            device,
            fence,
            event,
            current_value: AtomicU64::new(initial_value),
        })
    }

    /// Backend fence handle.
    pub fn handle(&self) -> FenceHandle {
        self.fence
    }

    /// Increment the counter and enqueue a signal to the new value on `queue`.
    ///
    /// Returns the value the GPU will write once it reaches this point.
    pub fn next_signal(&self, queue: QueueHandle) -> Result<u64, TransientError> {
        let value = self.current_value.fetch_add(1, Ordering::AcqRel) + 1;
        self.device.signal(queue, self.fence, value)?;
        log::trace!("CounterFence: signal {value} enqueued");
        Ok(value)
    }

    /// Last value handed out by [`next_signal`](Self::next_signal).
    pub fn current_value(&self) -> u64 {
        self.current_value.load(Ordering::Acquire)
    }

    /// Last value the GPU has confirmed.
    pub fn completed_value(&self) -> u64 {
        self.device.completed_value(self.fence)
    }

    /// Whether the GPU has passed `value`.
    pub fn is_completed(&self, value: u64) -> bool {
        self.completed_value() >= value
    }

    /// Block until the GPU has reached `value`.
    ///
    /// `value` must already have been produced by this fence. The wait has no
    /// timeout; the caller guarantees the GPU keeps making progress.
    pub fn wait_until_completed(&self, value: u64) -> Result<(), TransientError> {
        debug_assert!(
            value <= self.current_value(),
            "waiting on fence value {value} that was never signaled (current {})",
            self.current_value()
        );

        while self.completed_value() < value {
            crate::profile_scope!("CounterFence::wait");
            self.device
                .set_event_on_completion(self.fence, value, self.event)?;
            self.device.wait_event(self.event);
        }
        Ok(())
    }

    /// Signal the next value and wait for it: a full CPU/GPU stall.
    pub fn next_signal_and_wait(&self, queue: QueueHandle) -> Result<u64, TransientError> {
        let value = self.next_signal(queue)?;
        self.wait_until_completed(value)?;
        Ok(value)
    }
}

impl Drop for CounterFence {
    fn drop(&mut self) {
        self.device.destroy_event(self.event);
        self.device.destroy_fence(self.fence);
    }
}

impl std::fmt::Debug for CounterFence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterFence")
            .field("fence", &self.fence)
            .field("current_value", &self.current_value())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(CounterFence: Send, Sync);
