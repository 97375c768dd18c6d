//! # RedLilium Transient
//!
//! Per-submission GPU memory and descriptor lifecycle management.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`CounterFence`] - Monotonic CPU/GPU fence that orders reclamation
//! - [`CircularResourceHeap`] - Ring of mapped upload blocks for transient buffer data
//! - [`DescriptorSet`] - A typed list or run of descriptor handles
//! - [`DescriptorCache`] - Deduplicating copier of descriptor sets into shader-visible heaps
//! - [`GpuDevice`] - Trait the managers talk to, with a [`DummyDevice`] for testing
//!
//! All managers share one lifecycle: produce during recording, `add_sync`
//! with the value just signaled on the fence, and `update_completed` later to
//! reclaim whatever the GPU has finished with.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use redlilium_transient::*;
//!
//! let device: Arc<dyn GpuDevice> = Arc::new(DummyDevice::new());
//! let fence = Arc::new(CounterFence::new(device.clone(), 0)?);
//! let mut ring = CircularResourceHeap::new(device.clone(), CircularHeapDescriptor::default(), fence.clone())?;
//! let mut cache = DescriptorCache::new(device, DescriptorCacheDescriptor::default(), fence.clone())?;
//!
//! loop {
//!     ring.update_completed();
//!     cache.update_completed();
//!
//!     let constants = ring.upload_constants(&frame_constants)?;
//!     let textures = cache.put(&DescriptorSet::list(DescriptorKind::Srv, &views), false)?;
//!     // record and submit...
//!
//!     let value = fence.next_signal(queue)?;
//!     ring.add_sync(value);
//!     cache.add_sync(value);
//! }
//! ```

pub mod backend;
pub mod descriptors;
pub mod error;
pub mod fence;
pub mod heap;
pub mod profiling;
pub mod types;

// Re-export main types for convenience
pub use backend::{BackendError, DummyDevice, GpuDevice};
pub use descriptors::{
    DescriptorCache, DescriptorCacheDescriptor, DescriptorHandles, DescriptorLocation,
    DescriptorSet, EntryKey, PutBatch, SubHeapId, SubHeapState,
};
pub use error::TransientError;
pub use fence::CounterFence;
pub use heap::{BlockId, BufferSlice, CircularHeapDescriptor, CircularResourceHeap, Cursor};
pub use types::{
    CpuDescriptorHandle, DescriptorHeapFlags, DescriptorHeapType, DescriptorKind,
    GpuDescriptorHandle, GpuVirtualAddress, HeapFlags, HeapKind, QueueHandle, ResourceStates,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version. Call once at startup, after installing a logger.
pub fn init() {
    log::info!("RedLilium Transient v{} initialized", VERSION);
}
