//! Shader-visible descriptor management.
//!
//! Descriptors are created in CPU-only staging heaps. To be read by shaders
//! they must be copied into a shader-visible heap, and only one such heap per
//! category can be bound at a time. The [`DescriptorCache`] does that copying
//! and deduplicates it: a [`DescriptorSet`] that was already copied to the
//! active heap is not copied again.
//!
//! # Example
//!
//! ```ignore
//! let mut cache = DescriptorCache::new(
//!     device.clone(),
//!     DescriptorCacheDescriptor::new(DescriptorHeapType::CbvSrvUav).with_label("srv_cache"),
//!     fence.clone(),
//! )?;
//!
//! let textures = DescriptorSet::list(DescriptorKind::Srv, &material.texture_views);
//! let location = cache.put(&textures, false)?;
//! cmd.set_descriptor_table(1, location.gpu_handle);
//!
//! let value = fence.next_signal(queue)?;
//! cache.add_sync(value);
//! // ...
//! cache.update_completed();
//! ```

mod cache;
mod set;

pub use cache::{
    DescriptorCache, DescriptorCacheDescriptor, DescriptorLocation, EntryKey, PutBatch, SubHeapId,
    SubHeapState,
};
pub use set::{DescriptorHandles, DescriptorSet};
