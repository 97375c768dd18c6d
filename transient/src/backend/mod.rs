//! GPU device abstraction layer.
//!
//! This module provides the trait the managers in this crate talk to instead
//! of a concrete graphics API. Every operation maps 1:1 onto a native API
//! call (committed resource creation, mapping, fences, OS events, descriptor
//! heap creation and descriptor copies).
//!
//! # Available Backends
//!
//! - [`dummy`]: Host-memory backend with a simulated GPU timeline, used for
//!   testing and headless development.
//!
//! Native backends live with the renderer that owns the device and implement
//! [`GpuDevice`] on top of their API objects.
//!
//! # Dependency Injection
//!
//! Nothing in this crate reaches for a global device or queue. Managers hold
//! an `Arc<dyn GpuDevice>` handed to their constructor, and queues are passed
//! to every call that submits work.

pub mod dummy;
mod error;

use std::ptr::NonNull;

pub use dummy::DummyDevice;
pub use error::BackendError;

use crate::types::{
    CpuDescriptorHandle, DescriptorHeapDescriptor, DescriptorHeapHandle, DescriptorHeapInfo,
    DescriptorHeapType, DescriptorKind, EventHandle, FenceHandle, GpuVirtualAddress, QueueHandle,
    ResourceDescriptor, ResourceHandle,
};

/// GPU device trait for abstracting different graphics APIs.
pub trait GpuDevice: Send + Sync + 'static {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    // ------------------------------------------------------------------
    // Fences and events
    // ------------------------------------------------------------------

    /// Create a fence whose completed value starts at `initial_value`.
    fn create_fence(&self, initial_value: u64) -> Result<FenceHandle, BackendError>;

    /// Destroy a fence.
    fn destroy_fence(&self, fence: FenceHandle);

    /// Enqueue a command on `queue` that sets `fence` to `value` once all
    /// previously submitted work on the queue has finished.
    fn signal(
        &self,
        queue: QueueHandle,
        fence: FenceHandle,
        value: u64,
    ) -> Result<(), BackendError>;

    /// Last value the GPU has written to `fence`.
    fn completed_value(&self, fence: FenceHandle) -> u64;

    /// Create an OS waitable event.
    fn create_event(&self) -> Result<EventHandle, BackendError>;

    /// Destroy an OS event.
    fn destroy_event(&self, event: EventHandle);

    /// Arrange for `event` to be set when `fence` reaches `value`.
    fn set_event_on_completion(
        &self,
        fence: FenceHandle,
        value: u64,
        event: EventHandle,
    ) -> Result<(), BackendError>;

    /// Block the calling thread until `event` is set. There is no timeout.
    fn wait_event(&self, event: EventHandle);

    // ------------------------------------------------------------------
    // Committed resources
    // ------------------------------------------------------------------

    /// Create a committed buffer resource with its own implicit heap.
    fn create_committed_resource(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> Result<ResourceHandle, BackendError>;

    /// Map a CPU-visible resource.
    ///
    /// The returned pointer addresses `descriptor.size` bytes and stays valid
    /// until the resource is destroyed.
    fn map_resource(&self, resource: ResourceHandle) -> Result<NonNull<u8>, BackendError>;

    /// GPU virtual address of the first byte of a resource.
    fn gpu_virtual_address(&self, resource: ResourceHandle) -> GpuVirtualAddress;

    /// Unmap (if mapped) and destroy a resource.
    fn destroy_resource(&self, resource: ResourceHandle);

    // ------------------------------------------------------------------
    // Descriptor heaps
    // ------------------------------------------------------------------

    /// Create a descriptor heap.
    fn create_descriptor_heap(
        &self,
        descriptor: &DescriptorHeapDescriptor,
    ) -> Result<DescriptorHeapInfo, BackendError>;

    /// Destroy a descriptor heap.
    fn destroy_descriptor_heap(&self, heap: DescriptorHeapHandle);

    /// Byte distance between consecutive descriptors of a heap type.
    fn descriptor_increment_size(&self, heap_type: DescriptorHeapType) -> u32;

    /// Copy single descriptors from `sources` into consecutive slots starting at `dst`.
    fn copy_descriptors(
        &self,
        dst: CpuDescriptorHandle,
        sources: &[CpuDescriptorHandle],
        heap_type: DescriptorHeapType,
    );

    /// Copy `count` consecutive descriptors starting at `src` to `dst`.
    fn copy_descriptors_simple(
        &self,
        count: u32,
        dst: CpuDescriptorHandle,
        src: CpuDescriptorHandle,
        heap_type: DescriptorHeapType,
    );

    /// Write a well-defined null descriptor of the given kind to `dst`.
    fn create_null_descriptor(&self, kind: DescriptorKind, dst: CpuDescriptorHandle);
}
