//! Plain value types shared by the backend and the managers.
//!
//! Every handle in this module is an opaque, `Copy` token issued by a
//! [`GpuDevice`](crate::backend::GpuDevice). None of them own anything; the
//! managers that create backend objects are responsible for destroying them.

mod descriptor;
mod resource;

pub use descriptor::{
    CpuDescriptorHandle, DescriptorHeapDescriptor, DescriptorHeapFlags, DescriptorHeapHandle,
    DescriptorHeapInfo, DescriptorHeapType, DescriptorKind, GpuDescriptorHandle,
};
pub use resource::{
    EventHandle, FenceHandle, HeapFlags, HeapKind, QueueHandle, ResourceDescriptor,
    ResourceHandle, ResourceStates,
};

/// GPU virtual address of buffer memory.
pub type GpuVirtualAddress = u64;

/// Align a value up to the given power-of-two alignment.
///
/// Returns `None` on overflow.
#[inline]
pub fn align_up(value: u64, alignment: u64) -> Option<u64> {
    debug_assert!(alignment.is_power_of_two());
    value
        .checked_add(alignment - 1)
        .map(|v| v & !(alignment - 1))
}
