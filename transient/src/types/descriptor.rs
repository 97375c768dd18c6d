//! Descriptor handle and descriptor heap types.

use bitflags::bitflags;

/// CPU-side descriptor handle.
///
/// A zero pointer is the null handle. Descriptors of one heap are laid out
/// contiguously, `increment` bytes apart.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct CpuDescriptorHandle {
    /// Address of the descriptor.
    pub ptr: usize,
}

impl CpuDescriptorHandle {
    /// The null handle.
    pub const NULL: Self = Self { ptr: 0 };

    /// Create a handle from a raw address.
    pub const fn new(ptr: usize) -> Self {
        Self { ptr }
    }

    /// Whether this is the null handle.
    pub const fn is_null(self) -> bool {
        self.ptr == 0
    }

    /// Handle `index` descriptors after this one.
    pub const fn offset(self, index: u32, increment: u32) -> Self {
        Self {
            ptr: self.ptr + index as usize * increment as usize,
        }
    }
}

/// GPU-side descriptor handle, used for binding descriptor tables.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GpuDescriptorHandle {
    /// GPU address of the descriptor.
    pub ptr: u64,
}

impl GpuDescriptorHandle {
    /// Create a handle from a raw address.
    pub const fn new(ptr: u64) -> Self {
        Self { ptr }
    }

    /// Handle `index` descriptors after this one.
    pub const fn offset(self, index: u32, increment: u32) -> Self {
        Self {
            ptr: self.ptr + index as u64 * increment as u64,
        }
    }
}

/// Category of a descriptor heap. Exactly one heap per category can be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DescriptorHeapType {
    /// Constant buffer, shader resource and unordered access views.
    #[default]
    CbvSrvUav,
    /// Samplers.
    Sampler,
    /// Render target views.
    Rtv,
    /// Depth stencil views.
    Dsv,
}

bitflags! {
    /// Flags for descriptor heap creation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DescriptorHeapFlags: u32 {
        /// Heap can be bound and read by shaders.
        const SHADER_VISIBLE = 1 << 0;
    }
}

impl Default for DescriptorHeapFlags {
    fn default() -> Self {
        Self::SHADER_VISIBLE
    }
}

/// View type of the descriptors in a set.
///
/// Used to synthesize a well-defined placeholder when a set contains null
/// handles, since binding a truly null descriptor is undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DescriptorKind {
    /// Constant buffer views.
    Cbv,
    /// Shader resource views.
    #[default]
    Srv,
    /// Unordered access views.
    Uav,
    /// Samplers.
    Sampler,
    /// Anything without a typed null placeholder.
    Other,
}

/// Opaque handle to a backend descriptor heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorHeapHandle(pub u64);

/// Descriptor for creating a descriptor heap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DescriptorHeapDescriptor {
    /// Debug label for the heap.
    pub label: Option<String>,
    /// Heap category.
    pub heap_type: DescriptorHeapType,
    /// Creation flags.
    pub flags: DescriptorHeapFlags,
    /// Number of descriptor slots.
    pub num_descriptors: u32,
}

impl DescriptorHeapDescriptor {
    /// Create a new descriptor heap descriptor.
    pub fn new(heap_type: DescriptorHeapType, num_descriptors: u32) -> Self {
        Self {
            label: None,
            heap_type,
            flags: DescriptorHeapFlags::default(),
            num_descriptors,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the creation flags.
    pub fn with_flags(mut self, flags: DescriptorHeapFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// A created descriptor heap, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorHeapInfo {
    /// Backend handle.
    pub handle: DescriptorHeapHandle,
    /// CPU handle of slot 0.
    pub cpu_start: CpuDescriptorHandle,
    /// GPU handle of slot 0. Zero for heaps that are not shader visible.
    pub gpu_start: GpuDescriptorHandle,
    /// Byte distance between consecutive slots.
    pub increment: u32,
    /// Number of slots.
    pub num_descriptors: u32,
}

impl DescriptorHeapInfo {
    /// CPU handle of slot `index`.
    pub fn cpu_handle(&self, index: u32) -> CpuDescriptorHandle {
        debug_assert!(index <= self.num_descriptors);
        self.cpu_start.offset(index, self.increment)
    }

    /// GPU handle of slot `index`.
    pub fn gpu_handle(&self, index: u32) -> GpuDescriptorHandle {
        debug_assert!(index <= self.num_descriptors);
        self.gpu_start.offset(index, self.increment)
    }
}
