//! Resource, fence and queue types.

use bitflags::bitflags;

/// Opaque handle to a command queue owned by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct QueueHandle(pub u64);

/// Opaque handle to a backend fence object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FenceHandle(pub u64);

/// Opaque handle to an OS waitable event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle(pub u64);

/// Opaque handle to a committed GPU resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(pub u64);

/// Memory pool a committed resource lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HeapKind {
    /// GPU-local memory, not CPU visible.
    Default,
    /// CPU-writable, GPU-readable memory. Used for streamed per-frame data.
    #[default]
    Upload,
    /// GPU-writable, CPU-readable memory.
    Readback,
}

impl HeapKind {
    /// Whether resources in this heap can be mapped for CPU access.
    pub fn is_cpu_visible(self) -> bool {
        matches!(self, Self::Upload | Self::Readback)
    }
}

bitflags! {
    /// Flags for the implicit heap backing a committed resource.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HeapFlags: u32 {
        /// Heap may only contain buffers.
        const ALLOW_ONLY_BUFFERS = 1 << 0;
        /// Heap is shared across adapters or processes.
        const SHARED = 1 << 1;
        /// Heap memory is not zeroed on creation.
        const CREATE_NOT_ZEROED = 1 << 2;
    }
}

impl Default for HeapFlags {
    fn default() -> Self {
        Self::empty()
    }
}

bitflags! {
    /// Resource usage states a committed resource can be created in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResourceStates: u32 {
        /// Resource can be bound as a vertex or constant buffer.
        const VERTEX_AND_CONSTANT_BUFFER = 1 << 0;
        /// Resource can be bound as an index buffer.
        const INDEX_BUFFER = 1 << 1;
        /// Resource can be read by non-pixel shaders.
        const NON_PIXEL_SHADER_RESOURCE = 1 << 2;
        /// Resource can be read by pixel shaders.
        const PIXEL_SHADER_RESOURCE = 1 << 3;
        /// Resource can be used as an indirect argument buffer.
        const INDIRECT_ARGUMENT = 1 << 4;
        /// Resource can be a copy source.
        const COPY_SOURCE = 1 << 5;
        /// Resource can be a copy destination.
        const COPY_DEST = 1 << 6;
        /// Every read state an upload heap resource must start in.
        const GENERIC_READ = Self::VERTEX_AND_CONSTANT_BUFFER.bits()
            | Self::INDEX_BUFFER.bits()
            | Self::NON_PIXEL_SHADER_RESOURCE.bits()
            | Self::PIXEL_SHADER_RESOURCE.bits()
            | Self::INDIRECT_ARGUMENT.bits()
            | Self::COPY_SOURCE.bits();
    }
}

impl Default for ResourceStates {
    fn default() -> Self {
        Self::GENERIC_READ
    }
}

/// Descriptor for creating a committed buffer resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ResourceDescriptor {
    /// Debug label for the resource.
    pub label: Option<String>,
    /// Size in bytes.
    pub size: u64,
    /// Memory pool of the implicit heap.
    pub heap_kind: HeapKind,
    /// Flags of the implicit heap.
    pub heap_flags: HeapFlags,
    /// State the resource is created in.
    pub initial_state: ResourceStates,
}

impl ResourceDescriptor {
    /// Create a new buffer resource descriptor in an upload heap.
    pub fn new(size: u64) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the heap kind.
    pub fn with_heap_kind(mut self, heap_kind: HeapKind) -> Self {
        self.heap_kind = heap_kind;
        self
    }

    /// Set the heap flags.
    pub fn with_heap_flags(mut self, heap_flags: HeapFlags) -> Self {
        self.heap_flags = heap_flags;
        self
    }

    /// Set the initial resource state.
    pub fn with_initial_state(mut self, initial_state: ResourceStates) -> Self {
        self.initial_state = initial_state;
        self
    }
}
