//! Circular resource heap for per-submission GPU data.
//!
//! A [`CircularResourceHeap`] hands out sub-ranges of CPU-mapped upload
//! memory (constant buffers, dynamic vertex and index data) and reclaims them
//! once a [`CounterFence`](crate::fence::CounterFence) confirms the GPU is
//! done with them.
//!
//! # Usage
//!
//! ```ignore
//! let mut ring = CircularResourceHeap::new(
//!     device.clone(),
//!     CircularHeapDescriptor::new(64 * 1024).with_label("frame_constants"),
//!     fence.clone(),
//! )?;
//!
//! // Record a submission
//! let camera = ring.upload_constants(&camera_uniforms)?;
//! cmd.set_constant_buffer(0, camera.gpu_address);
//!
//! // After submitting it
//! let value = fence.next_signal(queue)?;
//! ring.add_sync(value);
//!
//! // Any time later, typically at the start of the next frame
//! ring.update_completed();
//! ```

mod circular;

pub use circular::CircularResourceHeap;

use crate::error::TransientError;
use crate::types::{GpuVirtualAddress, HeapFlags, HeapKind, ResourceStates};

/// Placement alignment the GPU requires for constant buffer views.
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;

/// Index of a block in a heap's block pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(u32);

impl BlockId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the block in the pool.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A position inside the ring: a block and a byte offset into it.
///
/// Also the unit returned by an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    /// Block the position lies in.
    pub block: BlockId,
    /// Byte offset from the start of the block.
    pub offset: u64,
}

impl Cursor {
    /// Create a cursor.
    pub fn new(block: BlockId, offset: u64) -> Self {
        Self { block, offset }
    }
}

/// An allocation that has been filled with data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferSlice {
    /// Where the data lives in the ring.
    pub cursor: Cursor,
    /// GPU virtual address of the first byte.
    pub gpu_address: GpuVirtualAddress,
    /// Size of the data in bytes.
    pub size: u64,
}

/// Descriptor for creating a circular resource heap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CircularHeapDescriptor {
    /// Debug label, used to name the blocks.
    pub label: Option<String>,
    /// Size of every block, and so the upper bound of a single allocation.
    pub block_size: u64,
    /// Memory pool of the backing blocks. Must be CPU visible.
    pub heap_kind: HeapKind,
    /// Flags of the backing blocks' implicit heaps.
    pub heap_flags: HeapFlags,
    /// State the blocks are created in.
    pub initial_state: ResourceStates,
}

impl CircularHeapDescriptor {
    /// Default block size (64 KB).
    pub const DEFAULT_BLOCK_SIZE: u64 = 64 * 1024;

    /// Create a descriptor for an upload heap with the given block size.
    pub fn new(block_size: u64) -> Self {
        Self {
            label: None,
            block_size,
            heap_kind: HeapKind::Upload,
            heap_flags: HeapFlags::empty(),
            initial_state: ResourceStates::GENERIC_READ,
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

    /// Check the descriptor for values no heap can work with.
    pub fn validate(&self) -> Result<(), TransientError> {
        if self.block_size == 0 {
            return Err(TransientError::InvalidParameter(
                "block size cannot be zero".to_string(),
            ));
        }
        if !self.heap_kind.is_cpu_visible() {
            return Err(TransientError::InvalidParameter(format!(
                "circular heap blocks must be CPU visible, got {:?}",
                self.heap_kind
            )));
        }
        Ok(())
    }
}

impl Default for CircularHeapDescriptor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BLOCK_SIZE)
    }
}
