use std::collections::VecDeque;
use std::ptr::NonNull;
use std::sync::Arc;

use bytemuck::Pod;

use crate::backend::GpuDevice;
use crate::error::TransientError;
use crate::fence::CounterFence;
use crate::types::{GpuVirtualAddress, ResourceDescriptor, ResourceHandle, align_up};

use super::{BlockId, BufferSlice, CONSTANT_BUFFER_ALIGNMENT, CircularHeapDescriptor, Cursor};

/// One fixed-size, persistently mapped backing allocation.
///
/// Blocks form a singly linked circular list through `next` and are only
/// destroyed when the heap is dropped.
#[derive(Debug)]
struct Block {
    resource: ResourceHandle,
    mapped: NonNull<u8>,
    gpu_address: GpuVirtualAddress,
    next: BlockId,
}

/// A `front` snapshot waiting for its fence value to complete.
#[derive(Debug, Clone, Copy)]
struct PendingCursor {
    value: u64,
    cursor: Cursor,
}

/// Ring of CPU-mapped GPU blocks allocated per submission.
///
/// The ring is split by two cursors:
/// - `front`: the next free byte. Allocation advances it.
/// - `back`: the oldest byte the GPU may still read. Reclamation advances it.
///
/// Everything from `back` to `front` is reserved; everything from `front` back
/// round to `back` is free. When `front` and `back` share a block, `front` is
/// never behind `back`, so a new block can always be spliced in right after
/// `front` when the ring is full.
///
/// # Thread Safety
///
/// `CircularResourceHeap` is NOT thread-safe. One thread allocates and calls
/// [`add_sync`](Self::add_sync) / [`update_completed`](Self::update_completed).
pub struct CircularResourceHeap {
    device: Arc<dyn GpuDevice>,
    fence: Arc<CounterFence>,
    descriptor: CircularHeapDescriptor,
    blocks: Vec<Block>,
    front: Cursor,
    back: Cursor,
    pending: VecDeque<PendingCursor>,
}

// SAFETY: the mapped pointers address memory owned by the heap's blocks and
// are only dereferenced through `&mut self`.
unsafe impl Send for CircularResourceHeap {}

impl CircularResourceHeap {
    /// Create an empty heap. No block is allocated until the first allocation.
    pub fn new(
        device: Arc<dyn GpuDevice>,
        descriptor: CircularHeapDescriptor,
        fence: Arc<CounterFence>,
    ) -> Result<Self, TransientError> {
        descriptor.validate()?;
        log::debug!(
            "CircularResourceHeap: created {:?} (block size {})",
            descriptor.label,
            descriptor.block_size
        );
        Ok(Self {
            device,
            fence,
            descriptor,
            blocks: Vec::new(),
            front: Cursor::new(BlockId::new(0), 0),
            back: Cursor::new(BlockId::new(0), 0),
            pending: VecDeque::new(),
        })
    }

    /// The descriptor the heap was created with.
    pub fn descriptor(&self) -> &CircularHeapDescriptor {
        &self.descriptor
    }

    /// Size of every block.
    pub fn block_size(&self) -> u64 {
        self.descriptor.block_size
    }

    /// Number of blocks in the ring.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Next free position, or `None` before the first allocation.
    pub fn front(&self) -> Option<Cursor> {
        (!self.blocks.is_empty()).then_some(self.front)
    }

    /// Oldest position the GPU may still read, or `None` before the first allocation.
    pub fn back(&self) -> Option<Cursor> {
        (!self.blocks.is_empty()).then_some(self.back)
    }

    /// Number of sync points not yet confirmed by the GPU.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is reserved between `back` and `front`.
    pub fn is_empty(&self) -> bool {
        self.front == self.back
    }

    /// The fence this heap reclaims against.
    pub fn fence(&self) -> &Arc<CounterFence> {
        &self.fence
    }

    /// Allocate `size` bytes aligned to `alignment` (a power of two).
    ///
    /// The memory is exclusively writable by the caller until the next
    /// [`add_sync`](Self::add_sync). Nothing beyond `size` is bounds checked
    /// by the GPU, so writes must stay inside the allocation.
    ///
    /// # Errors
    ///
    /// - [`TransientError::AllocationTooLarge`] if `size` exceeds the block size.
    /// - [`TransientError::InvalidParameter`] if `alignment` is not a power of two.
    /// - [`TransientError::ResourceExhausted`] if a new block is needed and the
    ///   backend is out of memory.
    pub fn allocate(&mut self, size: u64, alignment: u64) -> Result<Cursor, TransientError> {
        crate::profile_scope!("CircularResourceHeap::allocate");

        if !alignment.is_power_of_two() {
            return Err(TransientError::InvalidParameter(format!(
                "alignment must be a power of 2, got {alignment}"
            )));
        }
        let block_size = self.descriptor.block_size;
        if size > block_size {
            return Err(TransientError::AllocationTooLarge {
                size,
                alignment,
                block_size,
            });
        }

        if self.blocks.is_empty() {
            let block = self.create_block()?;
            self.front = Cursor::new(block, 0);
            self.back = self.front;
        }

        // Common path: the request fits behind `front` in the current block.
        if let Some(start) = align_up(self.front.offset, alignment) {
            if start.checked_add(size).is_some_and(|end| end <= block_size) {
                let cursor = Cursor::new(self.front.block, start);
                self.front.offset = start + size;
                log::trace!(
                    "CircularResourceHeap: allocated {} bytes at {:?}",
                    size,
                    cursor
                );
                return Ok(cursor);
            }
        }

        // Roll over to the next block. If `back` is anchored there, the ring is
        // full and a fresh block is spliced in after the current one.
        let current = self.front.block;
        let next = self.blocks[current.index()].next;
        let target = if next == self.back.block {
            let block = self.create_block()?;
            self.blocks[block.index()].next = next;
            self.blocks[current.index()].next = block;
            log::debug!(
                "CircularResourceHeap: ring {:?} full, spliced block {} ({} blocks)",
                self.descriptor.label,
                block.index(),
                self.blocks.len()
            );
            crate::profile_plot!("CircularResourceHeap blocks", self.blocks.len());
            block
        } else {
            next
        };

        // Offset 0 satisfies every alignment, and `size <= block_size` was checked.
        self.front = Cursor::new(target, size);
        let cursor = Cursor::new(target, 0);
        log::trace!(
            "CircularResourceHeap: allocated {} bytes at {:?} (rolled over)",
            size,
            cursor
        );
        Ok(cursor)
    }

    /// Allocate a constant buffer: size and placement rounded to 256 bytes.
    pub fn allocate_constant_buffer(&mut self, size: u64) -> Result<BufferSlice, TransientError> {
        let padded = align_up(size, CONSTANT_BUFFER_ALIGNMENT).ok_or(
            TransientError::AllocationTooLarge {
                size,
                alignment: CONSTANT_BUFFER_ALIGNMENT,
                block_size: self.descriptor.block_size,
            },
        )?;
        let cursor = self.allocate(padded, CONSTANT_BUFFER_ALIGNMENT)?;
        Ok(BufferSlice {
            cursor,
            gpu_address: self.gpu_address(cursor),
            size: padded,
        })
    }

    /// Allocate space for `data`, copy it in and return where it landed.
    pub fn upload<T: Pod>(
        &mut self,
        data: &[T],
        alignment: u64,
    ) -> Result<BufferSlice, TransientError> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let size = bytes.len() as u64;
        let cursor = self.allocate(size, alignment)?;
        self.write(cursor, bytes)?;
        Ok(BufferSlice {
            cursor,
            gpu_address: self.gpu_address(cursor),
            size,
        })
    }

    /// Allocate a constant buffer holding `value`.
    pub fn upload_constants<T: Pod>(&mut self, value: &T) -> Result<BufferSlice, TransientError> {
        let bytes = bytemuck::bytes_of(value);
        let slice = self.allocate_constant_buffer(bytes.len() as u64)?;
        self.write(slice.cursor, bytes)?;
        Ok(slice)
    }

    /// GPU virtual address of a cursor.
    pub fn gpu_address(&self, cursor: Cursor) -> GpuVirtualAddress {
        self.blocks[cursor.block.index()].gpu_address + cursor.offset
    }

    /// CPU-writable view of `len` bytes starting at `cursor`.
    pub fn mapped_slice_mut(
        &mut self,
        cursor: Cursor,
        len: usize,
    ) -> Result<&mut [u8], TransientError> {
        let block = self.blocks.get(cursor.block.index()).ok_or_else(|| {
            TransientError::InvalidParameter(format!("unknown block {}", cursor.block.index()))
        })?;
        let end = cursor.offset.checked_add(len as u64);
        if end.is_none_or(|end| end > self.descriptor.block_size) {
            return Err(TransientError::InvalidParameter(format!(
                "range {}..+{} exceeds block size {}",
                cursor.offset, len, self.descriptor.block_size
            )));
        }
        // SAFETY: the range lies inside the block's mapping, which lives as long
        // as the heap, and `&mut self` rules out any other view into it.
        let slice = unsafe {
            std::slice::from_raw_parts_mut(block.mapped.as_ptr().add(cursor.offset as usize), len)
        };
        Ok(slice)
    }

    /// Copy `data` into the ring at `cursor`.
    pub fn write(&mut self, cursor: Cursor, data: &[u8]) -> Result<(), TransientError> {
        self.mapped_slice_mut(cursor, data.len())?
            .copy_from_slice(data);
        Ok(())
    }

    /// Record a sync point for everything allocated so far.
    ///
    /// `signal_value` must be the value just returned by
    /// [`CounterFence::next_signal`] for the queue that consumed the
    /// allocations. Values must arrive in increasing order. After this call
    /// earlier cursors must not be written to.
    pub fn add_sync(&mut self, signal_value: u64) {
        crate::profile_scope!("CircularResourceHeap::add_sync");

        if let Some(last) = self.pending.back() {
            debug_assert!(
                signal_value > last.value,
                "add_sync values out of order: {} after {}",
                signal_value,
                last.value
            );
            if signal_value <= last.value {
                log::warn!(
                    "CircularResourceHeap: add_sync({}) after add_sync({})",
                    signal_value,
                    last.value
                );
            }
        }

        if self.blocks.is_empty() {
            log::trace!("CircularResourceHeap: add_sync({signal_value}) before first allocation");
            return;
        }

        self.pending.push_back(PendingCursor {
            value: signal_value,
            cursor: self.front,
        });
    }

    /// Reclaim everything the GPU has finished reading.
    ///
    /// Pops sync points whose value the fence reports as completed, in order,
    /// moving `back` to each one. Returns the number of sync points retired.
    pub fn update_completed(&mut self) -> usize {
        crate::profile_scope!("CircularResourceHeap::update_completed");

        let completed = self.fence.completed_value();
        let mut retired = 0;
        while let Some(entry) = self.pending.front().copied() {
            if entry.value > completed {
                break;
            }
            self.back = entry.cursor;
            self.pending.pop_front();
            retired += 1;
        }

        if retired > 0 {
            log::trace!(
                "CircularResourceHeap: retired {} sync points up to {}, back at {:?}",
                retired,
                completed,
                self.back
            );
        }
        retired
    }

    fn create_block(&mut self) -> Result<BlockId, TransientError> {
        let id = BlockId::new(self.blocks.len());
        let label = self.descriptor.label.as_deref().unwrap_or("circular_heap");
        let resource_desc = ResourceDescriptor::new(self.descriptor.block_size)
            .with_label(format!("{label}_block{}", id.index()))
            .with_heap_kind(self.descriptor.heap_kind)
            .with_heap_flags(self.descriptor.heap_flags)
            .with_initial_state(self.descriptor.initial_state);

        let resource = self.device.create_committed_resource(&resource_desc)?;
        let mapped = match self.device.map_resource(resource) {
            Ok(mapped) => mapped,
            Err(e) => {
                self.device.destroy_resource(resource);
                return Err(e.into());
            }
        };
        let gpu_address = self.device.gpu_virtual_address(resource);

        self.blocks.push(Block {
            resource,
            mapped,
            gpu_address,
            next: id,
        });
        log::debug!(
            "CircularResourceHeap: created block {} for {:?} at 0x{:x}",
            id.index(),
            self.descriptor.label,
            gpu_address
        );
        Ok(id)
    }

    /// Block that follows `block` in the ring.
    #[cfg(test)]
    fn next_block(&self, block: BlockId) -> BlockId {
        self.blocks[block.index()].next
    }

    /// Resource backing a block.
    #[cfg(test)]
    fn block_resource(&self, block: BlockId) -> ResourceHandle {
        self.blocks[block.index()].resource
    }
}

impl Drop for CircularResourceHeap {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            log::debug!(
                "CircularResourceHeap: dropping {:?} with {} unretired sync points",
                self.descriptor.label,
                self.pending.len()
            );
        }
        for block in self.blocks.drain(..) {
            self.device.destroy_resource(block.resource);
        }
    }
}

impl std::fmt::Debug for CircularResourceHeap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircularResourceHeap")
            .field("label", &self.descriptor.label)
            .field("block_size", &self.descriptor.block_size)
            .field("blocks", &self.blocks.len())
            .field("front", &self.front)
            .field("back", &self.back)
            .field("pending", &self.pending.len())
            .finish()
    }
}

static_assertions::assert_impl_all!(CircularResourceHeap: Send);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyDevice;
    use crate::types::QueueHandle;

    const QUEUE: QueueHandle = QueueHandle(0);

    struct Harness {
        device: Arc<DummyDevice>,
        fence: Arc<CounterFence>,
        heap: CircularResourceHeap,
    }

    impl Harness {
        fn new(block_size: u64) -> Self {
            let device = Arc::new(DummyDevice::new());
            let fence = Arc::new(CounterFence::new(device.clone(), 0).unwrap());
            let heap = CircularResourceHeap::new(
                device.clone(),
                CircularHeapDescriptor::new(block_size).with_label("test"),
                fence.clone(),
            )
            .unwrap();
            Self {
                device,
                fence,
                heap,
            }
        }

        fn submit(&mut self) -> u64 {
            let value = self.fence.next_signal(QUEUE).unwrap();
            self.heap.add_sync(value);
            value
        }

        fn complete(&self, value: u64) {
            self.device.complete_fence(self.fence.handle(), value);
        }

        /// Blocks from `back` to `front`, walking the ring.
        fn reserved_blocks(&self) -> Vec<BlockId> {
            let front = self.heap.front().unwrap();
            let mut block = self.heap.back().unwrap().block;
            let mut out = vec![block];
            while block != front.block {
                block = self.heap.next_block(block);
                out.push(block);
            }
            out
        }

        fn check_ring_invariant(&self) {
            if let (Some(front), Some(back)) = (self.heap.front(), self.heap.back()) {
                if front.block == back.block {
                    assert!(
                        front.offset >= back.offset,
                        "front {front:?} behind back {back:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_no_block_before_first_allocation() {
        let h = Harness::new(4096);
        assert_eq!(h.heap.block_count(), 0);
        assert!(h.heap.front().is_none());
        assert!(h.heap.back().is_none());
        assert_eq!(h.device.live_resource_count(), 0);
    }

    #[test]
    fn test_first_allocation_creates_single_block_ring() {
        let mut h = Harness::new(4096);
        let cursor = h.heap.allocate(64, 16).unwrap();
        assert_eq!(cursor, Cursor::new(BlockId::new(0), 0));
        assert_eq!(h.heap.block_count(), 1);
        assert_eq!(h.heap.next_block(BlockId::new(0)), BlockId::new(0));
        assert_eq!(h.heap.back(), Some(Cursor::new(BlockId::new(0), 0)));
        assert_eq!(h.heap.front(), Some(Cursor::new(BlockId::new(0), 64)));
    }

    #[test]
    fn test_sequential_allocations_share_block() {
        let mut h = Harness::new(4096);
        let first = h.heap.allocate(100, 16).unwrap();
        let second = h.heap.allocate(100, 16).unwrap();

        assert_eq!(first.block, second.block);
        assert!(second.offset >= align_up(first.offset + 100, 16).unwrap());
        assert_eq!(second.offset, 112);
        assert_eq!(h.heap.block_count(), 1);
    }

    #[test]
    fn test_rollover_to_new_block() {
        let mut h = Harness::new(4096);
        let first = h.heap.allocate(4000, 16).unwrap();
        let second = h.heap.allocate(200, 16).unwrap();

        assert_ne!(first.block, second.block);
        assert_eq!(second.offset, 0);
        assert_eq!(h.heap.block_count(), 2);
        assert_eq!(h.heap.front(), Some(Cursor::new(second.block, 200)));
        h.check_ring_invariant();
    }

    #[test]
    fn test_oversize_allocation_is_typed_error() {
        let mut h = Harness::new(4096);
        assert_eq!(
            h.heap.allocate(4097, 16),
            Err(TransientError::AllocationTooLarge {
                size: 4097,
                alignment: 16,
                block_size: 4096,
            })
        );
        assert_eq!(h.heap.block_count(), 0);
    }

    #[test]
    fn test_invalid_alignment() {
        let mut h = Harness::new(4096);
        assert!(matches!(
            h.heap.allocate(16, 24),
            Err(TransientError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_full_block_allocation() {
        let mut h = Harness::new(4096);
        let cursor = h.heap.allocate(4096, 256).unwrap();
        assert_eq!(cursor.offset, 0);
        let next = h.heap.allocate(1, 1).unwrap();
        assert_ne!(next.block, cursor.block);
    }

    #[test]
    fn test_update_completed_waits_for_fence() {
        let mut h = Harness::new(4096);
        h.heap.allocate(1000, 16).unwrap();
        let value = h.submit();
        let snapshot = h.heap.front().unwrap();

        assert_eq!(h.heap.update_completed(), 0);
        assert_eq!(h.heap.back(), Some(Cursor::new(BlockId::new(0), 0)));

        h.complete(value);
        assert_eq!(h.heap.update_completed(), 1);
        assert_eq!(h.heap.back(), Some(snapshot));
        assert!(h.heap.is_empty());
        assert_eq!(h.heap.pending_len(), 0);
    }

    #[test]
    fn test_update_completed_stops_at_first_unfinished_entry() {
        let mut h = Harness::new(4096);
        h.heap.allocate(100, 16).unwrap();
        let first = h.submit();
        let first_snapshot = h.heap.front().unwrap();
        h.heap.allocate(100, 16).unwrap();
        let _second = h.submit();

        h.complete(first);
        assert_eq!(h.heap.update_completed(), 1);
        assert_eq!(h.heap.back(), Some(first_snapshot));
        assert_eq!(h.heap.pending_len(), 1);
    }

    #[test]
    fn test_reclaimed_block_is_reused() {
        let mut h = Harness::new(4096);

        // Fill block 0 and spill into block 1.
        h.heap.allocate(3000, 16).unwrap();
        h.heap.allocate(3000, 16).unwrap();
        let value = h.submit();
        assert_eq!(h.heap.block_count(), 2);

        h.complete(value);
        h.heap.update_completed();
        assert_eq!(h.heap.back().unwrap().block, BlockId::new(1));

        // Block 1 fills up, block 0 is free again and gets reused.
        let cursor = h.heap.allocate(2000, 16).unwrap();
        assert_eq!(cursor.block, BlockId::new(0));
        assert_eq!(cursor.offset, 0);
        assert_eq!(h.heap.block_count(), 2);
        h.check_ring_invariant();
    }

    #[test]
    fn test_ring_grows_while_gpu_is_behind() {
        let mut h = Harness::new(1024);
        for _ in 0..8 {
            h.heap.allocate(1024, 16).unwrap();
            h.submit();
            h.check_ring_invariant();
        }
        assert_eq!(h.heap.block_count(), 8);
        assert_eq!(h.device.live_resource_count(), 8);
    }

    #[test]
    fn test_reserved_ranges_never_overlap_new_allocations() {
        // Pseudo-random allocation sizes, GPU trailing two submissions behind.
        let mut h = Harness::new(2048);
        let mut live: Vec<(u64, Cursor, u64)> = Vec::new();
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut submitted = Vec::new();

        for frame in 0..200 {
            let count = 1 + (frame % 5);
            for _ in 0..count {
                seed ^= seed << 13;
                seed ^= seed >> 7;
                seed ^= seed << 17;
                let size = 1 + seed % 900;
                let alignment = 1u64 << (seed % 9);
                let cursor = h.heap.allocate(size, alignment).unwrap();
                assert_eq!(cursor.offset % alignment, 0);
                assert!(cursor.offset + size <= 2048);

                for &(_, other, other_size) in &live {
                    if other.block == cursor.block {
                        let disjoint = cursor.offset + size <= other.offset
                            || other.offset + other_size <= cursor.offset;
                        assert!(disjoint, "{cursor:?}+{size} overlaps {other:?}+{other_size}");
                    }
                }
                live.push((u64::MAX, cursor, size));
            }

            let value = h.submit();
            for entry in live.iter_mut().filter(|e| e.0 == u64::MAX) {
                entry.0 = value;
            }
            submitted.push(value);

            if submitted.len() > 2 {
                let done = submitted.remove(0);
                h.complete(done);
                let back_before = h.reserved_blocks().len();
                h.heap.update_completed();
                assert!(h.reserved_blocks().len() <= back_before);
                live.retain(|e| e.0 > done);
            }
            h.check_ring_invariant();
        }

        // Steady state: the ring stopped growing long ago.
        assert!(h.heap.block_count() < 10);
    }

    #[test]
    fn test_upload_writes_bytes() {
        let mut h = Harness::new(4096);
        let data: [u32; 4] = [1, 2, 3, 4];
        let slice = h.heap.upload(&data, 16).unwrap();
        assert_eq!(slice.size, 16);

        let resource = h.heap.block_resource(slice.cursor.block);
        let bytes = h
            .device
            .read_resource(resource, slice.cursor.offset, slice.size as usize);
        assert_eq!(bytes, bytemuck::cast_slice::<u32, u8>(&data));
        assert_eq!(
            slice.gpu_address,
            h.device.gpu_virtual_address(resource) + slice.cursor.offset
        );
    }

    #[test]
    fn test_upload_constants_is_placement_aligned() {
        let mut h = Harness::new(4096);
        h.heap.allocate(10, 1).unwrap();
        let slice = h.heap.upload_constants(&[1.0f32, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(slice.cursor.offset, 256);
        assert_eq!(slice.size, 256);
        assert_eq!(slice.gpu_address % CONSTANT_BUFFER_ALIGNMENT, 0);
    }

    #[test]
    fn test_mapped_slice_bounds() {
        let mut h = Harness::new(4096);
        let cursor = h.heap.allocate(64, 16).unwrap();
        assert_eq!(h.heap.mapped_slice_mut(cursor, 64).unwrap().len(), 64);
        assert!(
            h.heap
                .mapped_slice_mut(Cursor::new(cursor.block, 4000), 200)
                .is_err()
        );
        assert!(
            h.heap
                .mapped_slice_mut(Cursor::new(BlockId::new(7), 0), 1)
                .is_err()
        );
    }

    #[test]
    fn test_block_creation_failure_is_resource_exhausted() {
        let device = Arc::new(DummyDevice::new().with_memory_budget(8192));
        let fence = Arc::new(CounterFence::new(device.clone(), 0).unwrap());
        let mut heap = CircularResourceHeap::new(
            device.clone(),
            CircularHeapDescriptor::new(4096),
            fence.clone(),
        )
        .unwrap();

        heap.allocate(4096, 16).unwrap();
        heap.add_sync(fence.next_signal(QUEUE).unwrap());
        heap.allocate(4096, 16).unwrap();
        heap.add_sync(fence.next_signal(QUEUE).unwrap());
        assert_eq!(heap.block_count(), 2);

        let result = heap.allocate(16, 16);
        assert!(matches!(result, Err(TransientError::ResourceExhausted(_))));

        // Once the GPU catches up the existing blocks are enough.
        device.complete_all();
        assert_eq!(heap.update_completed(), 2);
        assert!(heap.allocate(16, 16).is_ok());
        assert_eq!(heap.block_count(), 2);
    }

    #[test]
    fn test_drop_releases_blocks() {
        let device;
        {
            let mut h = Harness::new(1024);
            h.heap.allocate(1024, 1).unwrap();
            h.heap.allocate(1024, 1).unwrap();
            assert_eq!(h.device.live_resource_count(), 2);
            device = h.device.clone();
        }
        assert_eq!(device.live_resource_count(), 0);
    }

    #[test]
    fn test_non_cpu_visible_heap_rejected() {
        let device = Arc::new(DummyDevice::new());
        let fence = Arc::new(CounterFence::new(device.clone(), 0).unwrap());
        let result = CircularResourceHeap::new(
            device,
            CircularHeapDescriptor::new(4096).with_heap_kind(crate::types::HeapKind::Default),
            fence,
        );
        assert!(result.is_err());
    }
}
