//! Dummy GPU backend for testing and development.
//!
//! This backend doesn't talk to a GPU. Committed resources are host
//! allocations with fake GPU addresses, descriptor heaps are address ranges
//! whose slots hold a `u64` payload, and fences keep a queue of values that
//! were signaled but not yet "executed".
//!
//! By default the simulated GPU only makes progress when told to through
//! [`DummyDevice::complete_fence`] or [`DummyDevice::complete_all`], which lets
//! tests keep work in flight. [`DummyDevice::with_immediate_completion`]
//! completes every signal as soon as it is enqueued.

use std::collections::{HashMap, VecDeque};
use std::ptr::NonNull;

use parking_lot::{Condvar, Mutex};

use crate::types::{
    CpuDescriptorHandle, DescriptorHeapDescriptor, DescriptorHeapFlags, DescriptorHeapHandle,
    DescriptorHeapInfo, DescriptorHeapType, DescriptorKind, EventHandle, FenceHandle,
    GpuDescriptorHandle, GpuVirtualAddress, QueueHandle, ResourceDescriptor, ResourceHandle,
};

use super::{BackendError, GpuDevice};

/// Placement alignment of committed resources.
const RESOURCE_PLACEMENT_ALIGNMENT: u64 = 64 * 1024;

/// First CPU address handed out for descriptor heaps. Zero stays the null handle.
const CPU_DESCRIPTOR_BASE: usize = 0x10_0000;
/// First GPU address handed out for shader-visible descriptor heaps.
const GPU_DESCRIPTOR_BASE: u64 = 0x7_0000_0000;
/// First GPU address handed out for committed resources.
const GPU_RESOURCE_BASE: u64 = 0x1_0000_0000;

#[derive(Debug, Default)]
struct DummyFence {
    completed: u64,
    queued: VecDeque<u64>,
}

impl DummyFence {
    fn complete_up_to(&mut self, value: u64) {
        self.completed = self.completed.max(value);
        while self.queued.front().is_some_and(|&v| v <= value) {
            self.queued.pop_front();
        }
    }
}

struct DummyResource {
    memory: NonNull<u8>,
    size: usize,
    gpu_address: GpuVirtualAddress,
    cpu_visible: bool,
}

// SAFETY: the allocation is owned by the device and only released while the
// state lock is held.
unsafe impl Send for DummyResource {}

impl DummyResource {
    fn allocate(size: usize, gpu_address: GpuVirtualAddress, cpu_visible: bool) -> Self {
        let boxed: Box<[u8]> = vec![0u8; size].into_boxed_slice();
        let raw = Box::into_raw(boxed) as *mut u8;
        Self {
            // Box::into_raw never returns null.
            memory: NonNull::new(raw).unwrap_or(NonNull::dangling()),
            size,
            gpu_address,
            cpu_visible,
        }
    }
}

impl Drop for DummyResource {
    fn drop(&mut self) {
        let slice = std::ptr::slice_from_raw_parts_mut(self.memory.as_ptr(), self.size);
        // SAFETY: `memory`/`size` came from `Box::into_raw` in `allocate`.
        drop(unsafe { Box::from_raw(slice) });
    }
}

#[derive(Default)]
struct DummyState {
    next_id: u64,
    fences: HashMap<u64, DummyFence>,
    events: HashMap<u64, Option<(FenceHandle, u64)>>,
    resources: HashMap<u64, DummyResource>,
    heaps: HashMap<u64, DescriptorHeapInfo>,
    descriptors: HashMap<usize, u64>,
    next_cpu_descriptor: usize,
    next_gpu_descriptor: u64,
    next_gpu_resource: u64,
    allocated_bytes: u64,
    signal_count: u64,
}

impl DummyState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Dummy GPU device.
pub struct DummyDevice {
    state: Mutex<DummyState>,
    progress: Condvar,
    immediate_completion: bool,
    memory_budget: Option<u64>,
    max_descriptor_heaps: Option<usize>,
}

impl DummyDevice {
    /// Create a dummy device whose GPU completes work only on request.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DummyState {
                next_cpu_descriptor: CPU_DESCRIPTOR_BASE,
                next_gpu_descriptor: GPU_DESCRIPTOR_BASE,
                next_gpu_resource: GPU_RESOURCE_BASE,
                ..Default::default()
            }),
            progress: Condvar::new(),
            immediate_completion: false,
            memory_budget: None,
            max_descriptor_heaps: None,
        }
    }

    /// Complete every signal as soon as it is enqueued.
    pub fn with_immediate_completion(mut self) -> Self {
        self.immediate_completion = true;
        self
    }

    /// Fail resource creation with [`BackendError::OutOfMemory`] past `bytes`.
    pub fn with_memory_budget(mut self, bytes: u64) -> Self {
        self.memory_budget = Some(bytes);
        self
    }

    /// Fail descriptor heap creation with [`BackendError::OutOfMemory`] past `count` live heaps.
    pub fn with_max_descriptor_heaps(mut self, count: usize) -> Self {
        self.max_descriptor_heaps = Some(count);
        self
    }

    /// Whether signals complete immediately.
    pub fn completes_immediately(&self) -> bool {
        self.immediate_completion
    }

    // ------------------------------------------------------------------
    // Simulated GPU progress
    // ------------------------------------------------------------------

    /// Let the simulated GPU reach `value` on `fence`.
    pub fn complete_fence(&self, fence: FenceHandle, value: u64) {
        let mut state = self.state.lock();
        if let Some(f) = state.fences.get_mut(&fence.0) {
            f.complete_up_to(value);
            log::trace!("DummyDevice: fence {} completed up to {}", fence.0, f.completed);
        }
        drop(state);
        self.progress.notify_all();
    }

    /// Let the simulated GPU finish every signal enqueued so far.
    pub fn complete_all(&self) {
        let mut state = self.state.lock();
        for fence in state.fences.values_mut() {
            if let Some(&last) = fence.queued.back() {
                fence.complete_up_to(last);
            }
        }
        drop(state);
        self.progress.notify_all();
    }

    /// Values signaled on `fence` that the simulated GPU has not reached yet.
    pub fn queued_signals(&self, fence: FenceHandle) -> Vec<u64> {
        let state = self.state.lock();
        state
            .fences
            .get(&fence.0)
            .map(|f| f.queued.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Total number of signal commands enqueued on this device.
    pub fn signal_count(&self) -> u64 {
        self.state.lock().signal_count
    }

    // ------------------------------------------------------------------
    // Inspection helpers
    // ------------------------------------------------------------------

    /// Payload written to every null descriptor of `kind`.
    pub const fn null_descriptor_payload(kind: DescriptorKind) -> u64 {
        let tag = match kind {
            DescriptorKind::Cbv => 1,
            DescriptorKind::Srv => 2,
            DescriptorKind::Uav => 3,
            DescriptorKind::Sampler => 4,
            DescriptorKind::Other => 5,
        };
        0xDEAD_0000_0000_0000 | tag
    }

    /// Store a payload in a descriptor slot, as creating a view would.
    pub fn write_descriptor(&self, handle: CpuDescriptorHandle, payload: u64) {
        self.state.lock().descriptors.insert(handle.ptr, payload);
    }

    /// Read the payload of a descriptor slot.
    pub fn read_descriptor(&self, handle: CpuDescriptorHandle) -> Option<u64> {
        self.state.lock().descriptors.get(&handle.ptr).copied()
    }

    /// Copy `len` bytes out of a resource starting at `offset`.
    pub fn read_resource(&self, resource: ResourceHandle, offset: u64, len: usize) -> Vec<u8> {
        let state = self.state.lock();
        let Some(res) = state.resources.get(&resource.0) else {
            return Vec::new();
        };
        let offset = offset as usize;
        if offset + len > res.size {
            return Vec::new();
        }
        let mut out = vec![0u8; len];
        // SAFETY: range checked above; the allocation lives while the lock is held.
        unsafe {
            std::ptr::copy_nonoverlapping(
                res.memory.as_ptr().add(offset),
                out.as_mut_ptr(),
                len,
            );
        }
        out
    }

    /// Number of live fences.
    pub fn live_fence_count(&self) -> usize {
        self.state.lock().fences.len()
    }

    /// Number of live events.
    pub fn live_event_count(&self) -> usize {
        self.state.lock().events.len()
    }

    /// Number of live committed resources.
    pub fn live_resource_count(&self) -> usize {
        self.state.lock().resources.len()
    }

    /// Number of live descriptor heaps.
    pub fn live_descriptor_heap_count(&self) -> usize {
        self.state.lock().heaps.len()
    }

    /// Bytes currently held by committed resources.
    pub fn allocated_bytes(&self) -> u64 {
        self.state.lock().allocated_bytes
    }
}

impl Default for DummyDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DummyDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DummyDevice")
            .field("immediate_completion", &self.immediate_completion)
            .field("fences", &state.fences.len())
            .field("resources", &state.resources.len())
            .field("descriptor_heaps", &state.heaps.len())
            .finish_non_exhaustive()
    }
}

impl GpuDevice for DummyDevice {
    fn name(&self) -> &'static str {
        "Dummy"
    }

    fn create_fence(&self, initial_value: u64) -> Result<FenceHandle, BackendError> {
        let mut state = self.state.lock();
        let id = state.next_id();
        state.fences.insert(
            id,
            DummyFence {
                completed: initial_value,
                queued: VecDeque::new(),
            },
        );
        log::trace!("DummyDevice: created fence {id} (initial value {initial_value})");
        Ok(FenceHandle(id))
    }

    fn destroy_fence(&self, fence: FenceHandle) {
        self.state.lock().fences.remove(&fence.0);
    }

    fn signal(
        &self,
        queue: QueueHandle,
        fence: FenceHandle,
        value: u64,
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        state.signal_count += 1;
        let immediate = self.immediate_completion;
        let Some(f) = state.fences.get_mut(&fence.0) else {
            return Err(BackendError::InvalidParameter(format!(
                "unknown fence {}",
                fence.0
            )));
        };
        if immediate {
            f.complete_up_to(value);
        } else {
            f.queued.push_back(value);
        }
        log::trace!(
            "DummyDevice: queue {} signals fence {} to {}",
            queue.0,
            fence.0,
            value
        );
        drop(state);
        if immediate {
            self.progress.notify_all();
        }
        Ok(())
    }

    fn completed_value(&self, fence: FenceHandle) -> u64 {
        self.state
            .lock()
            .fences
            .get(&fence.0)
            .map_or(0, |f| f.completed)
    }

    fn create_event(&self) -> Result<EventHandle, BackendError> {
        let mut state = self.state.lock();
        let id = state.next_id();
        state.events.insert(id, None);
        Ok(EventHandle(id))
    }

    fn destroy_event(&self, event: EventHandle) {
        self.state.lock().events.remove(&event.0);
    }

    fn set_event_on_completion(
        &self,
        fence: FenceHandle,
        value: u64,
        event: EventHandle,
    ) -> Result<(), BackendError> {
        let mut state = self.state.lock();
        match state.events.get_mut(&event.0) {
            Some(target) => {
                *target = Some((fence, value));
                Ok(())
            }
            None => Err(BackendError::InvalidParameter(format!(
                "unknown event {}",
                event.0
            ))),
        }
    }

    fn wait_event(&self, event: EventHandle) {
        let mut state = self.state.lock();
        loop {
            let Some(Some((fence, value))) = state.events.get(&event.0).copied() else {
                return;
            };
            let completed = state.fences.get(&fence.0).map_or(u64::MAX, |f| f.completed);
            if completed >= value {
                if let Some(target) = state.events.get_mut(&event.0) {
                    *target = None;
                }
                return;
            }
            self.progress.wait(&mut state);
        }
    }

    fn create_committed_resource(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> Result<ResourceHandle, BackendError> {
        if descriptor.size == 0 {
            return Err(BackendError::InvalidParameter(
                "resource size cannot be zero".to_string(),
            ));
        }
        let mut state = self.state.lock();
        if let Some(budget) = self.memory_budget {
            if state.allocated_bytes + descriptor.size > budget {
                log::trace!(
                    "DummyDevice: refusing resource {:?} ({} bytes), budget {} exhausted",
                    descriptor.label,
                    descriptor.size,
                    budget
                );
                return Err(BackendError::OutOfMemory);
            }
        }

        let id = state.next_id();
        let gpu_address = state.next_gpu_resource;
        let span = descriptor.size.div_ceil(RESOURCE_PLACEMENT_ALIGNMENT) * RESOURCE_PLACEMENT_ALIGNMENT;
        state.next_gpu_resource += span;
        state.allocated_bytes += descriptor.size;
        state.resources.insert(
            id,
            DummyResource::allocate(
                descriptor.size as usize,
                gpu_address,
                descriptor.heap_kind.is_cpu_visible(),
            ),
        );

        log::trace!(
            "DummyDevice: created resource {:?} (id {}, size {}, gpu 0x{:x})",
            descriptor.label,
            id,
            descriptor.size,
            gpu_address
        );
        Ok(ResourceHandle(id))
    }

    fn map_resource(&self, resource: ResourceHandle) -> Result<NonNull<u8>, BackendError> {
        let state = self.state.lock();
        match state.resources.get(&resource.0) {
            Some(res) if res.cpu_visible => Ok(res.memory),
            Some(_) => Err(BackendError::InvalidParameter(
                "resource is not CPU visible".to_string(),
            )),
            None => Err(BackendError::InvalidParameter(format!(
                "unknown resource {}",
                resource.0
            ))),
        }
    }

    fn gpu_virtual_address(&self, resource: ResourceHandle) -> GpuVirtualAddress {
        self.state
            .lock()
            .resources
            .get(&resource.0)
            .map_or(0, |r| r.gpu_address)
    }

    fn destroy_resource(&self, resource: ResourceHandle) {
        let mut state = self.state.lock();
        if let Some(res) = state.resources.remove(&resource.0) {
            state.allocated_bytes -= res.size as u64;
        }
    }

    fn create_descriptor_heap(
        &self,
        descriptor: &DescriptorHeapDescriptor,
    ) -> Result<DescriptorHeapInfo, BackendError> {
        if descriptor.num_descriptors == 0 {
            return Err(BackendError::InvalidParameter(
                "descriptor heap cannot be empty".to_string(),
            ));
        }
        let increment = self.descriptor_increment_size(descriptor.heap_type);
        let mut state = self.state.lock();
        if self
            .max_descriptor_heaps
            .is_some_and(|max| state.heaps.len() >= max)
        {
            return Err(BackendError::OutOfMemory);
        }

        let id = state.next_id();
        let span = descriptor.num_descriptors as usize * increment as usize;
        let cpu_start = CpuDescriptorHandle::new(state.next_cpu_descriptor);
        // Leave a gap so off-by-one writes never land in a neighbouring heap.
        state.next_cpu_descriptor += span + increment as usize;

        let gpu_start = if descriptor.flags.contains(DescriptorHeapFlags::SHADER_VISIBLE) {
            let start = GpuDescriptorHandle::new(state.next_gpu_descriptor);
            state.next_gpu_descriptor += (span + increment as usize) as u64;
            start
        } else {
            GpuDescriptorHandle::default()
        };

        let info = DescriptorHeapInfo {
            handle: DescriptorHeapHandle(id),
            cpu_start,
            gpu_start,
            increment,
            num_descriptors: descriptor.num_descriptors,
        };
        state.heaps.insert(id, info);

        log::trace!(
            "DummyDevice: created descriptor heap {:?} ({:?}, {} slots)",
            descriptor.label,
            descriptor.heap_type,
            descriptor.num_descriptors
        );
        Ok(info)
    }

    fn destroy_descriptor_heap(&self, heap: DescriptorHeapHandle) {
        let mut state = self.state.lock();
        if let Some(info) = state.heaps.remove(&heap.0) {
            let start = info.cpu_start.ptr;
            let end = start + info.num_descriptors as usize * info.increment as usize;
            state.descriptors.retain(|&ptr, _| ptr < start || ptr >= end);
        }
    }

    fn descriptor_increment_size(&self, heap_type: DescriptorHeapType) -> u32 {
        match heap_type {
            DescriptorHeapType::CbvSrvUav => 32,
            DescriptorHeapType::Sampler => 16,
            DescriptorHeapType::Rtv => 32,
            DescriptorHeapType::Dsv => 8,
        }
    }

    fn copy_descriptors(
        &self,
        dst: CpuDescriptorHandle,
        sources: &[CpuDescriptorHandle],
        heap_type: DescriptorHeapType,
    ) {
        let increment = self.descriptor_increment_size(heap_type);
        let mut state = self.state.lock();
        for (i, src) in sources.iter().enumerate() {
            let payload = state.descriptors.get(&src.ptr).copied().unwrap_or(0);
            state
                .descriptors
                .insert(dst.offset(i as u32, increment).ptr, payload);
        }
    }

    fn copy_descriptors_simple(
        &self,
        count: u32,
        dst: CpuDescriptorHandle,
        src: CpuDescriptorHandle,
        heap_type: DescriptorHeapType,
    ) {
        let increment = self.descriptor_increment_size(heap_type);
        let mut state = self.state.lock();
        for i in 0..count {
            let payload = state
                .descriptors
                .get(&src.offset(i, increment).ptr)
                .copied()
                .unwrap_or(0);
            state.descriptors.insert(dst.offset(i, increment).ptr, payload);
        }
    }

    fn create_null_descriptor(&self, kind: DescriptorKind, dst: CpuDescriptorHandle) {
        self.state
            .lock()
            .descriptors
            .insert(dst.ptr, Self::null_descriptor_payload(kind));
    }
}

static_assertions::assert_impl_all!(DummyDevice: Send, Sync);
