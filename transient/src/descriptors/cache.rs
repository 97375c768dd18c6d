use std::borrow::Cow;
use std::collections::VecDeque;
use std::sync::Arc;

use slotmap::{SlotMap, new_key_type};

use crate::backend::GpuDevice;
use crate::error::TransientError;
use crate::fence::CounterFence;
use crate::types::{
    CpuDescriptorHandle, DescriptorHeapDescriptor, DescriptorHeapFlags, DescriptorHeapHandle,
    DescriptorHeapInfo, DescriptorHeapType, GpuDescriptorHandle,
};

use super::set::{DescriptorHandles, DescriptorSet};

/// Number of hash bins. Must be a power of two.
const BIN_COUNT: usize = 1024;

new_key_type! {
    /// Key of a cache entry.
    pub struct EntryKey;
}

/// Index of a sub-heap in a cache's pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubHeapId(u32);

impl SubHeapId {
    fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the sub-heap in the pool.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Lifecycle state of a sub-heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubHeapState {
    /// Receives new copies. Exactly one sub-heap is active.
    Active,
    /// Superseded, but submissions that reference it are still outstanding.
    Pending,
    /// Unreferenced and ready to be recycled.
    Free,
}

/// Descriptor for creating a descriptor cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DescriptorCacheDescriptor {
    /// Debug label, used to name the sub-heaps.
    pub label: Option<String>,
    /// Category of the descriptors the cache holds.
    pub heap_type: DescriptorHeapType,
    /// Creation flags of every sub-heap.
    pub heap_flags: DescriptorHeapFlags,
    /// Number of slots per sub-heap.
    pub sub_heap_size: u32,
    /// Upper bound on the descriptors a single `put` call may reference.
    pub max_linear_descriptors: u32,
}

impl DescriptorCacheDescriptor {
    /// Default number of slots per sub-heap.
    pub const DEFAULT_SUB_HEAP_SIZE: u32 = 4096;
    /// Default bound on the descriptors of one `put` call.
    pub const DEFAULT_MAX_LINEAR_DESCRIPTORS: u32 = 256;

    /// Create a descriptor for a shader-visible cache of the given type.
    pub fn new(heap_type: DescriptorHeapType) -> Self {
        Self {
            label: None,
            heap_type,
            heap_flags: DescriptorHeapFlags::SHADER_VISIBLE,
            sub_heap_size: Self::DEFAULT_SUB_HEAP_SIZE,
            max_linear_descriptors: Self::DEFAULT_MAX_LINEAR_DESCRIPTORS,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the sub-heap creation flags.
    pub fn with_heap_flags(mut self, heap_flags: DescriptorHeapFlags) -> Self {
        self.heap_flags = heap_flags;
        self
    }

    /// Set the number of slots per sub-heap.
    pub fn with_sub_heap_size(mut self, sub_heap_size: u32) -> Self {
        self.sub_heap_size = sub_heap_size;
        self
    }

    /// Set the bound on the descriptors of one `put` call.
    pub fn with_max_linear_descriptors(mut self, max_linear_descriptors: u32) -> Self {
        self.max_linear_descriptors = max_linear_descriptors;
        self
    }

    /// Check the descriptor for values no cache can work with.
    pub fn validate(&self) -> Result<(), TransientError> {
        if self.sub_heap_size == 0 {
            return Err(TransientError::InvalidParameter(
                "sub-heap size cannot be zero".to_string(),
            ));
        }
        if self.max_linear_descriptors == 0 {
            return Err(TransientError::InvalidParameter(
                "max linear descriptors cannot be zero".to_string(),
            ));
        }
        if self.max_linear_descriptors > self.sub_heap_size {
            return Err(TransientError::InvalidParameter(format!(
                "max linear descriptors ({}) exceeds sub-heap size ({})",
                self.max_linear_descriptors, self.sub_heap_size
            )));
        }
        Ok(())
    }
}

impl Default for DescriptorCacheDescriptor {
    fn default() -> Self {
        Self::new(DescriptorHeapType::CbvSrvUav)
    }
}

/// Where a set's descriptors live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorLocation {
    /// Cache entry, `None` for empty sets.
    pub key: Option<EntryKey>,
    /// Sub-heap holding the copy.
    pub sub_heap: SubHeapId,
    /// First slot of the copy.
    pub start_index: u32,
    /// Number of slots.
    pub count: u32,
    /// CPU handle of the first slot.
    pub cpu_handle: CpuDescriptorHandle,
    /// GPU handle of the first slot, for binding a descriptor table.
    pub gpu_handle: GpuDescriptorHandle,
}

/// Result of a batched put: every set lands on the same sub-heap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutBatch {
    /// Sub-heap to bind.
    pub sub_heap: SubHeapId,
    /// Backend heap to bind.
    pub heap: DescriptorHeapHandle,
    /// One location per input set, in order.
    pub locations: Vec<DescriptorLocation>,
}

#[derive(Debug)]
struct SubHeap {
    info: DescriptorHeapInfo,
    state: SubHeapState,
    /// Slots handed out since the sub-heap last became active.
    used: u32,
    /// `put` calls since the last `add_sync`.
    uses_since_sync: u32,
    /// Highest fence value recorded for a submission that used the sub-heap.
    retire_after: u64,
}

#[derive(Debug)]
struct Entry {
    set: DescriptorSet<'static>,
    hash: u64,
    sub_heap: SubHeapId,
    start_index: u32,
}

#[derive(Debug, Clone, Copy)]
struct PendingSync {
    value: u64,
    sub_heap: SubHeapId,
}

/// What a `put` call does with one of its sets.
#[derive(Debug, Clone, Copy)]
enum Plan {
    /// Equal entry already on the active heap, nothing to copy.
    Reuse(EntryKey),
    /// Copy onto the active heap, updating the entry if there is one.
    Copy(Option<EntryKey>),
    /// Same contents as an earlier set of the call.
    SameAs(usize),
    /// Zero-size set, never touches the heap.
    Empty,
}

/// Content-addressed cache of descriptor sets copied into shader-visible heaps.
///
/// Sets are copied into the single active sub-heap. When it cannot fit a
/// call's descriptors, it is demoted to pending and another sub-heap becomes
/// active, preferring a recycled free one over creating a new one. A demoted
/// sub-heap becomes free once every submission that referenced it has been
/// retired by the fence.
///
/// # Thread Safety
///
/// Not thread-safe. All calls come from the thread recording submissions.
pub struct DescriptorCache {
    device: Arc<dyn GpuDevice>,
    fence: Arc<CounterFence>,
    descriptor: DescriptorCacheDescriptor,
    sub_heaps: Vec<SubHeap>,
    active: SubHeapId,
    free: Vec<SubHeapId>,
    pending: VecDeque<PendingSync>,
    entries: SlotMap<EntryKey, Entry>,
    bins: Vec<Vec<EntryKey>>,
    last_sync: Option<u64>,
}

impl DescriptorCache {
    /// Create a cache and its first active sub-heap.
    pub fn new(
        device: Arc<dyn GpuDevice>,
        descriptor: DescriptorCacheDescriptor,
        fence: Arc<CounterFence>,
    ) -> Result<Self, TransientError> {
        descriptor.validate()?;

        let mut cache = Self {
            device,
            fence,
            descriptor,
            sub_heaps: Vec::new(),
            active: SubHeapId::new(0),
            free: Vec::new(),
            pending: VecDeque::new(),
            entries: SlotMap::with_key(),
            bins: vec![Vec::new(); BIN_COUNT],
            last_sync: None,
        };
        cache.active = cache.create_sub_heap().map_err(|e| {
            TransientError::InitializationFailed(format!("failed to create descriptor heap: {e}"))
        })?;
        cache.sub_heaps[cache.active.index()].state = SubHeapState::Active;

        log::debug!(
            "DescriptorCache: created {:?} ({:?}, {} slots per sub-heap)",
            cache.descriptor.label,
            cache.descriptor.heap_type,
            cache.descriptor.sub_heap_size
        );
        Ok(cache)
    }

    /// The descriptor the cache was created with.
    pub fn descriptor(&self) -> &DescriptorCacheDescriptor {
        &self.descriptor
    }

    /// The fence this cache retires sub-heaps against.
    pub fn fence(&self) -> &Arc<CounterFence> {
        &self.fence
    }

    /// The active sub-heap.
    pub fn active_sub_heap(&self) -> SubHeapId {
        self.active
    }

    /// Backend heap of the active sub-heap, for binding.
    pub fn active_heap(&self) -> DescriptorHeapInfo {
        self.sub_heaps[self.active.index()].info
    }

    /// Backend heap of a sub-heap.
    pub fn heap_info(&self, id: SubHeapId) -> Option<DescriptorHeapInfo> {
        self.sub_heaps.get(id.index()).map(|heap| heap.info)
    }

    /// Lifecycle state of a sub-heap.
    pub fn sub_heap_state(&self, id: SubHeapId) -> Option<SubHeapState> {
        self.sub_heaps.get(id.index()).map(|heap| heap.state)
    }

    /// Number of sub-heaps ever created.
    pub fn sub_heap_count(&self) -> usize {
        self.sub_heaps.len()
    }

    /// Number of sub-heaps waiting to be recycled.
    pub fn free_sub_heap_count(&self) -> usize {
        self.free.len()
    }

    /// Number of cached sets.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of sync points not yet confirmed by the GPU.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Current location of a cached set.
    pub fn location(&self, key: EntryKey) -> Option<DescriptorLocation> {
        let entry = self.entries.get(key)?;
        Some(self.make_location(
            Some(key),
            entry.sub_heap,
            entry.start_index,
            entry.set.len() as u32,
        ))
    }

    /// Make one set GPU-visible.
    ///
    /// `has_changed` forces a fresh copy even when an equal set is cached,
    /// for callers that rewrote the source descriptors in place.
    pub fn put(
        &mut self,
        set: &DescriptorSet<'_>,
        has_changed: bool,
    ) -> Result<DescriptorLocation, TransientError> {
        let mut locations = Vec::with_capacity(1);
        self.put_into(std::slice::from_ref(set), &[has_changed], &mut locations)?;
        Ok(locations[0])
    }

    /// Make several sets GPU-visible on the same sub-heap.
    ///
    /// All sets of one call land on one heap, since only one heap per
    /// category can be bound while recording.
    ///
    /// # Errors
    ///
    /// - [`TransientError::InvalidParameter`] if `changed` does not match
    ///   `sets` in length, or the distinct sets hold more descriptors than
    ///   `max_linear_descriptors`.
    /// - [`TransientError::ResourceExhausted`] if a new sub-heap is needed and
    ///   the backend is out of memory.
    pub fn put_many(
        &mut self,
        sets: &[DescriptorSet<'_>],
        changed: &[bool],
    ) -> Result<PutBatch, TransientError> {
        let mut locations = Vec::with_capacity(sets.len());
        let sub_heap = self.put_into(sets, changed, &mut locations)?;
        Ok(PutBatch {
            sub_heap,
            heap: self.sub_heaps[sub_heap.index()].info.handle,
            locations,
        })
    }

    fn put_into(
        &mut self,
        sets: &[DescriptorSet<'_>],
        changed: &[bool],
        locations: &mut Vec<DescriptorLocation>,
    ) -> Result<SubHeapId, TransientError> {
        crate::profile_scope!("DescriptorCache::put");

        if sets.len() != changed.len() {
            return Err(TransientError::InvalidParameter(format!(
                "{} sets but {} change flags",
                sets.len(),
                changed.len()
            )));
        }

        let hashes: Vec<u64> = sets.iter().map(DescriptorSet::calc_hash).collect();
        let mut plans = Vec::with_capacity(sets.len());
        let mut total: u64 = 0;

        for (i, set) in sets.iter().enumerate() {
            if set.is_empty() {
                plans.push(Plan::Empty);
                continue;
            }

            let earlier = (0..i).find(|&j| {
                !matches!(plans[j], Plan::SameAs(_) | Plan::Empty)
                    && hashes[j] == hashes[i]
                    && sets[j] == *set
            });
            if let Some(j) = earlier {
                if changed[i] {
                    if let Plan::Reuse(key) = plans[j] {
                        plans[j] = Plan::Copy(Some(key));
                    }
                }
                plans.push(Plan::SameAs(j));
                continue;
            }

            total += set.len() as u64;
            let plan = match self.find(hashes[i], set) {
                Some(key)
                    if !changed[i] && self.entries[key].sub_heap == self.active =>
                {
                    Plan::Reuse(key)
                }
                found => Plan::Copy(found),
            };
            plans.push(plan);
        }

        if total > u64::from(self.descriptor.max_linear_descriptors) {
            return Err(TransientError::InvalidParameter(format!(
                "put of {} descriptors exceeds the linear limit of {}",
                total, self.descriptor.max_linear_descriptors
            )));
        }

        let needed: u64 = plans
            .iter()
            .zip(sets)
            .filter(|(plan, _)| matches!(plan, Plan::Copy(_)))
            .map(|(_, set)| set.len() as u64)
            .sum();

        // `total` fits a fresh sub-heap, so after a rotation everything is recopied.
        if self.require_space(needed as u32)? {
            for plan in &mut plans {
                match *plan {
                    Plan::Reuse(key) => *plan = Plan::Copy(Some(key)),
                    // Purged along with a recycled sub-heap.
                    Plan::Copy(Some(key)) if !self.entries.contains_key(key) => {
                        *plan = Plan::Copy(None);
                    }
                    _ => {}
                }
            }
        }

        let active = self.active;
        for (i, set) in sets.iter().enumerate() {
            let location = match plans[i] {
                Plan::Empty => self.make_location(None, active, 0, 0),
                Plan::SameAs(j) => locations[j],
                Plan::Reuse(key) => {
                    log::trace!("DescriptorCache: reusing {} descriptors", set.len());
                    let entry = &self.entries[key];
                    self.make_location(Some(key), entry.sub_heap, entry.start_index, set.len() as u32)
                }
                Plan::Copy(existing) => {
                    let start_index = self.copy_to_active(set);
                    let key = match existing {
                        Some(key) => {
                            let entry = &mut self.entries[key];
                            entry.sub_heap = active;
                            entry.start_index = start_index;
                            key
                        }
                        None => self.insert_entry(set, hashes[i], active, start_index),
                    };
                    self.make_location(Some(key), active, start_index, set.len() as u32)
                }
            };
            locations.push(location);
        }

        self.sub_heaps[active.index()].uses_since_sync += 1;
        crate::profile_plot!("DescriptorCache entries", self.entries.len());
        Ok(active)
    }

    /// Ensure the active sub-heap has `count` free slots, rotating if it doesn't.
    ///
    /// Returns whether a rotation happened.
    fn require_space(&mut self, count: u32) -> Result<bool, TransientError> {
        let active = &self.sub_heaps[self.active.index()];
        if u64::from(active.used) + u64::from(count) <= u64::from(self.descriptor.sub_heap_size) {
            return Ok(false);
        }

        let next = self.obtain_sub_heap()?;
        let previous = self.active;
        let completed = self.fence.completed_value();

        let heap = &mut self.sub_heaps[next.index()];
        heap.state = SubHeapState::Active;
        heap.used = 0;
        self.active = next;

        let old = &mut self.sub_heaps[previous.index()];
        if old.uses_since_sync == 0 && old.retire_after <= completed {
            old.state = SubHeapState::Free;
            self.free.push(previous);
        } else {
            old.state = SubHeapState::Pending;
        }

        log::debug!(
            "DescriptorCache: {:?} rotated from sub-heap {} ({:?}) to {}",
            self.descriptor.label,
            previous.index(),
            self.sub_heaps[previous.index()].state,
            next.index()
        );
        Ok(true)
    }

    /// Pop a free sub-heap, purging its stale entries, or create a new one.
    fn obtain_sub_heap(&mut self) -> Result<SubHeapId, TransientError> {
        if let Some(id) = self.free.pop() {
            let stale: Vec<EntryKey> = self
                .entries
                .iter()
                .filter(|(_, entry)| entry.sub_heap == id)
                .map(|(key, _)| key)
                .collect();
            for &key in &stale {
                self.remove_entry(key);
            }
            log::debug!(
                "DescriptorCache: recycling sub-heap {} ({} stale entries purged)",
                id.index(),
                stale.len()
            );
            return Ok(id);
        }
        self.create_sub_heap()
    }

    fn create_sub_heap(&mut self) -> Result<SubHeapId, TransientError> {
        let id = SubHeapId::new(self.sub_heaps.len());
        let label = self.descriptor.label.as_deref().unwrap_or("descriptor_cache");
        let heap_desc =
            DescriptorHeapDescriptor::new(self.descriptor.heap_type, self.descriptor.sub_heap_size)
                .with_label(format!("{label}_sub{}", id.index()))
                .with_flags(self.descriptor.heap_flags);
        let info = self.device.create_descriptor_heap(&heap_desc)?;

        self.sub_heaps.push(SubHeap {
            info,
            state: SubHeapState::Free,
            used: 0,
            uses_since_sync: 0,
            retire_after: 0,
        });
        log::debug!(
            "DescriptorCache: created sub-heap {} for {:?}",
            id.index(),
            self.descriptor.label
        );
        crate::profile_plot!("DescriptorCache sub-heaps", self.sub_heaps.len());
        Ok(id)
    }

    /// Copy a set into the next slots of the active sub-heap.
    ///
    /// Null handles become typed null descriptors.
    fn copy_to_active(&mut self, set: &DescriptorSet<'_>) -> u32 {
        let heap = &mut self.sub_heaps[self.active.index()];
        let start_index = heap.used;
        heap.used += set.len() as u32;
        let info = heap.info;
        let ty = self.descriptor.heap_type;

        match set.handles() {
            DescriptorHandles::Run {
                base,
                count,
                stride,
            } if *stride == info.increment && !base.is_null() => {
                self.device
                    .copy_descriptors_simple(*count, info.cpu_handle(start_index), *base, ty);
            }
            handles => {
                let handles: Cow<'_, [CpuDescriptorHandle]> = match handles {
                    DescriptorHandles::List(list) => Cow::Borrowed(&list[..]),
                    DescriptorHandles::Run { .. } => Cow::Owned(set.iter().collect()),
                };
                let mut i = 0;
                while i < handles.len() {
                    let dst = info.cpu_handle(start_index + i as u32);
                    if handles[i].is_null() {
                        self.device.create_null_descriptor(set.kind(), dst);
                        i += 1;
                        continue;
                    }
                    let end = handles[i..]
                        .iter()
                        .position(|h| h.is_null())
                        .map_or(handles.len(), |p| i + p);
                    self.device.copy_descriptors(dst, &handles[i..end], ty);
                    i = end;
                }
            }
        }

        log::trace!(
            "DescriptorCache: copied {} descriptors to sub-heap {} slot {}",
            set.len(),
            self.active.index(),
            start_index
        );
        start_index
    }

    /// Record a sync point for every sub-heap used since the last one.
    ///
    /// `signal_value` must be the value just returned by
    /// [`CounterFence::next_signal`] for the submissions that bound the
    /// cache's heaps. Values must arrive in increasing order.
    pub fn add_sync(&mut self, signal_value: u64) {
        crate::profile_scope!("DescriptorCache::add_sync");

        if let Some(last) = self.last_sync {
            debug_assert!(
                signal_value > last,
                "add_sync values out of order: {signal_value} after {last}"
            );
            if signal_value <= last {
                log::warn!("DescriptorCache: add_sync({signal_value}) after add_sync({last})");
            }
        }
        self.last_sync = Some(signal_value);

        for (index, heap) in self.sub_heaps.iter_mut().enumerate() {
            if heap.uses_since_sync == 0 {
                continue;
            }
            heap.uses_since_sync = 0;
            heap.retire_after = heap.retire_after.max(signal_value);
            self.pending.push_back(PendingSync {
                value: signal_value,
                sub_heap: SubHeapId::new(index),
            });
        }
    }

    /// Retire sync points the GPU has passed and free unreferenced sub-heaps.
    ///
    /// Returns the number of sync points retired.
    pub fn update_completed(&mut self) -> usize {
        crate::profile_scope!("DescriptorCache::update_completed");

        let completed = self.fence.completed_value();
        let mut retired = 0;
        while let Some(sync) = self.pending.front().copied() {
            if sync.value > completed {
                break;
            }
            self.pending.pop_front();
            retired += 1;

            let heap = &mut self.sub_heaps[sync.sub_heap.index()];
            if heap.state == SubHeapState::Pending
                && heap.uses_since_sync == 0
                && heap.retire_after <= completed
            {
                heap.state = SubHeapState::Free;
                self.free.push(sync.sub_heap);
                log::debug!(
                    "DescriptorCache: sub-heap {} retired at fence value {}",
                    sync.sub_heap.index(),
                    completed
                );
            }
        }
        retired
    }

    /// Remove every cached set that contains `handle`.
    ///
    /// Call this before the source descriptor is destroyed or rewritten.
    /// Sub-heap bookkeeping is untouched. Returns the number of sets removed.
    pub fn evict(&mut self, handle: CpuDescriptorHandle) -> usize {
        self.evict_where(|set| set.has_handle(handle))
    }

    /// Remove every cached set that shares a handle with `set`.
    pub fn evict_intersects(&mut self, set: &DescriptorSet<'_>) -> usize {
        self.evict_where(|cached| cached.has_intersection(set))
    }

    fn evict_where(&mut self, mut predicate: impl FnMut(&DescriptorSet<'static>) -> bool) -> usize {
        let doomed: Vec<EntryKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| predicate(&entry.set))
            .map(|(key, _)| key)
            .collect();
        for &key in &doomed {
            self.remove_entry(key);
        }
        if !doomed.is_empty() {
            log::trace!("DescriptorCache: evicted {} entries", doomed.len());
        }
        doomed.len()
    }

    /// Drop every cached set. Sub-heap bookkeeping is untouched.
    pub fn clear_cache(&mut self) {
        log::debug!(
            "DescriptorCache: clearing {} entries from {:?}",
            self.entries.len(),
            self.descriptor.label
        );
        self.entries.clear();
        for bin in &mut self.bins {
            bin.clear();
        }
    }

    fn find(&self, hash: u64, set: &DescriptorSet<'_>) -> Option<EntryKey> {
        self.bins[bin_index(hash)].iter().copied().find(|&key| {
            let entry = &self.entries[key];
            entry.hash == hash && entry.set == *set
        })
    }

    fn insert_entry(
        &mut self,
        set: &DescriptorSet<'_>,
        hash: u64,
        sub_heap: SubHeapId,
        start_index: u32,
    ) -> EntryKey {
        let key = self.entries.insert(Entry {
            set: set.clone().into_owned(),
            hash,
            sub_heap,
            start_index,
        });
        self.bins[bin_index(hash)].push(key);
        key
    }

    fn remove_entry(&mut self, key: EntryKey) {
        if let Some(entry) = self.entries.remove(key) {
            let bin = &mut self.bins[bin_index(entry.hash)];
            if let Some(pos) = bin.iter().position(|&k| k == key) {
                bin.swap_remove(pos);
            }
        }
    }

    fn make_location(
        &self,
        key: Option<EntryKey>,
        sub_heap: SubHeapId,
        start_index: u32,
        count: u32,
    ) -> DescriptorLocation {
        let info = &self.sub_heaps[sub_heap.index()].info;
        DescriptorLocation {
            key,
            sub_heap,
            start_index,
            count,
            cpu_handle: info.cpu_handle(start_index),
            gpu_handle: info.gpu_handle(start_index),
        }
    }
}

/// Fold a 64-bit hash down to a bin index.
fn bin_index(hash: u64) -> usize {
    let folded = hash ^ (hash >> 32);
    let folded = folded ^ (folded >> 16);
    let folded = folded ^ (folded >> 8);
    (folded as usize) & (BIN_COUNT - 1)
}

impl Drop for DescriptorCache {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            log::debug!(
                "DescriptorCache: dropping {:?} with {} unretired sync points",
                self.descriptor.label,
                self.pending.len()
            );
        }
        for heap in self.sub_heaps.drain(..) {
            self.device.destroy_descriptor_heap(heap.info.handle);
        }
    }
}

impl std::fmt::Debug for DescriptorCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorCache")
            .field("label", &self.descriptor.label)
            .field("heap_type", &self.descriptor.heap_type)
            .field("sub_heaps", &self.sub_heaps.len())
            .field("active", &self.active)
            .field("entries", &self.entries.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

static_assertions::assert_impl_all!(DescriptorCache: Send);
