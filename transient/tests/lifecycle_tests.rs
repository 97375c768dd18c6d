//! Lifecycle integration tests.
//!
//! These tests drive the fence, the circular heap and the descriptor cache
//! together through the record / `add_sync` / `update_completed` cycle.
//! Tests are parameterized using `rstest` to run with a GPU that lags behind
//! the CPU and with one that completes work immediately.
//!
//! ```bash
//! cargo test -p redlilium-transient --test lifecycle_tests
//! ```

mod common;

use rstest::rstest;

use common::{GpuCompletion, TestContext};
use redlilium_transient::{
    CpuDescriptorHandle, DescriptorKind, DescriptorSet, DummyDevice, SubHeapState,
    TransientError,
};

// ============================================================================
// Circular Heap
// ============================================================================

#[rstest]
#[case::manual(GpuCompletion::Manual)]
#[case::immediate(GpuCompletion::Immediate)]
fn test_small_allocations_share_block(#[case] completion: GpuCompletion) {
    let ctx = TestContext::new(completion);
    let mut ring = ctx.create_ring(4096);

    let first = ring.allocate(100, 16).unwrap();
    let second = ring.allocate(100, 16).unwrap();

    assert_eq!(first.block, second.block);
    assert!(second.offset >= (first.offset + 100).next_multiple_of(16));
    assert_eq!(ring.block_count(), 1);
}

#[rstest]
#[case::manual(GpuCompletion::Manual)]
#[case::immediate(GpuCompletion::Immediate)]
fn test_overflowing_allocation_rolls_to_new_block(#[case] completion: GpuCompletion) {
    let ctx = TestContext::new(completion);
    let mut ring = ctx.create_ring(4096);

    let first = ring.allocate(4000, 16).unwrap();
    let second = ring.allocate(200, 16).unwrap();

    assert_ne!(first.block, second.block);
    assert_eq!(second.offset, 0);
    assert_eq!(ring.block_count(), 2);
}

#[rstest]
#[case::manual(GpuCompletion::Manual)]
#[case::immediate(GpuCompletion::Immediate)]
fn test_oversize_allocation_fails(#[case] completion: GpuCompletion) {
    let ctx = TestContext::new(completion);
    let mut ring = ctx.create_ring(4096);

    let result = ring.allocate(8192, 16);
    assert!(matches!(
        result,
        Err(TransientError::AllocationTooLarge { size: 8192, .. })
    ));
}

#[test]
fn test_back_never_passes_unfinished_work() {
    let mut ctx = TestContext::new(GpuCompletion::Manual);
    let mut ring = ctx.create_ring(1024);

    let mut snapshots = Vec::new();
    for _ in 0..4 {
        ring.allocate(600, 16).unwrap();
        let value = ctx.signal();
        ring.add_sync(value);
        snapshots.push((value, ring.front().unwrap()));
    }

    let start = ring.back();
    assert_eq!(ring.update_completed(), 0);
    assert_eq!(ring.back(), start);

    let (second_value, second_front) = snapshots[1];
    ctx.complete_up_to(second_value);
    assert_eq!(ring.update_completed(), 2);
    assert_eq!(ring.back(), Some(second_front));
    assert_eq!(ring.pending_len(), 2);
}

#[rstest]
#[case::manual(GpuCompletion::Manual)]
#[case::immediate(GpuCompletion::Immediate)]
fn test_ring_reaches_steady_state(#[case] completion: GpuCompletion) {
    let mut ctx = TestContext::new(completion);
    let mut ring = ctx.create_ring(4096);

    for frame in 0..300u32 {
        ring.update_completed();
        for draw in 0..8u32 {
            let constants = [frame, draw, frame ^ draw, 0];
            let slice = ring.upload_constants(&constants).unwrap();
            assert_eq!(slice.gpu_address % 256, 0);
        }
        let value = ctx.signal();
        ring.add_sync(value);
        ctx.trail(2);
    }

    // 8 x 256 bytes per frame, at most three frames alive.
    assert!(ring.block_count() <= 4, "ring grew to {}", ring.block_count());
}

// ============================================================================
// Descriptor Cache
// ============================================================================

#[rstest]
#[case::manual(GpuCompletion::Manual)]
#[case::immediate(GpuCompletion::Immediate)]
fn test_cache_hit_skips_copy(#[case] completion: GpuCompletion) {
    let ctx = TestContext::new(completion);
    let staging = ctx.create_staging(16);
    let mut cache = ctx.create_cache(64, 16);

    let handles = [staging.cpu_handle(3), staging.cpu_handle(7)];
    let set = DescriptorSet::list(DescriptorKind::Srv, &handles);

    let first = cache.put(&set, false).unwrap();
    // A rewrite the cache is not told about stays invisible.
    ctx.device.write_descriptor(staging.cpu_handle(3), 1);
    let second = cache.put(&set, false).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        ctx.read_payloads(second.cpu_handle, 2),
        vec![Some(1003), Some(1007)]
    );

    let third = cache.put(&set, true).unwrap();
    assert_ne!(third.start_index, first.start_index);
    assert_eq!(
        ctx.read_payloads(third.cpu_handle, 2),
        vec![Some(1), Some(1007)]
    );
}

#[test]
fn test_run_and_list_are_one_entry() {
    let ctx = TestContext::new(GpuCompletion::Manual);
    let staging = ctx.create_staging(16);
    let mut cache = ctx.create_cache(64, 16);

    let run = DescriptorSet::run(
        DescriptorKind::Srv,
        staging.cpu_handle(4),
        4,
        staging.increment,
    );
    let handles: Vec<CpuDescriptorHandle> = (4..8).map(|i| staging.cpu_handle(i)).collect();
    let list = DescriptorSet::list(DescriptorKind::Srv, &handles);

    let from_run = cache.put(&run, false).unwrap();
    let from_list = cache.put(&list, false).unwrap();

    assert_eq!(from_run, from_list);
    assert_eq!(cache.entry_count(), 1);
    assert_eq!(
        ctx.read_payloads(from_list.cpu_handle, 4),
        vec![Some(1004), Some(1005), Some(1006), Some(1007)]
    );
}

#[test]
fn test_superseded_sub_heap_retires_with_fence() {
    let mut ctx = TestContext::with_initial_fence_value(GpuCompletion::Manual, 4);
    let staging = ctx.create_staging(32);
    let mut cache = ctx.create_cache(8, 8);

    let three = DescriptorSet::run(
        DescriptorKind::Srv,
        staging.cpu_handle(0),
        3,
        staging.increment,
    );
    let first = cache.put(&three, false).unwrap();
    let value = ctx.signal();
    assert_eq!(value, 5);
    cache.add_sync(value);

    let eight = DescriptorSet::run(
        DescriptorKind::Srv,
        staging.cpu_handle(16),
        8,
        staging.increment,
    );
    let second = cache.put(&eight, false).unwrap();
    assert_ne!(first.sub_heap, second.sub_heap);

    cache.update_completed();
    assert_eq!(
        cache.sub_heap_state(first.sub_heap),
        Some(SubHeapState::Pending)
    );

    ctx.complete_up_to(5);
    cache.update_completed();
    assert_eq!(
        cache.sub_heap_state(first.sub_heap),
        Some(SubHeapState::Free)
    );
}

#[test]
fn test_eviction_leaves_no_matching_entry() {
    let ctx = TestContext::new(GpuCompletion::Manual);
    let staging = ctx.create_staging(32);
    let mut cache = ctx.create_cache(256, 16);

    let windows: Vec<Vec<CpuDescriptorHandle>> = (0..8)
        .map(|start| (start..start + 4).map(|i| staging.cpu_handle(i)).collect())
        .collect();
    for window in &windows {
        cache
            .put(&DescriptorSet::list(DescriptorKind::Srv, window), false)
            .unwrap();
    }
    assert_eq!(cache.entry_count(), 8);

    // Handle 5 sits in the windows starting at 2, 3, 4 and 5.
    let victim = staging.cpu_handle(5);
    assert_eq!(cache.evict(victim), 4);
    assert_eq!(cache.entry_count(), 4);

    for window in &windows {
        let set = DescriptorSet::list(DescriptorKind::Srv, window);
        let before = cache.entry_count();
        cache.put(&set, false).unwrap();
        let recopied = cache.entry_count() > before;
        assert_eq!(recopied, set.has_handle(victim));
    }
}

#[test]
fn test_null_descriptors_are_initialized() {
    let ctx = TestContext::new(GpuCompletion::Manual);
    let staging = ctx.create_staging(4);
    let mut cache = ctx.create_cache(64, 16);

    let handles = [
        CpuDescriptorHandle::NULL,
        staging.cpu_handle(1),
        CpuDescriptorHandle::NULL,
    ];
    let set = DescriptorSet::list(DescriptorKind::Cbv, &handles);
    let location = cache.put(&set, false).unwrap();

    let null = Some(DummyDevice::null_descriptor_payload(DescriptorKind::Cbv));
    assert_eq!(
        ctx.read_payloads(location.cpu_handle, 3),
        vec![null, Some(1001), null]
    );
}

// ============================================================================
// Full Frame Loop
// ============================================================================

#[rstest]
#[case::manual(GpuCompletion::Manual)]
#[case::immediate(GpuCompletion::Immediate)]
fn test_frame_loop(#[case] completion: GpuCompletion) {
    let mut ctx = TestContext::new(completion);
    let staging = ctx.create_staging(64);
    let mut ring = ctx.create_ring(16 * 1024);
    let mut cache = ctx.create_cache(128, 32);

    let materials: Vec<Vec<CpuDescriptorHandle>> = (0..6)
        .map(|m| (0..4).map(|t| staging.cpu_handle(m * 4 + t)).collect())
        .collect();

    for frame in 0..200usize {
        ring.update_completed();
        cache.update_completed();

        let batch: Vec<DescriptorSet<'_>> = (0..3)
            .map(|i| DescriptorSet::list(DescriptorKind::Srv, &materials[(frame + i) % 6]))
            .collect();
        let placed = cache.put_many(&batch, &[false; 3]).unwrap();
        assert!(placed.locations.iter().all(|l| l.sub_heap == placed.sub_heap));

        for location in &placed.locations {
            let vertices = [location.start_index as f32; 12];
            ring.upload(&vertices, 16).unwrap();
        }

        if frame % 50 == 49 {
            // Textures streamed out: drop every set that used one of them.
            cache.evict(staging.cpu_handle((frame / 50) as u32));
        }

        let value = ctx.signal();
        ring.add_sync(value);
        cache.add_sync(value);
        ctx.trail(2);
    }

    assert!(ring.block_count() <= 2, "ring grew to {}", ring.block_count());
    assert!(
        cache.sub_heap_count() <= 4,
        "cache grew to {} sub-heaps",
        cache.sub_heap_count()
    );

    ctx.complete_up_to(ctx.fence.current_value());
    ring.update_completed();
    cache.update_completed();
    assert!(ring.is_empty());
    assert_eq!(ring.pending_len(), 0);
    assert_eq!(cache.pending_len(), 0);
}

#[test]
fn test_wait_for_lagging_gpu() {
    let mut ctx = TestContext::new(GpuCompletion::Manual);
    let mut ring = ctx.create_ring(1024);

    ring.allocate(1024, 16).unwrap();
    let value = ctx.signal();
    ring.add_sync(value);

    let device = ctx.device.clone();
    let fence = ctx.fence.handle();
    let gpu = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(10));
        device.complete_fence(fence, value);
    });

    ctx.fence.wait_until_completed(value).unwrap();
    gpu.join().unwrap();

    assert_eq!(ring.update_completed(), 1);
    assert!(ring.is_empty());
    ring.allocate(1024, 16).unwrap();
}
