//! Common utilities for lifecycle integration tests.
//!
//! Every test runs against the [`DummyDevice`], either with a GPU that only
//! makes progress when the test says so, or with one that finishes each
//! signal the moment it is enqueued.

use std::collections::VecDeque;
use std::sync::Arc;

use redlilium_transient::{
    CircularHeapDescriptor, CircularResourceHeap, CounterFence, CpuDescriptorHandle,
    DescriptorCache, DescriptorCacheDescriptor, DescriptorHeapFlags, DescriptorHeapType,
    DummyDevice, GpuDevice, QueueHandle,
    types::{DescriptorHeapDescriptor, DescriptorHeapInfo},
};

// ============================================================================
// GPU Completion Modes
// ============================================================================

/// How the simulated GPU makes progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuCompletion {
    /// Work completes only through [`TestContext::complete_up_to`].
    Manual,
    /// Every signal completes as soon as it is enqueued.
    Immediate,
}

impl GpuCompletion {
    fn create_device(self) -> DummyDevice {
        match self {
            GpuCompletion::Manual => DummyDevice::new(),
            GpuCompletion::Immediate => DummyDevice::new().with_immediate_completion(),
        }
    }
}

// ============================================================================
// Test Context
// ============================================================================

/// Device, fence and queue shared by the managers under test.
pub struct TestContext {
    /// The completion mode being tested.
    #[allow(dead_code)]
    pub completion: GpuCompletion,
    /// Simulated device.
    pub device: Arc<DummyDevice>,
    /// Fence shared by every manager.
    pub fence: Arc<CounterFence>,
    /// Queue submissions go to.
    pub queue: QueueHandle,
    in_flight: VecDeque<u64>,
}

impl TestContext {
    /// Create a context whose fence starts at zero.
    pub fn new(completion: GpuCompletion) -> Self {
        Self::with_initial_fence_value(completion, 0)
    }

    /// Create a context whose fence starts at `initial_value`.
    pub fn with_initial_fence_value(completion: GpuCompletion, initial_value: u64) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let device = Arc::new(completion.create_device());
        let fence = Arc::new(
            CounterFence::new(device.clone(), initial_value).expect("Failed to create fence"),
        );
        Self {
            completion,
            device,
            fence,
            queue: QueueHandle(0),
            in_flight: VecDeque::new(),
        }
    }

    /// Create a circular heap with the given block size.
    pub fn create_ring(&self, block_size: u64) -> CircularResourceHeap {
        CircularResourceHeap::new(
            self.device.clone(),
            CircularHeapDescriptor::new(block_size).with_label("test_ring"),
            self.fence.clone(),
        )
        .expect("Failed to create circular heap")
    }

    /// Create a CBV/SRV/UAV descriptor cache.
    pub fn create_cache(&self, sub_heap_size: u32, max_linear: u32) -> DescriptorCache {
        DescriptorCache::new(
            self.device.clone(),
            DescriptorCacheDescriptor::new(DescriptorHeapType::CbvSrvUav)
                .with_label("test_cache")
                .with_sub_heap_size(sub_heap_size)
                .with_max_linear_descriptors(max_linear),
            self.fence.clone(),
        )
        .expect("Failed to create descriptor cache")
    }

    /// Create a CPU-only staging heap whose slot `i` holds payload `1000 + i`.
    pub fn create_staging(&self, count: u32) -> DescriptorHeapInfo {
        let staging = self
            .device
            .create_descriptor_heap(
                &DescriptorHeapDescriptor::new(DescriptorHeapType::CbvSrvUav, count)
                    .with_label("staging")
                    .with_flags(DescriptorHeapFlags::empty()),
            )
            .expect("Failed to create staging heap");
        for i in 0..count {
            self.device
                .write_descriptor(staging.cpu_handle(i), 1000 + u64::from(i));
        }
        staging
    }

    /// Signal the next fence value and remember it as in flight.
    pub fn signal(&mut self) -> u64 {
        let value = self
            .fence
            .next_signal(self.queue)
            .expect("Failed to signal fence");
        self.in_flight.push_back(value);
        value
    }

    /// Let the simulated GPU reach `value`.
    pub fn complete_up_to(&mut self, value: u64) {
        self.device.complete_fence(self.fence.handle(), value);
        while self.in_flight.front().is_some_and(|&v| v <= value) {
            self.in_flight.pop_front();
        }
    }

    /// Let the GPU finish everything except the newest `keep` submissions.
    pub fn trail(&mut self, keep: usize) {
        if self.in_flight.len() > keep {
            let target = self.in_flight[self.in_flight.len() - keep - 1];
            self.complete_up_to(target);
        }
    }

    /// Payloads of `count` slots starting at `start`.
    pub fn read_payloads(&self, start: CpuDescriptorHandle, count: u32) -> Vec<Option<u64>> {
        let increment = self
            .device
            .descriptor_increment_size(DescriptorHeapType::CbvSrvUav);
        (0..count)
            .map(|i| self.device.read_descriptor(start.offset(i, increment)))
            .collect()
    }
}
