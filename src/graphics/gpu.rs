//! Shared GPU device handle

use std::sync::atomic::{AtomicU64, Ordering};

/// Device and queue shared by every resource wrapper.
///
/// Wrappers keep their CPU-side data and only create backend objects when
/// handed a `Gpu`, so everything above this layer works headless.
#[derive(Debug)]
pub struct Gpu {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl Gpu {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }
}

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique id for a GPU resource wrapper
pub(crate) fn next_resource_id() -> u64 {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}
