//! Vertex, index and dynamic instance buffers

use wgpu::util::DeviceExt;

use super::gpu::{Gpu, next_resource_id};
use super::vertex::{VertexLayout, VertexType};

/// Immutable vertex buffer with a CPU shadow copy
#[derive(Debug)]
pub struct VertexBuffer {
    id: u64,
    name: String,
    layout: VertexLayout,
    count: u32,
    data: Vec<u8>,
    pub(crate) buffer: Option<wgpu::Buffer>,
}

impl VertexBuffer {
    pub fn new<V: VertexType>(name: impl Into<String>, vertices: &[V]) -> Self {
        Self {
            id: next_resource_id(),
            name: name.into(),
            layout: V::LAYOUT,
            count: vertices.len() as u32,
            data: bytemuck::cast_slice(vertices).to_vec(),
            buffer: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Copy the vertices back out as `V`
    pub fn vertices<V: VertexType>(&self) -> Vec<V> {
        debug_assert_eq!(V::LAYOUT, self.layout);
        bytemuck::pod_collect_to_vec(&self.data)
    }

    /// Create the GPU buffer
    pub fn upload(&mut self, gpu: &Gpu) {
        if self.data.is_empty() {
            return;
        }
        self.buffer = Some(gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&self.name),
            contents: &self.data,
            usage: wgpu::BufferUsages::VERTEX,
        }));
        log::debug!("Uploaded vertex buffer {} ({} vertices)", self.name, self.count);
    }

    pub fn is_uploaded(&self) -> bool {
        self.buffer.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    Uint16,
    Uint32,
}

impl IndexFormat {
    pub fn size(self) -> u64 {
        match self {
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }

    pub(crate) fn to_wgpu(self) -> wgpu::IndexFormat {
        match self {
            Self::Uint16 => wgpu::IndexFormat::Uint16,
            Self::Uint32 => wgpu::IndexFormat::Uint32,
        }
    }
}

/// Immutable index buffer with a CPU shadow copy
#[derive(Debug)]
pub struct IndexBuffer {
    id: u64,
    name: String,
    format: IndexFormat,
    count: u32,
    data: Vec<u8>,
    pub(crate) buffer: Option<wgpu::Buffer>,
}

impl IndexBuffer {
    pub fn from_u16(name: impl Into<String>, indices: &[u16]) -> Self {
        Self::from_bytes(name.into(), IndexFormat::Uint16, indices.len(), bytemuck::cast_slice(indices))
    }

    pub fn from_u32(name: impl Into<String>, indices: &[u32]) -> Self {
        Self::from_bytes(name.into(), IndexFormat::Uint32, indices.len(), bytemuck::cast_slice(indices))
    }

    fn from_bytes(name: String, format: IndexFormat, count: usize, bytes: &[u8]) -> Self {
        // wgpu wants aligned copy sizes
        let mut data = bytes.to_vec();
        data.resize(data.len().next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT as usize), 0);
        Self {
            id: next_resource_id(),
            name,
            format,
            count: count as u32,
            data,
            buffer: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> IndexFormat {
        self.format
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Indices widened to `u32`
    pub fn indices(&self) -> Vec<u32> {
        let n = self.count as usize;
        match self.format {
            IndexFormat::Uint16 => bytemuck::pod_collect_to_vec::<u8, u16>(&self.data[..n * 2])
                .into_iter()
                .map(u32::from)
                .collect(),
            IndexFormat::Uint32 => bytemuck::pod_collect_to_vec(&self.data[..n * 4]),
        }
    }

    pub fn upload(&mut self, gpu: &Gpu) {
        if self.count == 0 {
            return;
        }
        self.buffer = Some(gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&self.name),
            contents: &self.data,
            usage: wgpu::BufferUsages::INDEX,
        }));
        log::debug!("Uploaded index buffer {} ({} indices)", self.name, self.count);
    }

    pub fn is_uploaded(&self) -> bool {
        self.buffer.is_some()
    }
}

/// Growable per-frame buffer, used for instance transforms.
///
/// Capacity only ever grows; the GPU buffer is recreated when a larger
/// capacity is requested and otherwise rewritten in place.
#[derive(Debug)]
pub struct DynamicVertexBuffer {
    id: u64,
    name: String,
    layout: VertexLayout,
    capacity: u32,
    uploads: u64,
    pub(crate) buffer: Option<wgpu::Buffer>,
}

impl DynamicVertexBuffer {
    pub fn new(name: impl Into<String>, layout: VertexLayout) -> Self {
        Self {
            id: next_resource_id(),
            name: name.into(),
            layout,
            capacity: 0,
            uploads: 0,
            buffer: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    /// Number of elements the buffer can hold
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of uploads issued so far
    pub fn upload_count(&self) -> u64 {
        self.uploads
    }

    /// Grow to hold at least `count` elements. Returns whether it grew.
    pub fn ensure_capacity(&mut self, gpu: Option<&Gpu>, count: u32) -> bool {
        if self.capacity >= count {
            return false;
        }
        self.capacity = count;
        self.buffer = gpu.map(|gpu| self.create_buffer(gpu));
        log::debug!("Resized dynamic buffer {} to {} elements", self.name, count);
        true
    }

    /// Write `data` at the start of the buffer
    pub fn update(&mut self, gpu: Option<&Gpu>, data: &[u8]) {
        debug_assert!(data.len() as u64 <= u64::from(self.capacity) * self.layout.stride);
        self.uploads += 1;
        let Some(gpu) = gpu else {
            return;
        };
        if self.buffer.is_none() {
            self.buffer = Some(self.create_buffer(gpu));
        }
        if let Some(buffer) = &self.buffer {
            gpu.queue.write_buffer(buffer, 0, data);
        }
    }

    fn create_buffer(&self, gpu: &Gpu) -> wgpu::Buffer {
        gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&self.name),
            size: (u64::from(self.capacity) * self.layout.stride).max(self.layout.stride),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }
}
