//! Static GPU buffers.
//!
//! Both buffers are uploaded once at creation and never written again. The
//! underlying `wgpu::Buffer` is released when the wrapper is dropped.

use std::fmt;

use wgpu::util::DeviceExt;

use super::vertex_array::Vertex;

/// Rejected buffer contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// No vertices or no indices.
    Empty { label: String },
    /// Index count is not a whole number of triangles.
    NotTriangleList { label: String, count: usize },
    /// More elements than a `u32` draw range can address.
    TooLarge { label: String, len: usize },
    /// An index refers past the end of the vertex buffer.
    IndexOutOfRange { label: String, index: u32, vertex_count: u32 },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::Empty { label } => write!(f, "buffer '{label}' has no elements"),
            BufferError::NotTriangleList { label, count } => write!(
                f,
                "element buffer '{label}' has {count} indices, not a multiple of 3"
            ),
            BufferError::TooLarge { label, len } => {
                write!(f, "buffer '{label}' has {len} elements, more than u32::MAX")
            }
            BufferError::IndexOutOfRange { label, index, vertex_count } => write!(
                f,
                "'{label}' references vertex {index} but only {vertex_count} vertices exist"
            ),
        }
    }
}

impl std::error::Error for BufferError {}

fn element_count(label: &str, len: usize) -> Result<u32, BufferError> {
    if len == 0 {
        return Err(BufferError::Empty { label: label.to_owned() });
    }
    u32::try_from(len).map_err(|_| BufferError::TooLarge { label: label.to_owned(), len })
}

/// Checks index data for a triangle-list draw and returns `(count, max_index)`.
pub(crate) fn validate_indices(label: &str, indices: &[u32]) -> Result<(u32, u32), BufferError> {
    let count = element_count(label, indices.len())?;
    if indices.len() % 3 != 0 {
        return Err(BufferError::NotTriangleList {
            label: label.to_owned(),
            count: indices.len(),
        });
    }
    // Non-empty, so max() is always Some.
    let max_index = indices.iter().copied().max().unwrap_or(0);
    Ok((count, max_index))
}

/// Vertex data uploaded once with `VERTEX` usage.
#[derive(Debug)]
pub struct VertexBuffer {
    buffer: wgpu::Buffer,
    len: u32,
}

impl VertexBuffer {
    pub fn new(device: &wgpu::Device, label: &str, vertices: &[Vertex]) -> Result<Self, BufferError> {
        let len = element_count(label, vertices.len())?;

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        log::debug!("vertex buffer '{label}': {len} vertices, {} bytes", buffer.size());
        Ok(Self { buffer, len })
    }

    /// Number of vertices.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>, slot: u32) {
        pass.set_vertex_buffer(slot, self.buffer.slice(..));
    }
}

/// Triangle-list indices uploaded once with `INDEX` usage.
#[derive(Debug)]
pub struct ElementBuffer {
    buffer: wgpu::Buffer,
    count: u32,
    max_index: u32,
}

impl ElementBuffer {
    pub const FORMAT: wgpu::IndexFormat = wgpu::IndexFormat::Uint32;

    pub fn new(device: &wgpu::Device, label: &str, indices: &[u32]) -> Result<Self, BufferError> {
        let (count, max_index) = validate_indices(label, indices)?;

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::debug!("element buffer '{label}': {count} indices ({} triangles)", count / 3);
        Ok(Self { buffer, count, max_index })
    }

    /// Number of indices to draw.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Largest vertex index referenced.
    pub fn max_index(&self) -> u32 {
        self.max_index
    }

    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_index_buffer(self.buffer.slice(..), Self::FORMAT);
    }
}
