use bytemuck::{Pod, Zeroable};

use super::buffer::VertexBuffer;

/// Vertex buffer slot the vertex array binds its buffer to.
pub const VERTEX_SLOT: u32 = 0;

/// Interleaved vertex: position followed by colour, 7 floats.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    pub const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x4  // color
    ];

    #[inline]
    pub const fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }
}

/// Records how vertex buffer bytes map onto shader inputs.
///
/// wgpu has no vertex array object; the attribute layout is baked into the
/// pipeline and the buffer is bound per pass. This type owns both halves of
/// that contract so pipelines and draws agree on it.
#[derive(Debug, Clone)]
pub struct VertexArray {
    attributes: [wgpu::VertexAttribute; 2],
    stride: wgpu::BufferAddress,
}

impl VertexArray {
    pub fn new() -> Self {
        Self {
            attributes: Vertex::ATTRS,
            stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        }
    }

    pub fn stride(&self) -> wgpu::BufferAddress {
        self.stride
    }

    pub fn attributes(&self) -> &[wgpu::VertexAttribute] {
        &self.attributes
    }

    /// Layout handed to pipeline creation.
    pub fn layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }

    /// Binds `vbo` as the source for this layout.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>, vbo: &VertexBuffer) {
        vbo.bind(pass, VERTEX_SLOT);
    }
}

impl Default for VertexArray {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_is_seven_floats() {
        assert_eq!(VertexArray::new().stride(), 7 * 4);
        assert_eq!(std::mem::size_of::<Vertex>(), 28);
    }

    #[test]
    fn position_then_color() {
        let vao = VertexArray::new();
        let attrs = vao.attributes();

        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].shader_location, 0);
        assert_eq!(attrs[0].offset, 0);
        assert_eq!(attrs[0].format, wgpu::VertexFormat::Float32x3);
        assert_eq!(attrs[1].shader_location, 1);
        assert_eq!(attrs[1].offset, 12);
        assert_eq!(attrs[1].format, wgpu::VertexFormat::Float32x4);
    }

    #[test]
    fn vertex_bytes_are_interleaved() {
        let v = Vertex::new([1.0, 2.0, 3.0], [0.5, 0.25, 0.125, 1.0]);
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&v));
        assert_eq!(floats, &[1.0, 2.0, 3.0, 0.5, 0.25, 0.125, 1.0]);
    }
}
