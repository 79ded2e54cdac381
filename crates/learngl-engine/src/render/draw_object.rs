use super::buffer::{BufferError, ElementBuffer, VertexBuffer};
use super::vertex_array::{Vertex, VertexArray};

/// A vertex array, its vertex buffer and its element buffer, drawn together
/// with one indexed call.
#[derive(Debug)]
pub struct DrawObject {
    label: String,
    vao: VertexArray,
    vbo: VertexBuffer,
    ebo: ElementBuffer,
}

impl DrawObject {
    /// Assembles a draw object, rejecting indices past the end of `vbo`.
    pub fn new(
        label: impl Into<String>,
        vao: VertexArray,
        vbo: VertexBuffer,
        ebo: ElementBuffer,
    ) -> Result<Self, BufferError> {
        let label = label.into();
        check_index_range(&label, ebo.max_index(), vbo.len())?;
        Ok(Self { label, vao, vbo, ebo })
    }

    /// Uploads `vertices` and `indices` and assembles the draw object.
    pub fn from_data(
        device: &wgpu::Device,
        label: impl Into<String>,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> Result<Self, BufferError> {
        let label = label.into();
        let vbo = VertexBuffer::new(device, &format!("{label} vbo"), vertices)?;
        let ebo = ElementBuffer::new(device, &format!("{label} ebo"), indices)?;
        Self::new(label, VertexArray::new(), vbo, ebo)
    }

    pub fn index_count(&self) -> u32 {
        self.ebo.count()
    }

    /// Binds the buffers and issues the indexed draw.
    ///
    /// The caller must have bound a pipeline built against the same vertex layout.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.vao.bind(pass, &self.vbo);
        self.ebo.bind(pass);
        pass.draw_indexed(0..self.ebo.count(), 0, 0..1);
        log::trace!("drew '{}' ({} indices)", self.label, self.ebo.count());
    }
}

fn check_index_range(label: &str, max_index: u32, vertex_count: u32) -> Result<(), BufferError> {
    if max_index >= vertex_count {
        return Err(BufferError::IndexOutOfRange {
            label: label.to_owned(),
            index: max_index,
            vertex_count,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_vertex_is_addressable() {
        assert!(check_index_range("T", 7, 8).is_ok());
    }

    #[test]
    fn index_equal_to_count_is_out_of_range() {
        assert_eq!(
            check_index_range("T", 8, 8),
            Err(BufferError::IndexOutOfRange { label: "T".into(), index: 8, vertex_count: 8 })
        );
    }
}
