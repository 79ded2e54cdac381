//! GPU resource wrappers and shader programs.
//!
//! Each wrapper owns exactly one GPU object and releases it on drop:
//! - `VertexBuffer` / `ElementBuffer`: static vertex and index data
//! - `VertexArray`: the attribute layout binding buffers to shader inputs
//! - `DrawObject`: the three above, drawn with one indexed call
//! - `ShaderProgram`: a linked vertex + fragment pipeline

pub mod buffer;
pub mod draw_object;
pub mod shader;
pub mod vertex_array;

pub use buffer::{BufferError, ElementBuffer, VertexBuffer};
pub use draw_object::DrawObject;
pub use shader::{compile_shader, CompiledShader, ShaderError, ShaderProgram, ShaderStage};
pub use vertex_array::{Vertex, VertexArray};
