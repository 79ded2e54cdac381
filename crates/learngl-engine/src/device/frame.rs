/// A single acquired frame.
///
/// Short-lived: holding the surface texture prevents acquisition of the next
/// frame. Hand it back to [`Gpu::submit`](super::Gpu::submit) promptly.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
