use winit::event::WindowEvent;

use crate::device::Gpu;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`Runtime`](crate::window::Runtime).
pub trait App {
    /// Called once, after the window and its GPU context exist and before the
    /// first frame. An error aborts startup and is returned from `Runtime::run`.
    fn on_gpu_ready(&mut self, gpu: &Gpu<'_>) -> anyhow::Result<()> {
        let _ = gpu;
        Ok(())
    }

    /// Called for every window event, after input state has been updated.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called once when the loop ends, while the GPU context is still alive.
    fn on_exit(&mut self) {}
}
