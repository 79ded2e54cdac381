use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

use crate::core::{App, AppControl, FrameCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::{InputEvent, InputState};

/// Window configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    pub title: String,
    /// Initial inner width in logical pixels.
    pub width: u32,
    /// Initial inner height in logical pixels.
    pub height: u32,
    pub resizable: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            title: "LearnOpenGL".to_string(),
            width: 800,
            height: 600,
            resizable: true,
        }
    }
}

/// The window and the GPU context drawing into it.
///
/// The surface borrows the window, so both live in one self-referencing
/// value and are dropped together.
#[self_referencing]
pub(crate) struct Display {
    input_state: InputState,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

impl Display {
    /// Opens the window and creates its GPU context.
    pub(crate) fn open(
        event_loop: &ActiveEventLoop,
        config: &DisplayConfig,
        gpu_init: GpuInit,
    ) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(LogicalSize::new(config.width, config.height))
            .with_resizable(config.resizable);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let display = DisplayTryBuilder {
            input_state: InputState::default(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("failed to initialize GPU for window")?;

        log::info!(
            "opened '{}' ({}x{})",
            config.title,
            config.width,
            config.height
        );
        Ok(display)
    }

    pub(crate) fn request_redraw(&self) {
        self.with_window(|w| w.request_redraw());
    }

    pub(crate) fn apply_input(&mut self, ev: InputEvent) {
        self.with_input_state_mut(|state| state.apply_event(ev));
    }

    /// Framebuffer size callback: reconfigures the surface.
    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.with_gpu_mut(|gpu| gpu.resize(new_size));
        self.request_redraw();
    }

    /// Re-reads the window size, e.g. after a scale factor change.
    pub(crate) fn refresh_size(&mut self) {
        let size = self.with_window(|w| w.inner_size());
        self.resize(size);
    }

    pub(crate) fn gpu_ready<A: App>(&self, app: &mut A) -> Result<()> {
        self.with_gpu(|gpu| {
            let info = gpu.adapter_info();
            log::info!(
                "GPU: {} ({:?}, {:?} backend, driver {} {})",
                info.name,
                info.device_type,
                info.backend,
                info.driver,
                info.driver_info
            );
            app.on_gpu_ready(gpu)
        })
    }

    /// Drives one frame of `app`.
    pub(crate) fn run_frame<A: App>(&mut self, app: &mut A) -> AppControl {
        self.with_mut(|f| {
            let mut ctx = FrameCtx {
                window: f.window,
                gpu: f.gpu,
                input: f.input_state,
            };
            app.on_frame(&mut ctx)
        })
    }
}
