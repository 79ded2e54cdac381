use anyhow::{Context, Result};

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use crate::core::{App, AppControl};
use crate::device::GpuInit;
use crate::input::platform::winit::translate_window_event;

use super::display::{Display, DisplayConfig};

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window and runs `app` until the window closes.
    ///
    /// Returns the first startup error (window, GPU or `App::on_gpu_ready`).
    pub fn run<A>(config: DisplayConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct AppState<A>
where
    A: App + 'static,
{
    config: DisplayConfig,
    gpu_init: GpuInit,
    app: A,

    display: Option<Display>,
    exit_requested: bool,
    error: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: DisplayConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            display: None,
            exit_requested: false,
            error: None,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error.get_or_insert(err);
        self.request_exit(event_loop);
    }

    fn startup(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let display = Display::open(event_loop, &self.config, self.gpu_init.clone())?;
        display
            .gpu_ready(&mut self.app)
            .context("application setup failed")?;

        display.request_redraw();
        self.display = Some(display);
        Ok(())
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.display.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.startup(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Render continuously; presentation (FIFO) paces the loop.
        event_loop.set_control_flow(ControlFlow::Poll);
        if let Some(display) = &self.display {
            display.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            return;
        }

        let (app, Some(display)) = (&mut self.app, self.display.as_mut()) else {
            return;
        };

        if let Some(ev) = translate_window_event(&event) {
            display.apply_input(ev);
        }

        let mut control = app.on_window_event(&event);

        match &event {
            WindowEvent::CloseRequested => {
                log::info!("close requested");
                control = AppControl::Exit;
            }

            WindowEvent::Resized(new_size) => display.resize(*new_size),

            WindowEvent::ScaleFactorChanged { .. } => display.refresh_size(),

            WindowEvent::RedrawRequested if control == AppControl::Continue => {
                control = display.run_frame(app);
            }

            _ => {}
        }

        if control == AppControl::Exit {
            self.request_exit(event_loop);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(display) = self.display.take() {
            self.app.on_exit();
            drop(display);
            log::info!("window closed");
        }
    }
}
