use anyhow::{Context, Result};

use learngl_engine::core::{App, AppControl, FrameCtx};
use learngl_engine::device::Gpu;
use learngl_engine::input::Key;
use learngl_engine::render::{compile_shader, DrawObject, ShaderProgram, ShaderStage, VertexArray};

use crate::letters::{
    last_vertex_first, CLEAR_COLOR, F_INDICES, F_VERTICES, T_INDICES, T_VERTICES,
};

pub const VERTEX_SHADER: &str = include_str!("../shaders/letters.vert.wgsl");
pub const FRAGMENT_SHADER: &str = include_str!("../shaders/letters.frag.wgsl");

/// GPU objects created once the device exists.
struct Scene {
    program: ShaderProgram,
    t_object: DrawObject,
    f_object: DrawObject,
}

/// Draws the "T" and "F" letters every frame until Escape or close.
#[derive(Default)]
pub struct LettersApp {
    scene: Option<Scene>,
}

impl LettersApp {
    pub fn new() -> Self {
        Self::default()
    }
}

fn build_scene(gpu: &Gpu<'_>) -> Result<Scene> {
    let device = gpu.device();

    let t_object = DrawObject::from_data(device, "T", &T_VERTICES, &last_vertex_first(&T_INDICES))
        .context("failed to upload T geometry")?;
    let f_object = DrawObject::from_data(device, "F", &F_VERTICES, &last_vertex_first(&F_INDICES))
        .context("failed to upload F geometry")?;

    let vs = compile_shader(VERTEX_SHADER, ShaderStage::Vertex)?;
    let fs = compile_shader(FRAGMENT_SHADER, ShaderStage::Fragment)?;
    let program = ShaderProgram::link(
        device,
        "letters",
        &vs,
        &fs,
        &VertexArray::new(),
        gpu.surface_format(),
    )?;

    Ok(Scene {
        program,
        t_object,
        f_object,
    })
}

impl App for LettersApp {
    fn on_gpu_ready(&mut self, gpu: &Gpu<'_>) -> Result<()> {
        let scene = build_scene(gpu)?;
        log::info!(
            "scene ready: T {} indices, F {} indices",
            scene.t_object.index_count(),
            scene.f_object.index_count()
        );
        self.scene = Some(scene);
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input.key_down(Key::Escape) {
            log::info!("escape pressed, closing");
            return AppControl::Exit;
        }

        let Some(scene) = &self.scene else {
            return AppControl::Continue;
        };

        ctx.render(CLEAR_COLOR, |pass| {
            scene.program.bind(pass);
            scene.t_object.draw(pass);
            scene.f_object.draw(pass);
        })
    }

    fn on_exit(&mut self) {
        // Release program and buffers while the device is still alive.
        self.scene = None;
    }
}
