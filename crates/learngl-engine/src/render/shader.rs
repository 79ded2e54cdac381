//! Shader compilation and program linking.
//!
//! Each stage is compiled from its own WGSL source and validated on the CPU
//! with naga, so failures come back as a readable log instead of a device
//! error. Linking checks that the stages agree on their interface, then
//! builds the render pipeline.

use std::collections::BTreeMap;
use std::fmt;

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::vertex_array::VertexArray;

/// Programmable pipeline stage.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Entry point every shader of this stage must define.
    pub const fn entry_point(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_main",
            ShaderStage::Fragment => "fs_main",
        }
    }

    fn naga_stage(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

/// Compile or link failure with the diagnostic log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    Compile { stage: ShaderStage, log: String },
    Link { message: String },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Compile { stage, log } => {
                write!(f, "failed to compile {stage} shader:\n{log}")
            }
            ShaderError::Link { message } => write!(f, "failed to link shader program: {message}"),
        }
    }
}

impl std::error::Error for ShaderError {}

fn link_error(message: String) -> ShaderError {
    ShaderError::Link { message }
}

/// Scalar or vector type of a user-defined stage input or output.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct IoType {
    pub scalar: naga::Scalar,
    /// 1 for a scalar, 2..=4 for a vector.
    pub components: u8,
}

impl IoType {
    fn from_inner(inner: &naga::TypeInner) -> Option<Self> {
        match *inner {
            naga::TypeInner::Scalar(scalar) => Some(Self { scalar, components: 1 }),
            naga::TypeInner::Vector { size, scalar } => Some(Self {
                scalar,
                components: size as u8,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for IoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.scalar.kind {
            naga::ScalarKind::Float => "f",
            naga::ScalarKind::Sint => "i",
            naga::ScalarKind::Uint => "u",
            other => return write!(f, "{other:?}"),
        };
        let bits = u32::from(self.scalar.width) * 8;
        match self.components {
            1 => write!(f, "{prefix}{bits}"),
            n => write!(f, "vec{n}<{prefix}{bits}>"),
        }
    }
}

/// A `@location` value crossing a stage boundary.
///
/// Interpolation and sampling are stored with WGSL defaults filled in, so
/// `@interpolate(perspective)` and no attribute compare equal.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Varying {
    pub ty: IoType,
    pub interpolation: naga::Interpolation,
    pub sampling: naga::Sampling,
}

impl Varying {
    fn new(
        ty: IoType,
        interpolation: Option<naga::Interpolation>,
        sampling: Option<naga::Sampling>,
    ) -> Self {
        let interpolation = interpolation.unwrap_or(match ty.scalar.kind {
            naga::ScalarKind::Float => naga::Interpolation::Perspective,
            _ => naga::Interpolation::Flat,
        });
        let sampling = sampling.unwrap_or(match interpolation {
            naga::Interpolation::Flat => naga::Sampling::First,
            _ => naga::Sampling::Center,
        });
        Self { ty, interpolation, sampling }
    }
}

impl fmt::Display for Varying {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}, {:?})", self.ty, self.interpolation, self.sampling)
    }
}

/// A validated single-stage shader, ready to be linked.
#[derive(Debug)]
pub struct CompiledShader {
    stage: ShaderStage,
    source: String,
    inputs: BTreeMap<u32, Varying>,
    outputs: BTreeMap<u32, Varying>,
}

impl CompiledShader {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// `@location` arguments of the entry point, by location.
    pub fn inputs(&self) -> &BTreeMap<u32, Varying> {
        &self.inputs
    }

    /// `@location` results of the entry point, by location.
    pub fn outputs(&self) -> &BTreeMap<u32, Varying> {
        &self.outputs
    }
}

/// Parses and validates `source` as a shader for `stage`.
///
/// On failure the error is also logged, with the full diagnostic.
pub fn compile_shader(source: &str, stage: ShaderStage) -> Result<CompiledShader, ShaderError> {
    compile_inner(source, stage).map_err(|log| {
        let err = ShaderError::Compile { stage, log };
        log::error!("{err}");
        err
    })
}

fn compile_inner(source: &str, stage: ShaderStage) -> Result<CompiledShader, String> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| e.emit_to_string(source))?;

    let name = stage.entry_point();
    let entry = module
        .entry_points
        .iter()
        .find(|ep| ep.name == name)
        .ok_or_else(|| format!("no entry point `{name}`"))?;

    if entry.stage != stage.naga_stage() {
        return Err(format!(
            "entry point `{name}` is a {:?} entry point, expected {stage}",
            entry.stage
        ));
    }

    let mut inputs = BTreeMap::new();
    for arg in &entry.function.arguments {
        collect_varyings(&module, arg.ty, arg.binding.as_ref(), &mut inputs);
    }

    let mut outputs = BTreeMap::new();
    if let Some(result) = &entry.function.result {
        collect_varyings(&module, result.ty, result.binding.as_ref(), &mut outputs);
    }

    log::debug!(
        "compiled {stage} shader ({} inputs, {} outputs)",
        inputs.len(),
        outputs.len()
    );

    Ok(CompiledShader {
        stage,
        source: source.to_owned(),
        inputs,
        outputs,
    })
}

/// Records the `@location` values carried by one argument or result,
/// looking through one level of struct.
fn collect_varyings(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut BTreeMap<u32, Varying>,
) {
    match binding {
        Some(binding) => insert_varying(module, ty, binding, out),
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    if let Some(binding) = &m.binding {
                        insert_varying(module, m.ty, binding, out);
                    }
                }
            }
        }
    }
}

fn insert_varying(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: &naga::Binding,
    out: &mut BTreeMap<u32, Varying>,
) {
    // Builtins are not part of the user interface.
    let naga::Binding::Location { location, interpolation, sampling, .. } = *binding else {
        return;
    };
    if let Some(io) = IoType::from_inner(&module.types[ty].inner) {
        out.insert(location, Varying::new(io, interpolation, sampling));
    }
}

/// Checks that the stages fit together: right stage in each slot, and every
/// fragment input written by the vertex stage with the same type and
/// interpolation.
pub fn check_interface(vertex: &CompiledShader, fragment: &CompiledShader) -> Result<(), ShaderError> {
    if vertex.stage != ShaderStage::Vertex || fragment.stage != ShaderStage::Fragment {
        return Err(link_error(format!(
            "expected vertex + fragment, got {} + {}",
            vertex.stage, fragment.stage
        )));
    }

    let missing: Vec<String> = fragment
        .inputs
        .keys()
        .filter(|loc| !vertex.outputs.contains_key(*loc))
        .map(u32::to_string)
        .collect();

    if !missing.is_empty() {
        return Err(link_error(format!(
            "fragment input location(s) {} not written by the vertex stage",
            missing.join(", ")
        )));
    }

    for (location, read) in &fragment.inputs {
        let Some(written) = vertex.outputs.get(location) else {
            continue;
        };
        if written != read {
            return Err(link_error(format!(
                "location {location}: vertex stage writes {written}, fragment stage reads {read}"
            )));
        }
    }

    Ok(())
}

/// Scalar kind a vertex format delivers to the shader, for the formats
/// whose kind is unambiguous.
fn vertex_format_kind(format: wgpu::VertexFormat) -> Option<naga::ScalarKind> {
    use wgpu::VertexFormat as F;

    match format {
        F::Float32 | F::Float32x2 | F::Float32x3 | F::Float32x4 => Some(naga::ScalarKind::Float),
        F::Uint32 | F::Uint32x2 | F::Uint32x3 | F::Uint32x4 => Some(naga::ScalarKind::Uint),
        F::Sint32 | F::Sint32x2 | F::Sint32x3 | F::Sint32x4 => Some(naga::ScalarKind::Sint),
        _ => None,
    }
}

/// Checks that every vertex shader input is fed by an attribute of
/// `vertex_array` of a matching scalar kind.
pub fn check_vertex_inputs(
    vertex: &CompiledShader,
    vertex_array: &VertexArray,
) -> Result<(), ShaderError> {
    for (location, input) in &vertex.inputs {
        let Some(attr) = vertex_array
            .attributes()
            .iter()
            .find(|a| a.shader_location == *location)
        else {
            return Err(link_error(format!(
                "vertex input location {location} has no attribute in the vertex array"
            )));
        };

        if let Some(kind) = vertex_format_kind(attr.format) {
            if kind != input.ty.scalar.kind {
                return Err(link_error(format!(
                    "vertex input location {location} is {}, attribute format is {:?}",
                    input.ty, attr.format
                )));
            }
        }
    }

    Ok(())
}

/// A linked vertex + fragment program: the render pipeline.
///
/// Owns the only handle to its `wgpu::RenderPipeline`, which wgpu frees when
/// the program is dropped.
#[derive(Debug)]
pub struct ShaderProgram {
    label: String,
    pipeline: wgpu::RenderPipeline,
}

impl ShaderProgram {
    /// Links two compiled stages against `vertex_array` for `format` targets.
    pub fn link(
        device: &wgpu::Device,
        label: &str,
        vertex: &CompiledShader,
        fragment: &CompiledShader,
        vertex_array: &VertexArray,
        format: wgpu::TextureFormat,
    ) -> Result<Self, ShaderError> {
        let checked = check_interface(vertex, fragment)
            .and_then(|()| check_vertex_inputs(vertex, vertex_array));
        if let Err(err) = checked {
            log::error!("{err}");
            return Err(err);
        }

        let vs = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} vertex")),
            source: wgpu::ShaderSource::Wgsl(vertex.source().into()),
        });
        let fs = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{label} fragment")),
            source: wgpu::ShaderSource::Wgsl(fragment.source().into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{label} layout")),
            bind_group_layouts: &[],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&layout),

            vertex: wgpu::VertexState {
                module: &vs,
                entry_point: Some(ShaderStage::Vertex.entry_point()),
                compilation_options: Default::default(),
                buffers: &[vertex_array.layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &fs,
                entry_point: Some(ShaderStage::Fragment.entry_point()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::info!("linked shader program '{label}' for {format:?}");
        Ok(Self {
            label: label.to_owned(),
            pipeline,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Makes this program current for subsequent draws in `pass`.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        log::debug!("releasing shader program '{}'", self.label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERTEX: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) color: vec4<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(position, 1.0);
    out.color = color;
    return out;
}
"#;

    const FRAGMENT: &str = r#"
@fragment
fn fs_main(@location(0) color: vec4<f32>) -> @location(0) vec4<f32> {
    return color;
}
"#;

    const FRAGMENT_NEEDS_UV: &str = r#"
@fragment
fn fs_main(@location(0) color: vec4<f32>, @location(3) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return color * uv.x;
}
"#;

    // Reads an attribute the vertex array does not have and writes a vec2.
    const VERTEX_VEC2_OUT: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec2<f32>,
};

@vertex
fn vs_main(@location(5) position: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(position, 1.0);
    out.color = position.xy;
    return out;
}
"#;

    const FRAGMENT_FLAT: &str = r#"
@fragment
fn fs_main(@location(0) @interpolate(flat) color: vec4<f32>) -> @location(0) vec4<f32> {
    return color;
}
"#;

    fn vec4_f32() -> IoType {
        IoType { scalar: naga::Scalar::F32, components: 4 }
    }

    #[test]
    fn compiles_vertex_stage_and_records_interface() {
        let vs = compile_shader(VERTEX, ShaderStage::Vertex).unwrap();
        assert_eq!(vs.stage(), ShaderStage::Vertex);
        assert_eq!(vs.inputs().keys().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(vs.outputs().keys().copied().collect::<Vec<_>>(), vec![0]);
        assert_eq!(vs.outputs()[&0].ty, vec4_f32());
    }

    #[test]
    fn compiles_fragment_stage_and_records_inputs() {
        let fs = compile_shader(FRAGMENT, ShaderStage::Fragment).unwrap();
        assert_eq!(fs.inputs().keys().copied().collect::<Vec<_>>(), vec![0]);
        assert_eq!(fs.inputs()[&0].interpolation, naga::Interpolation::Perspective);
    }

    #[test]
    fn flat_attribute_is_recorded() {
        let fs = compile_shader(FRAGMENT_FLAT, ShaderStage::Fragment).unwrap();
        assert_eq!(fs.inputs()[&0].interpolation, naga::Interpolation::Flat);
    }

    #[test]
    fn syntax_error_reports_log() {
        let err = compile_shader("@vertex fn vs_main( -> {", ShaderStage::Vertex).unwrap_err();
        let ShaderError::Compile { stage, log } = &err else {
            panic!("expected compile error, got {err:?}");
        };
        assert_eq!(*stage, ShaderStage::Vertex);
        assert!(!log.is_empty());
        assert!(err.to_string().starts_with("failed to compile vertex shader"));
    }

    #[test]
    fn type_error_fails_validation() {
        let src = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    let x: f32 = vec2<f32>(1.0, 2.0);
    return vec4<f32>(x);
}
"#;
        assert!(matches!(
            compile_shader(src, ShaderStage::Fragment),
            Err(ShaderError::Compile { stage: ShaderStage::Fragment, .. })
        ));
    }

    #[test]
    fn missing_entry_point_is_a_compile_error() {
        let err = compile_shader(FRAGMENT, ShaderStage::Vertex).unwrap_err();
        assert_eq!(
            err,
            ShaderError::Compile {
                stage: ShaderStage::Vertex,
                log: "no entry point `vs_main`".into(),
            }
        );
    }

    #[test]
    fn entry_point_with_wrong_stage_is_rejected() {
        let src = r#"
@fragment
fn vs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;
        let err = compile_shader(src, ShaderStage::Vertex).unwrap_err();
        assert!(err.to_string().contains("expected vertex"));
    }

    #[test]
    fn matching_interface_links() {
        let vs = compile_shader(VERTEX, ShaderStage::Vertex).unwrap();
        let fs = compile_shader(FRAGMENT, ShaderStage::Fragment).unwrap();
        assert!(check_interface(&vs, &fs).is_ok());
    }

    #[test]
    fn unwritten_fragment_input_fails_link() {
        let vs = compile_shader(VERTEX, ShaderStage::Vertex).unwrap();
        let fs = compile_shader(FRAGMENT_NEEDS_UV, ShaderStage::Fragment).unwrap();
        assert_eq!(
            check_interface(&vs, &fs),
            Err(ShaderError::Link {
                message: "fragment input location(s) 3 not written by the vertex stage".into(),
            })
        );
    }

    #[test]
    fn type_mismatch_fails_link() {
        let vs = compile_shader(VERTEX_VEC2_OUT, ShaderStage::Vertex).unwrap();
        let fs = compile_shader(FRAGMENT, ShaderStage::Fragment).unwrap();
        let err = check_interface(&vs, &fs).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("location 0"), "{msg}");
        assert!(msg.contains("vec2<f32>") && msg.contains("vec4<f32>"), "{msg}");
    }

    #[test]
    fn interpolation_mismatch_fails_link() {
        let vs = compile_shader(VERTEX, ShaderStage::Vertex).unwrap();
        let fs = compile_shader(FRAGMENT_FLAT, ShaderStage::Fragment).unwrap();
        let err = check_interface(&vs, &fs).unwrap_err();
        assert!(err.to_string().contains("Flat"), "{err}");
    }

    #[test]
    fn vertex_inputs_match_vertex_array() {
        let vs = compile_shader(VERTEX, ShaderStage::Vertex).unwrap();
        assert!(check_vertex_inputs(&vs, &VertexArray::new()).is_ok());
    }

    #[test]
    fn vertex_input_without_attribute_fails_link() {
        let vs = compile_shader(VERTEX_VEC2_OUT, ShaderStage::Vertex).unwrap();
        assert_eq!(
            check_vertex_inputs(&vs, &VertexArray::new()),
            Err(ShaderError::Link {
                message: "vertex input location 5 has no attribute in the vertex array".into(),
            })
        );
    }

    #[test]
    fn vertex_input_kind_must_match_attribute_format() {
        let src = r#"
@vertex
fn vs_main(@location(0) position: vec3<u32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(vec3<f32>(position), 1.0);
}
"#;
        let vs = compile_shader(src, ShaderStage::Vertex).unwrap();
        let err = check_vertex_inputs(&vs, &VertexArray::new()).unwrap_err();
        assert!(err.to_string().contains("vec3<u32>"), "{err}");
    }

    #[test]
    fn default_interpolation_matches_explicit_perspective() {
        let ty = vec4_f32();
        assert_eq!(
            Varying::new(ty, None, None),
            Varying::new(
                ty,
                Some(naga::Interpolation::Perspective),
                Some(naga::Sampling::Center)
            )
        );
    }

    #[test]
    fn swapped_stages_fail_link() {
        let vs = compile_shader(VERTEX, ShaderStage::Vertex).unwrap();
        let fs = compile_shader(FRAGMENT, ShaderStage::Fragment).unwrap();
        assert!(matches!(check_interface(&fs, &vs), Err(ShaderError::Link { .. })));
    }

    #[test]
    fn stage_names() {
        assert_eq!(ShaderStage::Vertex.to_string(), "vertex");
        assert_eq!(ShaderStage::Fragment.entry_point(), "fs_main");
    }
}
