use winit::dpi::PhysicalSize;

use super::SurfaceErrorAction;

/// Picks a surface format from the formats the surface supports.
///
/// Prefers the first format whose sRGB-ness matches `prefer_srgb`, then falls
/// back to the first supported format. `None` only for an empty list.
pub fn choose_surface_format(
    formats: &[wgpu::TextureFormat],
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|f| f.is_srgb() == prefer_srgb)
        .or_else(|| formats.first().copied())
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Applies a framebuffer resize.
///
/// wgpu rejects 0x0 surfaces; a minimised window only records the size and
/// configuration is deferred until it is restored.
pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut PhysicalSize<u32>,
    new_size: PhysicalSize<u32>,
) {
    *size = new_size;
    if new_size.width == 0 || new_size.height == 0 {
        return;
    }

    config.width = new_size.width;
    config.height = new_size.height;
    surface.configure(device, config);
    log::debug!("surface resized to {}x{}", new_size.width, new_size.height);
}

pub(crate) fn recover_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    err: wgpu::SurfaceError,
) -> SurfaceErrorAction {
    let action = SurfaceErrorAction::for_error(&err);
    match action {
        SurfaceErrorAction::Reconfigured => {
            if size.width > 0 && size.height > 0 {
                surface.configure(device, config);
            }
            log::debug!("surface {err}; reconfigured");
        }
        SurfaceErrorAction::SkipFrame => log::warn!("surface {err}; skipping frame"),
        SurfaceErrorAction::Fatal => log::error!("surface {err}; giving up"),
    }
    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat as F;

    #[test]
    fn picks_linear_format_when_srgb_not_wanted() {
        let formats = [F::Bgra8UnormSrgb, F::Bgra8Unorm];
        assert_eq!(choose_surface_format(&formats, false), Some(F::Bgra8Unorm));
    }

    #[test]
    fn picks_srgb_format_when_wanted() {
        let formats = [F::Bgra8Unorm, F::Rgba8UnormSrgb];
        assert_eq!(choose_surface_format(&formats, true), Some(F::Rgba8UnormSrgb));
    }

    #[test]
    fn falls_back_to_first_format() {
        let formats = [F::Rgba8UnormSrgb];
        assert_eq!(choose_surface_format(&formats, false), Some(F::Rgba8UnormSrgb));
    }

    #[test]
    fn empty_format_list_has_no_choice() {
        assert_eq!(choose_surface_format(&[], true), None);
    }
}
