use crate::provider::ConfigRequest;

/// How the provider reacts to a failed frame acquisition.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface configuration is stale; reconfigure and try next frame.
    Reconfigure,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// The surface or device is gone; report a context loss.
    Lost,
}

pub(crate) fn classify_surface_error(err: &wgpu::SurfaceError) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Outdated => SurfaceErrorAction::Reconfigure,
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Lost,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

/// Depth and stencil come from renderer-owned textures; wgpu tops out at
/// 32-bit depth and 8-bit stencil.
pub(crate) fn supports_request(request: &ConfigRequest) -> bool {
    request.depth_bits <= 32
        && request.stencil_bits <= 8
        && request.red_bits <= 8
        && request.green_bits <= 8
        && request.blue_bits <= 8
        && request.alpha_bits <= 8
}

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        for f in preferred {
            if caps.formats.contains(&f) {
                return Some(f);
            }
        }
    }

    caps.formats
        .iter()
        .copied()
        .find(|f| !f.is_srgb() || prefer_srgb)
        .or_else(|| caps.formats.first().copied())
}

/// An explicit preference wins; a translucent request picks a blending mode.
pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
    wants_alpha: bool,
) -> wgpu::CompositeAlphaMode {
    let blended = [
        wgpu::CompositeAlphaMode::PreMultiplied,
        wgpu::CompositeAlphaMode::PostMultiplied,
    ];
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| {
            wants_alpha
                .then(|| blended.into_iter().find(|m| caps.alpha_modes.contains(m)))
                .flatten()
        })
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// FIFO is always supported; without vsync prefer tear-free Mailbox.
pub(crate) fn choose_present_mode(
    caps: &wgpu::SurfaceCapabilities,
    vsync: bool,
) -> wgpu::PresentMode {
    if vsync {
        return wgpu::PresentMode::Fifo;
    }
    [wgpu::PresentMode::Mailbox, wgpu::PresentMode::Immediate]
        .into_iter()
        .find(|m| caps.present_modes.contains(m))
        .unwrap_or(wgpu::PresentMode::Fifo)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(
        formats: Vec<wgpu::TextureFormat>,
        present_modes: Vec<wgpu::PresentMode>,
        alpha_modes: Vec<wgpu::CompositeAlphaMode>,
    ) -> wgpu::SurfaceCapabilities {
        wgpu::SurfaceCapabilities {
            formats,
            present_modes,
            alpha_modes,
            ..Default::default()
        }
    }

    #[test]
    fn prefers_srgb_formats_when_asked() {
        let c = caps(
            vec![
                wgpu::TextureFormat::Bgra8Unorm,
                wgpu::TextureFormat::Bgra8UnormSrgb,
            ],
            vec![],
            vec![],
        );
        assert_eq!(
            choose_surface_format(&c, true),
            Some(wgpu::TextureFormat::Bgra8UnormSrgb)
        );
        assert_eq!(
            choose_surface_format(&c, false),
            Some(wgpu::TextureFormat::Bgra8Unorm)
        );
        assert_eq!(choose_surface_format(&caps(vec![], vec![], vec![]), true), None);
    }

    #[test]
    fn adapter_that_cannot_present_offers_no_format() {
        let unsupported = wgpu::SurfaceCapabilities::default();
        assert_eq!(choose_surface_format(&unsupported, true), None);
        assert_eq!(choose_surface_format(&unsupported, false), None);
        assert_eq!(
            choose_alpha_mode(&unsupported, None, false),
            wgpu::CompositeAlphaMode::Auto
        );
        assert_eq!(choose_present_mode(&unsupported, false), wgpu::PresentMode::Fifo);
    }

    #[test]
    fn present_mode_follows_vsync() {
        let c = caps(
            vec![],
            vec![wgpu::PresentMode::Fifo, wgpu::PresentMode::Immediate],
            vec![],
        );
        assert_eq!(choose_present_mode(&c, true), wgpu::PresentMode::Fifo);
        assert_eq!(choose_present_mode(&c, false), wgpu::PresentMode::Immediate);

        let fifo_only = caps(vec![], vec![wgpu::PresentMode::Fifo], vec![]);
        assert_eq!(choose_present_mode(&fifo_only, false), wgpu::PresentMode::Fifo);
    }

    #[test]
    fn alpha_mode_honours_support() {
        let c = caps(
            vec![],
            vec![],
            vec![
                wgpu::CompositeAlphaMode::Opaque,
                wgpu::CompositeAlphaMode::PreMultiplied,
            ],
        );
        assert_eq!(
            choose_alpha_mode(&c, None, false),
            wgpu::CompositeAlphaMode::Opaque
        );
        assert_eq!(
            choose_alpha_mode(&c, None, true),
            wgpu::CompositeAlphaMode::PreMultiplied
        );
        assert_eq!(
            choose_alpha_mode(&c, Some(wgpu::CompositeAlphaMode::Inherit), true),
            wgpu::CompositeAlphaMode::PreMultiplied
        );
        assert_eq!(
            choose_alpha_mode(&caps(vec![], vec![], vec![]), None, false),
            wgpu::CompositeAlphaMode::Auto
        );
    }

    #[test]
    fn lost_and_oom_surfaces_are_context_loss() {
        assert_eq!(
            classify_surface_error(&wgpu::SurfaceError::Lost),
            SurfaceErrorAction::Lost
        );
        assert_eq!(
            classify_surface_error(&wgpu::SurfaceError::OutOfMemory),
            SurfaceErrorAction::Lost
        );
        assert_eq!(
            classify_surface_error(&wgpu::SurfaceError::Outdated),
            SurfaceErrorAction::Reconfigure
        );
        assert_eq!(
            classify_surface_error(&wgpu::SurfaceError::Timeout),
            SurfaceErrorAction::SkipFrame
        );
    }

    #[test]
    fn rejects_requests_beyond_wgpu_formats() {
        assert!(supports_request(&ConfigRequest::default()));
        assert!(!supports_request(&ConfigRequest {
            stencil_bits: 16,
            ..ConfigRequest::default()
        }));
        assert!(!supports_request(&ConfigRequest {
            red_bits: 10,
            ..ConfigRequest::default()
        }));
    }
}
