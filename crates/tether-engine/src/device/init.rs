/// Initialization parameters for the wgpu provider.
///
/// Framebuffer preferences (sRGB, vsync) come from the renderer's
/// `ConfigRequest`; this struct only holds what the renderer cannot express.
#[derive(Debug, Clone)]
pub struct WgpuInit {
    /// Backends the instance may use.
    pub backends: wgpu::Backends,

    pub power_preference: wgpu::PowerPreference,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Required wgpu features.
    ///
    /// Favor an empty set for portability unless a feature is strictly necessary.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface. A hint.
    pub desired_maximum_frame_latency: u32,
}

impl Default for WgpuInit {
    fn default() -> Self {
        Self {
            backends: wgpu::Backends::all(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
