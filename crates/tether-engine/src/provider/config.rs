use std::fmt;

/// Framebuffer configuration requested by a renderer.
///
/// Bit counts are minimums. Providers may offer more but never less.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ConfigRequest {
    pub red_bits: u8,
    pub green_bits: u8,
    pub blue_bits: u8,
    pub alpha_bits: u8,
    pub depth_bits: u8,
    pub stencil_bits: u8,

    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present synchronized to the display refresh.
    pub vsync: bool,
}

impl Default for ConfigRequest {
    fn default() -> Self {
        Self {
            red_bits: 8,
            green_bits: 8,
            blue_bits: 8,
            alpha_bits: 0,
            depth_bits: 16,
            stencil_bits: 0,
            prefer_srgb: true,
            vsync: true,
        }
    }
}

impl ConfigRequest {
    /// Whether a configuration offering `offered` meets every minimum.
    pub fn is_satisfied_by(&self, offered: &ConfigRequest) -> bool {
        offered.red_bits >= self.red_bits
            && offered.green_bits >= self.green_bits
            && offered.blue_bits >= self.blue_bits
            && offered.alpha_bits >= self.alpha_bits
            && offered.depth_bits >= self.depth_bits
            && offered.stencil_bits >= self.stencil_bits
    }
}

impl fmt::Display for ConfigRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rgba{}{}{}{} depth{} stencil{}",
            self.red_bits,
            self.green_bits,
            self.blue_bits,
            self.alpha_bits,
            self.depth_bits,
            self.stencil_bits
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn larger_offer_satisfies_request() {
        let request = ConfigRequest::default();
        let offer = ConfigRequest {
            alpha_bits: 8,
            depth_bits: 24,
            stencil_bits: 8,
            ..request
        };
        assert!(request.is_satisfied_by(&offer));
    }

    #[test]
    fn missing_depth_is_rejected() {
        let request = ConfigRequest::default();
        let offer = ConfigRequest {
            depth_bits: 0,
            ..request
        };
        assert!(!request.is_satisfied_by(&offer));
    }

    #[test]
    fn display_lists_bit_depths() {
        assert_eq!(ConfigRequest::default().to_string(), "rgba8880 depth16 stencil0");
    }
}
