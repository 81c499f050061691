//! Drawing surface contract consumed by the render pass
//!
//! The core never implements a real backend; it drives an opaque surface
//! through batched passes, one per camera. Hosts supply an
//! implementation backed by whatever graphics API they use, and
//! [`NullSurface`] stands in when no backend exists (headless runs,
//! tests).

use crate::foundation::math::Mat3;

/// RGBA color with components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red component
    pub r: f32,
    /// Green component
    pub g: f32,
    /// Blue component
    pub b: f32,
    /// Alpha component
    pub a: f32,
}

impl Color {
    /// Opaque black
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Opaque white
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Fully transparent
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Create a color from components
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Texture sampling mode requested for a draw pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplerMode {
    /// Nearest-neighbor sampling, clamped at edges (pixel-art default)
    #[default]
    PointClamp,
    /// Linear filtering, clamped at edges
    LinearClamp,
    /// Nearest-neighbor sampling, wrapping
    PointWrap,
    /// Linear filtering, wrapping
    LinearWrap,
}

/// Opaque handle to a host-compiled shader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u64);

/// Batched drawing surface provided by the host renderer.
///
/// The render pass brackets each camera's draws between `begin_pass` and
/// `end_pass`; components issue their actual draw calls through
/// host-side helpers that share the same surface.
pub trait DrawSurface {
    /// Begin a batched draw pass with the camera's view transform
    fn begin_pass(&mut self, view: &Mat3, sampler: SamplerMode, shader: Option<ShaderHandle>);

    /// End the current draw pass
    fn end_pass(&mut self);

    /// Clear the surface to a solid color
    fn clear(&mut self, color: Color);
}

/// Surface that discards every call.
///
/// The one well-defined null object for rendering; pass it explicitly
/// where no backend exists instead of threading an optional surface
/// through the frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl DrawSurface for NullSurface {
    fn begin_pass(&mut self, _view: &Mat3, _sampler: SamplerMode, _shader: Option<ShaderHandle>) {}

    fn end_pass(&mut self) {}

    fn clear(&mut self, _color: Color) {}
}
