mod pixmap;

pub use pixmap::PixmapSurface;

use serde::{Deserialize, Serialize};

/// Straight (non-premultiplied) colour with float channels in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub fn from_rgb8(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Rgba,
}

/// Compositing mode for subsequent commands.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Blend {
    /// Source-over.
    #[default]
    Normal,
    /// Overlapping draws sum their brightness.
    Additive,
}

/// Gradient used to fill rectangles and stroke polylines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gradient {
    Linear {
        start: Point,
        end: Point,
        stops: Vec<GradientStop>,
    },
    Radial {
        center: Point,
        radius: f32,
        stops: Vec<GradientStop>,
    },
}

/// Soft halo drawn beneath a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Glow {
    pub radius: f32,
    pub color: Rgba,
}

/// Backend-neutral drawing instruction. Coordinates are physical buffer
/// pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    /// Erase the whole buffer to transparent. Marks the start of a frame.
    Clear,
    SetBlend(Blend),
    /// Ellipse filled with a radial gradient running from its centre
    /// (offset 0) to its rim (offset 1).
    FillEllipse {
        center: Point,
        radius_x: f32,
        radius_y: f32,
        stops: Vec<GradientStop>,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        gradient: Gradient,
    },
    StrokePolyline {
        points: Vec<Point>,
        width: f32,
        gradient: Gradient,
        glow: Option<Glow>,
    },
}

/// Anything the compositor can paint into.
pub trait Surface {
    /// Replaces the backing store. Previous contents are discarded.
    fn resize(&mut self, width: u32, height: u32);

    /// Current backing store size in physical pixels.
    fn size(&self) -> (u32, u32);

    /// Whether a frame can be drawn right now.
    fn is_ready(&self) -> bool {
        let (width, height) = self.size();
        width > 0 && height > 0
    }

    fn draw(&mut self, command: &DrawCommand);
}

/// Logical (layout) size of the host viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Logical viewport mapped onto a physical pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceGeometry {
    pub logical_width: f32,
    pub logical_height: f32,
    pub pixel_ratio: f32,
    pub buffer_width: u32,
    pub buffer_height: u32,
}

impl SurfaceGeometry {
    pub fn new(viewport: Viewport, pixel_ratio: f32) -> Self {
        let pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            1.0
        };

        Self {
            logical_width: viewport.width,
            logical_height: viewport.height,
            pixel_ratio,
            buffer_width: to_buffer_extent(viewport.width, pixel_ratio),
            buffer_height: to_buffer_extent(viewport.height, pixel_ratio),
        }
    }

    /// False while layout reports a collapsed viewport.
    pub fn is_drawable(&self) -> bool {
        self.buffer_width > 0 && self.buffer_height > 0
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.buffer_width as f32 * 0.5,
            self.buffer_height as f32 * 0.5,
        )
    }
}

fn to_buffer_extent(logical: f32, pixel_ratio: f32) -> u32 {
    let physical = (logical * pixel_ratio).round();
    if physical.is_finite() && physical > 0.0 {
        physical as u32
    } else {
        0
    }
}

/// Sizes `surface` for `viewport` at `pixel_ratio` and returns the geometry
/// frames should use from now on.
pub fn resize<S: Surface + ?Sized>(
    surface: &mut S,
    viewport: Viewport,
    pixel_ratio: f32,
) -> SurfaceGeometry {
    let geometry = SurfaceGeometry::new(viewport, pixel_ratio);
    surface.resize(geometry.buffer_width, geometry.buffer_height);
    tracing::debug!(
        logical_width = geometry.logical_width,
        logical_height = geometry.logical_height,
        pixel_ratio = geometry.pixel_ratio,
        buffer_width = geometry.buffer_width,
        buffer_height = geometry.buffer_height,
        "resized surface"
    );
    geometry
}

/// Surface that records the commands of the most recent frame instead of
/// rasterising them.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    available: bool,
    commands: Vec<DrawCommand>,
    frames: usize,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            available: true,
            commands: Vec::new(),
            frames: 0,
        }
    }

    /// Simulates a drawing context that cannot currently be acquired.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Commands issued since the last [`DrawCommand::Clear`].
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of frames started on this surface.
    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl Surface for RecordingSurface {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.commands.clear();
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn is_ready(&self) -> bool {
        self.available && self.width > 0 && self.height > 0
    }

    fn draw(&mut self, command: &DrawCommand) {
        if matches!(command, DrawCommand::Clear) {
            self.commands.clear();
            self.frames += 1;
        }
        self.commands.push(command.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_scales_by_pixel_ratio() {
        let mut surface = RecordingSurface::new();
        let geometry = resize(&mut surface, Viewport::new(800.0, 400.0), 2.0);

        assert_eq!((geometry.buffer_width, geometry.buffer_height), (1600, 800));
        assert_eq!(surface.size(), (1600, 800));
        assert!(surface.is_ready());
    }

    #[test]
    fn fractional_sizes_round_to_nearest_pixel() {
        let geometry = SurfaceGeometry::new(Viewport::new(333.3, 100.25), 1.5);
        assert_eq!(geometry.buffer_width, 500);
        assert_eq!(geometry.buffer_height, 150);
    }

    #[test]
    fn invalid_pixel_ratio_falls_back_to_one() {
        for ratio in [0.0, -2.0, f32::NAN] {
            let geometry = SurfaceGeometry::new(Viewport::new(10.0, 20.0), ratio);
            assert_eq!(geometry.pixel_ratio, 1.0);
            assert_eq!((geometry.buffer_width, geometry.buffer_height), (10, 20));
        }
    }

    #[test]
    fn collapsed_viewport_is_not_drawable() {
        let mut surface = RecordingSurface::new();
        let geometry = resize(&mut surface, Viewport::new(0.0, 300.0), 1.0);
        assert!(!geometry.is_drawable());
        assert!(!surface.is_ready());

        let geometry = SurfaceGeometry::new(Viewport::new(-5.0, 300.0), 1.0);
        assert_eq!(geometry.buffer_width, 0);
    }

    #[test]
    fn recording_keeps_only_latest_frame() {
        let mut surface = RecordingSurface::new();
        surface.resize(4, 4);
        surface.draw(&DrawCommand::Clear);
        surface.draw(&DrawCommand::SetBlend(Blend::Additive));
        surface.draw(&DrawCommand::Clear);

        assert_eq!(surface.frames(), 2);
        assert_eq!(surface.commands(), &[DrawCommand::Clear]);
    }

    #[test]
    fn unavailable_surface_is_not_ready() {
        let mut surface = RecordingSurface::new();
        surface.resize(4, 4);
        surface.set_available(false);
        assert!(!surface.is_ready());
    }
}
