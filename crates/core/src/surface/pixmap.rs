use std::path::Path;

use tiny_skia::{
    BlendMode, Color, FillRule, LineCap, LineJoin, LinearGradient, Paint, PathBuilder, Pixmap,
    RadialGradient, Rect, Shader, SpreadMode, Stroke, Transform,
};

use super::{Blend, DrawCommand, Glow, Gradient, GradientStop, Point, Surface};
use crate::{BeamError, Result};

/// Number of widening strokes used to approximate a blurred halo.
const GLOW_STEPS: u32 = 3;

/// Software raster surface.
///
/// The backing pixmap is absent until the first non-empty resize, or when
/// the requested buffer cannot be allocated; draws are ignored meanwhile.
#[derive(Debug, Default)]
pub struct PixmapSurface {
    pixmap: Option<Pixmap>,
    blend: Blend,
}

impl PixmapSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pixmap(&self) -> Option<&Pixmap> {
        self.pixmap.as_ref()
    }

    /// Number of pixels with non-zero alpha.
    pub fn lit_pixels(&self) -> usize {
        self.pixmap
            .as_ref()
            .map(|p| p.pixels().iter().filter(|px| px.alpha() > 0).count())
            .unwrap_or(0)
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let pixmap = self.require_pixmap()?;
        pixmap
            .encode_png()
            .map_err(|err| BeamError::Encode(err.to_string()))
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let pixmap = self.require_pixmap()?;
        pixmap
            .save_png(path)
            .map_err(|err| BeamError::Encode(err.to_string()))
    }

    fn require_pixmap(&self) -> Result<&Pixmap> {
        self.pixmap
            .as_ref()
            .ok_or_else(|| BeamError::Surface("no backing pixmap allocated".to_string()))
    }

    fn paint<'a>(&self, shader: Shader<'a>) -> Paint<'a> {
        let mut paint = Paint::default();
        paint.shader = shader;
        paint.anti_alias = true;
        paint.blend_mode = match self.blend {
            Blend::Normal => BlendMode::SourceOver,
            Blend::Additive => BlendMode::Plus,
        };
        paint
    }

    fn fill_ellipse(&mut self, center: Point, rx: f32, ry: f32, stops: &[GradientStop]) {
        if !(rx > 0.0 && ry > 0.0) {
            return;
        }
        // Circle of radius `ry` stretched horizontally by `rx / ry`.
        let Some(shader) = RadialGradient::new(
            skia_point(Point::new(0.0, 0.0)),
            skia_point(Point::new(0.0, 0.0)),
            ry,
            skia_stops(stops),
            SpreadMode::Pad,
            Transform::identity(),
        ) else {
            return;
        };
        let Some(path) = PathBuilder::from_circle(0.0, 0.0, ry) else {
            return;
        };
        let transform = Transform::from_row(rx / ry, 0.0, 0.0, 1.0, center.x, center.y);
        let paint = self.paint(shader);
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, gradient: &Gradient) {
        let rect = Rect::from_xywh(x, y, width, height);
        let (Some(rect), Some(shader)) = (rect, to_shader(gradient)) else {
            return;
        };
        let paint = self.paint(shader);
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }

    fn stroke_polyline(
        &mut self,
        points: &[Point],
        width: f32,
        gradient: &Gradient,
        glow: Option<&Glow>,
    ) {
        if width <= 0.0 {
            return;
        }
        let Some(path) = polyline(points) else {
            return;
        };

        if let Some(glow) = glow.filter(|g| g.radius > 0.0) {
            let halo = tint(gradient, glow);
            for step in (1..=GLOW_STEPS).rev() {
                let spread = glow.radius * step as f32 / GLOW_STEPS as f32;
                if let Some(shader) = to_shader(&halo) {
                    let paint = self.paint(shader);
                    let stroke = round_stroke(width + spread * 2.0);
                    if let Some(pixmap) = self.pixmap.as_mut() {
                        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
                    }
                }
            }
        }

        let Some(shader) = to_shader(gradient) else {
            return;
        };
        let paint = self.paint(shader);
        let stroke = round_stroke(width);
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }
}

impl Surface for PixmapSurface {
    fn resize(&mut self, width: u32, height: u32) {
        self.pixmap = Pixmap::new(width, height);
        if self.pixmap.is_none() && width > 0 && height > 0 {
            tracing::warn!(width, height, "could not allocate pixmap");
        }
    }

    fn size(&self) -> (u32, u32) {
        self.pixmap
            .as_ref()
            .map(|p| (p.width(), p.height()))
            .unwrap_or((0, 0))
    }

    fn is_ready(&self) -> bool {
        self.pixmap.is_some()
    }

    fn draw(&mut self, command: &DrawCommand) {
        match command {
            DrawCommand::Clear => {
                if let Some(pixmap) = self.pixmap.as_mut() {
                    pixmap.fill(Color::TRANSPARENT);
                }
            }
            DrawCommand::SetBlend(blend) => self.blend = *blend,
            DrawCommand::FillEllipse {
                center,
                radius_x,
                radius_y,
                stops,
            } => self.fill_ellipse(*center, *radius_x, *radius_y, stops),
            DrawCommand::FillRect {
                x,
                y,
                width,
                height,
                gradient,
            } => self.fill_rect(*x, *y, *width, *height, gradient),
            DrawCommand::StrokePolyline {
                points,
                width,
                gradient,
                glow,
            } => self.stroke_polyline(points, *width, gradient, glow.as_ref()),
        }
    }
}

fn skia_point(point: Point) -> tiny_skia::Point {
    tiny_skia::Point::from_xy(point.x, point.y)
}

fn skia_stops(stops: &[GradientStop]) -> Vec<tiny_skia::GradientStop> {
    stops
        .iter()
        .map(|stop| {
            let c = stop.color;
            let color = Color::from_rgba(
                c.r.clamp(0.0, 1.0),
                c.g.clamp(0.0, 1.0),
                c.b.clamp(0.0, 1.0),
                c.a.clamp(0.0, 1.0),
            )
            .unwrap_or(Color::TRANSPARENT);
            tiny_skia::GradientStop::new(stop.offset.clamp(0.0, 1.0), color)
        })
        .collect()
}

fn to_shader(gradient: &Gradient) -> Option<Shader<'static>> {
    match gradient {
        Gradient::Linear { start, end, stops } => LinearGradient::new(
            skia_point(*start),
            skia_point(*end),
            skia_stops(stops),
            SpreadMode::Pad,
            Transform::identity(),
        ),
        Gradient::Radial {
            center,
            radius,
            stops,
        } => {
            if *radius <= 0.0 {
                return None;
            }
            RadialGradient::new(
                skia_point(*center),
                skia_point(*center),
                *radius,
                skia_stops(stops),
                SpreadMode::Pad,
                Transform::identity(),
            )
        }
    }
}

/// Same gradient geometry, recoloured with the glow colour and split across
/// the halo strokes.
fn tint(gradient: &Gradient, glow: &Glow) -> Gradient {
    let recolor = |stops: &[GradientStop]| -> Vec<GradientStop> {
        stops
            .iter()
            .map(|stop| GradientStop {
                offset: stop.offset,
                color: super::Rgba {
                    a: stop.color.a * glow.color.a / GLOW_STEPS as f32,
                    ..glow.color
                },
            })
            .collect()
    };
    match gradient {
        Gradient::Linear { start, end, stops } => Gradient::Linear {
            start: *start,
            end: *end,
            stops: recolor(stops),
        },
        Gradient::Radial {
            center,
            radius,
            stops,
        } => Gradient::Radial {
            center: *center,
            radius: *radius,
            stops: recolor(stops),
        },
    }
}

fn polyline(points: &[Point]) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut builder = PathBuilder::new();
    builder.move_to(first.x, first.y);
    for point in rest {
        builder.line_to(point.x, point.y);
    }
    builder.finish()
}

fn round_stroke(width: f32) -> Stroke {
    Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    }
}
