use crate::{
    bands::{Band, BandSet},
    config::{BeamConfig, ColorStop, CompositorParams, Palette, WaveParams},
    field,
    surface::{Blend, DrawCommand, Glow, Gradient, GradientStop, Point, Surface, SurfaceGeometry},
};

const GLOW_FLICKER_SPEED: f32 = 0.4;
const WASH_SPEED: f32 = 0.25;
const SHIMMER_SPEED: f32 = 0.5;
const FLARE_SPEED: f32 = 0.4;

/// Paints beam frames from a band set, a time and a surface geometry.
#[derive(Debug, Clone)]
pub struct Compositor {
    params: CompositorParams,
    wave: WaveParams,
    palette: Palette,
}

impl Compositor {
    pub fn new(params: CompositorParams, wave: WaveParams, palette: Palette) -> Self {
        Self {
            params,
            wave,
            palette,
        }
    }

    pub fn from_config(config: &BeamConfig) -> Self {
        Self::new(
            config.compositor.clone(),
            config.wave.clone(),
            config.palette.clone(),
        )
    }

    /// Global pulse applied to sizes and displacements.
    pub fn breathe(&self, time: f64) -> f32 {
        1.0 + oscillate(time, self.params.breathe_speed, 0.0) * self.params.breathe_amount
    }

    /// Pulse applied to the two core glows.
    pub fn core_breath(&self, time: f64) -> f32 {
        1.0 + oscillate(time, self.params.core_breathe_speed, 0.0) * self.params.core_breathe_amount
    }

    /// Paints one frame and returns the number of commands issued.
    pub fn render_frame<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        bands: &BandSet,
        time: f64,
        geometry: &SurfaceGeometry,
    ) -> usize {
        let mut frame = Frame {
            surface,
            issued: 0,
        };

        frame.draw(DrawCommand::Clear);
        if !geometry.is_drawable() {
            return frame.issued;
        }

        let breathe = self.breathe(time);
        self.draw_glow(&mut frame, time, breathe, geometry);
        self.draw_wash(&mut frame, time, geometry);

        frame.draw(DrawCommand::SetBlend(Blend::Additive));
        for band in bands.bands() {
            self.draw_volume(&mut frame, band, time, breathe, geometry);
        }
        for band in bands.bands() {
            self.draw_definition(&mut frame, band, time, breathe, geometry);
        }
        self.draw_cores(&mut frame, time, geometry);
        self.draw_flares(&mut frame, time, geometry);
        frame.draw(DrawCommand::SetBlend(Blend::Normal));

        frame.issued
    }

    /// Centre-line polyline of `band` at `time`, in buffer pixels.
    pub fn band_polyline(
        &self,
        band: &Band,
        time: f64,
        breathe: f32,
        geometry: &SurfaceGeometry,
    ) -> Vec<Point> {
        let segments = self.params.segments.max(1);
        let width = geometry.buffer_width as f32;
        let center_y = geometry.center().y;
        let scale = geometry.pixel_ratio;

        (0..=segments)
            .map(|s| {
                let pct = s as f32 / segments as f32;
                let bias = field::pinched_bias(band, pct, &self.wave);
                let offset = field::band_offset(band, pct, time, &self.wave) * breathe;
                Point::new(pct * width, center_y + (bias + offset) * scale)
            })
            .collect()
    }

    fn draw_glow<S: Surface + ?Sized>(
        &self,
        frame: &mut Frame<'_, S>,
        time: f64,
        breathe: f32,
        geometry: &SurfaceGeometry,
    ) {
        let p = &self.params;
        let scale = geometry.pixel_ratio;
        for layer in (1..=p.glow_layers).rev() {
            let radius_x = p.glow_radius_x.at(layer) * breathe * scale;
            let radius_y = p.glow_radius_y.at(layer) * breathe * scale;
            if radius_x <= 0.0 || radius_y <= 0.0 {
                continue;
            }
            let flicker = 1.0 + oscillate(time, GLOW_FLICKER_SPEED, layer as f32) * p.glow_flicker;
            let alpha = p.glow_alpha / layer as f32 * flicker;

            frame.draw(DrawCommand::FillEllipse {
                center: geometry.center(),
                radius_x,
                radius_y,
                stops: resolve(&self.palette.glow, alpha),
            });
        }
    }

    fn draw_wash<S: Surface + ?Sized>(
        &self,
        frame: &mut Frame<'_, S>,
        time: f64,
        geometry: &SurfaceGeometry,
    ) {
        let p = &self.params;
        let half = p.wash_half_height * geometry.pixel_ratio;
        if half <= 0.0 {
            return;
        }
        let center_y = geometry.center().y;
        let alpha = p.wash_alpha + oscillate(time, WASH_SPEED, 0.0) * p.wash_alpha_swing;

        frame.draw(DrawCommand::FillRect {
            x: 0.0,
            y: center_y - half,
            width: geometry.buffer_width as f32,
            height: half * 2.0,
            gradient: Gradient::Linear {
                start: Point::new(0.0, center_y - half),
                end: Point::new(0.0, center_y + half),
                stops: resolve(&self.palette.wash, alpha),
            },
        });
    }

    fn draw_volume<S: Surface + ?Sized>(
        &self,
        frame: &mut Frame<'_, S>,
        band: &Band,
        time: f64,
        breathe: f32,
        geometry: &SurfaceGeometry,
    ) {
        let p = &self.params;
        let width = band.width * geometry.pixel_ratio * p.volume_width;
        if width <= 0.0 {
            return;
        }
        let shimmer = 1.0 + oscillate(time, SHIMMER_SPEED, band.phase) * p.volume_shimmer;
        let alpha = band.opacity * p.volume_alpha * shimmer;

        frame.draw(DrawCommand::StrokePolyline {
            points: self.band_polyline(band, time, breathe, geometry),
            width,
            gradient: horizontal(geometry, resolve(&self.palette.volume, alpha)),
            glow: Some(Glow {
                radius: band.blur * geometry.pixel_ratio,
                color: p.glow_color,
            }),
        });
    }

    fn draw_definition<S: Surface + ?Sized>(
        &self,
        frame: &mut Frame<'_, S>,
        band: &Band,
        time: f64,
        breathe: f32,
        geometry: &SurfaceGeometry,
    ) {
        let p = &self.params;
        let width = band.width * geometry.pixel_ratio * p.definition_width;
        if width <= 0.0 {
            return;
        }
        let shimmer = 1.0 + oscillate(time, SHIMMER_SPEED, band.phase) * p.definition_shimmer;
        let alpha = band.opacity * shimmer;

        frame.draw(DrawCommand::StrokePolyline {
            points: self.band_polyline(band, time, breathe, geometry),
            width,
            gradient: horizontal(geometry, resolve(&self.palette.definition, alpha)),
            glow: None,
        });
    }

    fn draw_cores<S: Surface + ?Sized>(
        &self,
        frame: &mut Frame<'_, S>,
        time: f64,
        geometry: &SurfaceGeometry,
    ) {
        let breath = self.core_breath(time);
        let scale = geometry.pixel_ratio;
        let layers = [
            (self.params.core_radius, &self.palette.core),
            (self.params.core_secondary_radius, &self.palette.core_secondary),
        ];

        for (radius, stops) in layers {
            let radius = radius * breath * scale;
            if radius <= 0.0 {
                continue;
            }
            let center = geometry.center();
            frame.draw(DrawCommand::FillRect {
                x: center.x - radius,
                y: center.y - radius,
                width: radius * 2.0,
                height: radius * 2.0,
                gradient: Gradient::Radial {
                    center,
                    radius,
                    stops: resolve(stops, 1.0),
                },
            });
        }
    }

    fn draw_flares<S: Surface + ?Sized>(
        &self,
        frame: &mut Frame<'_, S>,
        time: f64,
        geometry: &SurfaceGeometry,
    ) {
        let p = &self.params;
        let alpha = p.flare_alpha + oscillate(time, FLARE_SPEED, 0.0) * p.flare_alpha_swing;
        let bars = [
            (p.flare_height, alpha, &self.palette.flare),
            (
                p.flare_soft_height,
                alpha * p.flare_soft_ratio,
                &self.palette.flare_soft,
            ),
        ];

        let center_y = geometry.center().y;
        for (height, alpha, stops) in bars {
            let height = height * geometry.pixel_ratio;
            if height <= 0.0 {
                continue;
            }
            frame.draw(DrawCommand::FillRect {
                x: 0.0,
                y: center_y - height * 0.5,
                width: geometry.buffer_width as f32,
                height,
                gradient: horizontal(geometry, resolve(stops, alpha)),
            });
        }
    }
}

/// Counts commands on their way to the surface.
struct Frame<'a, S: ?Sized> {
    surface: &'a mut S,
    issued: usize,
}

impl<S: Surface + ?Sized> Frame<'_, S> {
    fn draw(&mut self, command: DrawCommand) {
        self.surface.draw(&command);
        self.issued += 1;
    }
}

/// `sin(time * speed + offset)`, with the phase formed in `f64`.
fn oscillate(time: f64, speed: f32, offset: f32) -> f32 {
    (time * f64::from(speed) + f64::from(offset)).sin() as f32
}

fn resolve(stops: &[ColorStop], alpha: f32) -> Vec<GradientStop> {
    stops
        .iter()
        .map(|stop| {
            let (offset, color) = stop.resolve(alpha);
            GradientStop { offset, color }
        })
        .collect()
}

/// Left-to-right gradient across the full width at the centreline.
fn horizontal(geometry: &SurfaceGeometry, stops: Vec<GradientStop>) -> Gradient {
    let center_y = geometry.center().y;
    Gradient::Linear {
        start: Point::new(0.0, center_y),
        end: Point::new(geometry.buffer_width as f32, center_y),
        stops,
    }
}
