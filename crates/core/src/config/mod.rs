use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{surface::Rgba, Result};

/// Top-level configuration structure for one beam instance.
///
/// Every field has a default, so partial JSON documents only need to name
/// the knobs they change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamConfig {
    pub band_count: usize,
    /// Seed for band generation. `None` draws a seed from the OS.
    pub seed: Option<u64>,
    pub bands: BandRanges,
    pub wave: WaveParams,
    pub compositor: CompositorParams,
    pub palette: Palette,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            band_count: 28,
            seed: None,
            bands: BandRanges::default(),
            wave: WaveParams::default(),
            compositor: CompositorParams::default(),
            palette: Palette::default(),
        }
    }
}

impl BeamConfig {
    /// Default look with a fixed seed, handy for reproducible renders.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Uniform sampling interval `[min, min + span)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f32,
    pub span: f32,
}

impl Range {
    pub const fn new(min: f32, span: f32) -> Self {
        Self { min, span }
    }

    /// Maps a unit sample in `[0, 1)` onto the interval.
    pub fn at(&self, unit: f32) -> f32 {
        self.min + unit * self.span
    }
}

/// Sampling ranges used by the band generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BandRanges {
    pub amplitude: Range,
    pub speed: Range,
    pub opacity: Range,
    pub width: Range,
    pub blur: Range,
    /// Total vertical distance the bands are fanned across at the centre.
    pub spread: f32,
    /// Chance that a band uses the travelling sine waveform.
    pub sine_probability: f32,
    pub harmonic_amplitude: Range,
    pub harmonic_speed: Range,
}

impl Default for BandRanges {
    fn default() -> Self {
        Self {
            amplitude: Range::new(20.0, 100.0),
            speed: Range::new(0.15, 0.3),
            opacity: Range::new(0.06, 0.12),
            width: Range::new(3.0, 8.0),
            blur: Range::new(4.0, 16.0),
            spread: 40.0,
            sine_probability: 0.75,
            harmonic_amplitude: Range::new(10.0, 40.0),
            harmonic_speed: Range::new(0.08, 0.2),
        }
    }
}

/// Shape of the wave field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveParams {
    pub envelope_power: f32,
    pub pinch_power: f32,
    /// Half-periods of the primary oscillation across the full width.
    pub frequency: f32,
    pub harmonic_frequency: f32,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            envelope_power: 4.0,
            pinch_power: 0.8,
            frequency: 2.5,
            harmonic_frequency: 4.0,
        }
    }
}

/// Radius that grows linearly with the glow layer index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerRadius {
    pub base: f32,
    pub step: f32,
}

impl LayerRadius {
    pub fn at(&self, layer: u32) -> f32 {
        self.base + layer as f32 * self.step
    }
}

/// Effect-strength knobs of the layered compositor. Sizes are in logical
/// pixels and get scaled by the pixel ratio at paint time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorParams {
    pub segments: usize,
    pub breathe_speed: f32,
    pub breathe_amount: f32,

    pub glow_layers: u32,
    pub glow_radius_x: LayerRadius,
    pub glow_radius_y: LayerRadius,
    pub glow_alpha: f32,
    pub glow_flicker: f32,

    pub wash_half_height: f32,
    pub wash_alpha: f32,
    pub wash_alpha_swing: f32,

    pub volume_width: f32,
    pub volume_alpha: f32,
    pub volume_shimmer: f32,
    pub definition_width: f32,
    pub definition_shimmer: f32,
    pub glow_color: Rgba,

    pub core_radius: f32,
    pub core_secondary_radius: f32,
    pub core_breathe_speed: f32,
    pub core_breathe_amount: f32,

    pub flare_alpha: f32,
    pub flare_alpha_swing: f32,
    pub flare_height: f32,
    pub flare_soft_height: f32,
    pub flare_soft_ratio: f32,
}

impl Default for CompositorParams {
    fn default() -> Self {
        Self {
            segments: 80,
            breathe_speed: 0.3,
            breathe_amount: 0.06,
            glow_layers: 6,
            glow_radius_x: LayerRadius {
                base: 160.0,
                step: 100.0,
            },
            glow_radius_y: LayerRadius {
                base: 50.0,
                step: 40.0,
            },
            glow_alpha: 0.06,
            glow_flicker: 0.3,
            wash_half_height: 160.0,
            wash_alpha: 0.04,
            wash_alpha_swing: 0.012,
            volume_width: 1.6,
            volume_alpha: 0.7,
            volume_shimmer: 0.2,
            definition_width: 0.6,
            definition_shimmer: 0.25,
            glow_color: Rgba::from_rgb8(167, 139, 250, 0.4),
            core_radius: 80.0,
            core_secondary_radius: 140.0,
            core_breathe_speed: 0.35,
            core_breathe_amount: 0.2,
            flare_alpha: 0.06,
            flare_alpha_swing: 0.02,
            flare_height: 4.0,
            flare_soft_height: 20.0,
            flare_soft_ratio: 0.35,
        }
    }
}

/// One gradient stop. `weight` multiplies the live alpha of the layer the
/// stop belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub offset: f32,
    pub color: [u8; 3],
    pub weight: f32,
}

impl ColorStop {
    pub const fn new(offset: f32, color: [u8; 3], weight: f32) -> Self {
        Self {
            offset,
            color,
            weight,
        }
    }

    /// Resolves the stop against the layer alpha.
    pub fn resolve(&self, layer_alpha: f32) -> (f32, Rgba) {
        let [r, g, b] = self.color;
        (self.offset, Rgba::from_rgb8(r, g, b, layer_alpha * self.weight))
    }
}

const VIOLET: [u8; 3] = [167, 139, 250];
const PURPLE: [u8; 3] = [139, 92, 246];
const DEEP: [u8; 3] = [109, 40, 217];
const WHITE: [u8; 3] = [255, 255, 255];

/// Ordered colour stops for each kind of layer the compositor paints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub glow: Vec<ColorStop>,
    pub wash: Vec<ColorStop>,
    pub volume: Vec<ColorStop>,
    pub definition: Vec<ColorStop>,
    /// Core stops carry absolute alphas; the layer alpha is 1.
    pub core: Vec<ColorStop>,
    pub core_secondary: Vec<ColorStop>,
    pub flare: Vec<ColorStop>,
    pub flare_soft: Vec<ColorStop>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            glow: vec![
                ColorStop::new(0.0, VIOLET, 1.2),
                ColorStop::new(0.3, PURPLE, 0.6),
                ColorStop::new(0.6, DEEP, 0.2),
                ColorStop::new(1.0, DEEP, 0.0),
            ],
            wash: vec![
                ColorStop::new(0.0, VIOLET, 0.0),
                ColorStop::new(0.25, PURPLE, 0.3),
                ColorStop::new(0.5, VIOLET, 1.0),
                ColorStop::new(0.75, PURPLE, 0.3),
                ColorStop::new(1.0, VIOLET, 0.0),
            ],
            volume: vec![
                ColorStop::new(0.0, VIOLET, 0.0),
                ColorStop::new(0.08, VIOLET, 0.1),
                ColorStop::new(0.25, [180, 160, 255], 0.5),
                ColorStop::new(0.45, [210, 195, 255], 0.85),
                ColorStop::new(0.5, [235, 225, 255], 1.0),
                ColorStop::new(0.55, [210, 195, 255], 0.85),
                ColorStop::new(0.75, [180, 160, 255], 0.5),
                ColorStop::new(0.92, VIOLET, 0.1),
                ColorStop::new(1.0, VIOLET, 0.0),
            ],
            definition: vec![
                ColorStop::new(0.0, VIOLET, 0.0),
                ColorStop::new(0.06, VIOLET, 0.12),
                ColorStop::new(0.2, [185, 165, 255], 0.5),
                ColorStop::new(0.4, [210, 195, 255], 0.85),
                ColorStop::new(0.5, [240, 230, 255], 1.0),
                ColorStop::new(0.6, [210, 195, 255], 0.85),
                ColorStop::new(0.8, [185, 165, 255], 0.5),
                ColorStop::new(0.94, VIOLET, 0.12),
                ColorStop::new(1.0, VIOLET, 0.0),
            ],
            core: vec![
                ColorStop::new(0.0, WHITE, 0.22),
                ColorStop::new(0.1, [230, 220, 255], 0.14),
                ColorStop::new(0.3, [190, 170, 255], 0.06),
                ColorStop::new(0.6, VIOLET, 0.02),
                ColorStop::new(1.0, VIOLET, 0.0),
            ],
            core_secondary: vec![
                ColorStop::new(0.0, [200, 180, 255], 0.06),
                ColorStop::new(0.3, VIOLET, 0.03),
                ColorStop::new(1.0, VIOLET, 0.0),
            ],
            flare: vec![
                ColorStop::new(0.0, VIOLET, 0.0),
                ColorStop::new(0.12, VIOLET, 0.15),
                ColorStop::new(0.35, [200, 180, 255], 0.5),
                ColorStop::new(0.5, WHITE, 1.0),
                ColorStop::new(0.65, [200, 180, 255], 0.5),
                ColorStop::new(0.88, VIOLET, 0.15),
                ColorStop::new(1.0, VIOLET, 0.0),
            ],
            flare_soft: vec![
                ColorStop::new(0.0, VIOLET, 0.0),
                ColorStop::new(0.15, VIOLET, 0.2),
                ColorStop::new(0.5, [192, 168, 255], 1.0),
                ColorStop::new(0.85, VIOLET, 0.2),
                ColorStop::new(1.0, VIOLET, 0.0),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_fall_back_to_defaults() {
        let config =
            BeamConfig::from_json_str(r#"{ "band_count": 4, "wave": { "pinch_power": 1.5 } }"#)
                .unwrap();

        assert_eq!(config.band_count, 4);
        assert_eq!(config.wave.pinch_power, 1.5);
        assert_eq!(config.wave.envelope_power, 4.0);
        assert_eq!(config.compositor.segments, 80);
        assert_eq!(config.palette.volume.len(), 9);
        assert!(config.seed.is_none());
    }

    #[test]
    fn round_trips_through_json() {
        let config = BeamConfig::seeded(7);
        let json = config.to_json_pretty().unwrap();
        let parsed = BeamConfig::from_json_str(&json).unwrap();

        assert_eq!(parsed.seed, Some(7));
        assert_eq!(parsed.bands.amplitude, config.bands.amplitude);
        assert_eq!(parsed.palette.core, config.palette.core);
    }

    #[test]
    fn rejects_malformed_documents() {
        let err = BeamConfig::from_json_str("{ band_count: }").unwrap_err();
        assert!(format!("{err}").contains("invalid configuration"));
    }

    #[test]
    fn beam_gradients_are_symmetric() {
        let palette = Palette::default();
        for stops in [&palette.volume, &palette.definition] {
            let n = stops.len();
            for i in 0..n / 2 {
                let (a, b) = (stops[i], stops[n - 1 - i]);
                assert!((a.offset - (1.0 - b.offset)).abs() < 1e-6);
                assert_eq!(a.weight, b.weight);
            }
            assert_eq!(stops[0].weight, 0.0);
            assert_eq!(stops[n / 2].weight, 1.0);
        }
    }
}
