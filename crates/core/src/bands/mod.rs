use std::f32::consts::TAU;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{config::BandRanges, Result};

/// Selects how the spatial and temporal terms of a band's oscillation combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Waveform {
    /// Travelling wave: `sin(space + phase - time * speed)`.
    Sine,
    /// Standing pulse: `cos(space) * sin(phase - time * speed)`.
    CosineAmplitudeModulated,
}

/// Secondary, faster ripple layered on top of the primary oscillation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Harmonic {
    pub amplitude: f32,
    pub phase: f32,
    pub speed: f32,
}

/// One light band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub amplitude: f32,
    pub phase: f32,
    pub speed: f32,
    pub opacity: f32,
    pub width: f32,
    pub y_offset: f32,
    pub blur: f32,
    pub waveform: Waveform,
    pub harmonic: Harmonic,
}

/// Samples `count` bands from `rng`.
///
/// Amplitude and width use square-root shaping so most bands stay subtle
/// with a few tall outliers. Vertical offsets follow generation order and
/// are spread symmetrically around the centreline.
pub fn generate<R: Rng + ?Sized>(count: usize, ranges: &BandRanges, rng: &mut R) -> Vec<Band> {
    let mut bands = Vec::with_capacity(count);
    for i in 0..count {
        let t = i as f32 / count as f32;

        let amplitude = ranges.amplitude.at(rng.gen::<f32>().sqrt());
        let phase = rng.gen::<f32>() * TAU;
        let speed = ranges.speed.at(rng.gen());
        let opacity = ranges.opacity.at(rng.gen());
        let width = ranges.width.at(rng.gen::<f32>().sqrt());
        let blur = ranges.blur.at(rng.gen());
        let waveform = if rng.gen::<f32>() < ranges.sine_probability {
            Waveform::Sine
        } else {
            Waveform::CosineAmplitudeModulated
        };
        let harmonic = Harmonic {
            amplitude: ranges.harmonic_amplitude.at(rng.gen()),
            phase: rng.gen::<f32>() * TAU,
            speed: ranges.harmonic_speed.at(rng.gen()),
        };

        bands.push(Band {
            amplitude,
            phase,
            speed,
            opacity,
            width,
            y_offset: (t - 0.5) * ranges.spread,
            blur,
            waveform,
            harmonic,
        });
    }
    bands
}

/// Immutable generation of bands produced from a single seed. Shared by
/// reference count so a re-seed swaps the whole set in one step.
#[derive(Debug, Clone, Serialize)]
pub struct BandSet {
    seed: u64,
    generation: u64,
    bands: Vec<Band>,
}

impl BandSet {
    pub fn from_seed(seed: u64, count: usize, ranges: &BandRanges) -> Self {
        Self::with_generation(seed, 0, count, ranges)
    }

    pub(crate) fn with_generation(
        seed: u64,
        generation: u64,
        count: usize,
        ranges: &BandRanges,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self {
            seed,
            generation,
            bands: generate(count, ranges, &mut rng),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of re-seeds that happened before this set was created.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

/// Fresh seed from the thread-local generator.
pub fn random_seed() -> u64 {
    rand::random()
}

/// Pretty JSON dump of a band set, for inspection.
pub fn to_json_pretty(set: &BandSet) -> Result<String> {
    Ok(serde_json::to_string_pretty(set)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges() -> BandRanges {
        BandRanges::default()
    }

    #[test]
    fn same_seed_yields_identical_bands() {
        let a = BandSet::from_seed(42, 28, &ranges());
        let b = BandSet::from_seed(42, 28, &ranges());

        assert_eq!(a.bands(), b.bands());
        for (x, y) in a.bands().iter().zip(b.bands()) {
            assert_eq!(x.amplitude.to_bits(), y.amplitude.to_bits());
            assert_eq!(x.phase.to_bits(), y.phase.to_bits());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let a = BandSet::from_seed(1, 8, &ranges());
        let b = BandSet::from_seed(2, 8, &ranges());
        assert_ne!(a.bands(), b.bands());
    }

    #[test]
    fn generates_requested_count() {
        for seed in [0, 7, 99, u64::MAX] {
            assert_eq!(BandSet::from_seed(seed, 28, &ranges()).len(), 28);
        }
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(generate(1, &ranges(), &mut rng).len(), 1);
    }

    #[test]
    fn samples_stay_inside_their_ranges() {
        let r = ranges();
        let set = BandSet::from_seed(11, 64, &r);
        for band in set.bands() {
            assert!(band.amplitude >= r.amplitude.min);
            assert!(band.amplitude <= r.amplitude.min + r.amplitude.span);
            assert!((0.0..TAU).contains(&band.phase));
            assert!(band.speed > 0.0);
            assert!(band.opacity > 0.0 && band.opacity < 1.0);
            assert!(band.width > 0.0);
            assert!(band.blur >= 0.0);
            assert!(band.y_offset.abs() <= r.spread * 0.5);
        }
    }

    #[test]
    fn offsets_follow_generation_order() {
        let set = BandSet::from_seed(5, 10, &ranges());
        let offsets: Vec<f32> = set.bands().iter().map(|b| b.y_offset).collect();

        assert_eq!(offsets[0], -20.0);
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
        assert!((offsets[5]).abs() < 1e-6);
    }

    #[test]
    fn waveform_choice_respects_probability() {
        let mut all_sine = ranges();
        all_sine.sine_probability = 1.0;
        let set = BandSet::from_seed(9, 32, &all_sine);
        assert!(set.bands().iter().all(|b| b.waveform == Waveform::Sine));

        let mut none_sine = ranges();
        none_sine.sine_probability = 0.0;
        let set = BandSet::from_seed(9, 32, &none_sine);
        assert!(set
            .bands()
            .iter()
            .all(|b| b.waveform == Waveform::CosineAmplitudeModulated));
    }
}
