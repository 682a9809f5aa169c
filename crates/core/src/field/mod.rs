use std::f32::consts::PI;

use crate::{
    bands::{Band, Waveform},
    config::WaveParams,
};

/// Signed distance from the horizontal centre, `-1` at the left edge and
/// `1` at the right edge. `pct` runs over `[0, 1]` across the surface width.
pub fn center_distance(pct: f32) -> f32 {
    (pct - 0.5) * 2.0
}

/// `(1 - cd^2)^power`: 1 at the centre, exactly 0 at both edges.
pub fn envelope(pct: f32, power: f32) -> f32 {
    let cd = center_distance(pct);
    (1.0 - cd * cd).max(0.0).powf(power)
}

/// `cd^(2 * power)`: 0 at the centre, exactly 1 at both edges.
pub fn pinch(pct: f32, power: f32) -> f32 {
    let cd = center_distance(pct);
    (cd * cd).powf(power)
}

/// Primary oscillation of `band` at `pct`, weighted by the envelope.
///
/// Phase arguments are formed in `f64` so long-running clocks keep full
/// temporal resolution.
pub fn displacement(band: &Band, pct: f32, time: f64, wave: &WaveParams) -> f32 {
    let space = f64::from((pct - 0.5) * PI * wave.frequency);
    let temporal = f64::from(band.phase) - time * f64::from(band.speed);
    let osc = match band.waveform {
        Waveform::Sine => (space + temporal).sin(),
        Waveform::CosineAmplitudeModulated => space.cos() * temporal.sin(),
    } as f32
        * band.amplitude;

    osc * envelope(pct, wave.envelope_power)
}

/// Secondary ripple of `band`, sharing the primary envelope.
pub fn harmonic_displacement(band: &Band, pct: f32, time: f64, wave: &WaveParams) -> f32 {
    let h = &band.harmonic;
    let space = f64::from((pct - 0.5) * PI * wave.harmonic_frequency);
    let phase = space + f64::from(h.phase) - time * f64::from(h.speed);
    let osc = phase.sin() as f32 * h.amplitude;

    osc * envelope(pct, wave.envelope_power)
}

/// Full animated offset of a band: primary plus harmonic.
pub fn band_offset(band: &Band, pct: f32, time: f64, wave: &WaveParams) -> f32 {
    displacement(band, pct, time, wave) + harmonic_displacement(band, pct, time, wave)
}

/// Static vertical bias of a band after the pinch fades it out toward the
/// edges.
pub fn pinched_bias(band: &Band, pct: f32, wave: &WaveParams) -> f32 {
    band.y_offset * (1.0 - pinch(pct, wave.pinch_power))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::BandSet;
    use crate::config::BandRanges;

    fn sample_bands() -> BandSet {
        let mut ranges = BandRanges::default();
        ranges.sine_probability = 0.5;
        BandSet::from_seed(1234, 28, &ranges)
    }

    #[test]
    fn displacement_vanishes_at_edges() {
        let wave = WaveParams::default();
        let set = sample_bands();
        for band in set.bands() {
            for time in [0.0, 0.37, 5.0, 123.456, 10_000.0] {
                assert_eq!(displacement(band, 0.0, time, &wave), 0.0);
                assert_eq!(displacement(band, 1.0, time, &wave), 0.0);
                assert_eq!(band_offset(band, 0.0, time, &wave), 0.0);
                assert_eq!(band_offset(band, 1.0, time, &wave), 0.0);
            }
        }
    }

    #[test]
    fn pinch_collapses_bias_at_edges() {
        let wave = WaveParams::default();
        let set = sample_bands();
        for band in set.bands() {
            assert_eq!(pinched_bias(band, 0.0, &wave), 0.0);
            assert_eq!(pinched_bias(band, 1.0, &wave), 0.0);
            assert_eq!(pinched_bias(band, 0.5, &wave), band.y_offset);
        }
    }

    #[test]
    fn envelope_peaks_at_center() {
        assert_eq!(envelope(0.5, 4.0), 1.0);
        assert!(envelope(0.25, 4.0) < envelope(0.4, 4.0));
        assert_eq!(envelope(0.0, 4.0), 0.0);
        assert_eq!(envelope(1.0, 4.0), 0.0);
    }

    #[test]
    fn waveforms_differ_in_coupling() {
        let wave = WaveParams::default();
        let mut band = sample_bands().bands()[0];
        band.phase = 0.0;
        band.speed = 1.0;

        band.waveform = Waveform::CosineAmplitudeModulated;
        // The standing pulse passes through zero everywhere at once.
        for pct in [0.2, 0.5, 0.7] {
            assert!(displacement(&band, pct, 0.0, &wave).abs() < 1e-6);
        }

        band.waveform = Waveform::Sine;
        assert!(displacement(&band, 0.7, 0.0, &wave).abs() > 1e-3);
    }

    #[test]
    fn motion_survives_week_long_clocks() {
        let wave = WaveParams::default();
        let mut band = sample_bands().bands()[0];
        band.waveform = Waveform::Sine;
        band.amplitude = 10.0;
        band.speed = 0.3;

        let start = 6.0 * 86_400.0;
        let a = displacement(&band, 0.5, start, &wave);
        let b = displacement(&band, 0.5, start + 1.0 / 60.0, &wave);
        let expected = 10.0 * 0.3 / 60.0 * (f64::from(band.phase) - start * 0.3).cos() as f32;

        assert!(((a - b) - expected).abs() < 1e-3);
    }

    #[test]
    fn sine_band_at_center_follows_phase() {
        let wave = WaveParams::default();
        let mut band = sample_bands().bands()[0];
        band.waveform = Waveform::Sine;
        band.amplitude = 10.0;
        band.phase = PI / 2.0;
        band.speed = 1.0;

        let at_center = displacement(&band, 0.5, 0.0, &wave);
        assert!((at_center - 10.0).abs() < 1e-4);
    }
}
