use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::geometry::{Geometry, Vec2};

/// Smallest horizontal sample spacing in css pixels.
pub const MIN_WAVE_STEP: f64 = 0.5;

/// Sinusoidal band filled from the wave line down to the bottom edge.
///
/// Motion is frame-count based: `t` advances by one per rendered frame
/// regardless of wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WaveConfig {
    /// Amplitude in css pixels
    pub height: f64,
    /// Phase advance per frame
    pub speed: f64,
    /// Horizontal distance between samples, at least [`MIN_WAVE_STEP`]
    pub step: f64,
    /// Spatial frequency in radians per pixel
    pub frequency: f64,
    pub color: Rgba,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            height: 50.0,
            speed: 0.01,
            step: 10.0,
            frequency: 0.01,
            color: Rgba::new(74, 108, 247, 0.3),
        }
    }
}

impl WaveConfig {
    /// `sin(x * frequency + t * speed) * height + surface_height / 2`
    pub fn sample(&self, x: f64, t: u64, surface_height: f64) -> f64 {
        (x * self.frequency + t as f64 * self.speed).sin() * self.height + surface_height / 2.0
    }

    /// Closed outline of the band at frame `t`: the mid-line start, one
    /// sample per `step` across the width, then the two bottom corners.
    pub fn path(&self, geometry: &Geometry, t: u64) -> Vec<Vec2> {
        let step = self.step.max(MIN_WAVE_STEP);
        let mut points = vec![Vec2::new(0.0, geometry.height / 2.0)];
        let mut x = 0.0;
        while x < geometry.width {
            points.push(Vec2::new(x, self.sample(x, t, geometry.height)));
            x += step;
        }
        points.push(Vec2::new(geometry.width, geometry.height));
        points.push(Vec2::new(0.0, geometry.height));
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_sample_is_mid_height() {
        let wave = WaveConfig::default();
        assert_eq!(wave.sample(0.0, 0, 300.0), 150.0);
    }

    #[test]
    fn phase_advances_with_frames() {
        let wave = WaveConfig::default();
        let expected = (100.0_f64 * 0.01).sin() * 50.0 + 150.0;
        assert_eq!(wave.sample(0.0, 100, 300.0), expected);
    }

    #[test]
    fn path_layout() {
        let wave = WaveConfig::default();
        let g = Geometry::new(35.0, 100.0);
        let path = wave.path(&g, 0);
        // start + x = 0, 10, 20, 30 + two corners
        assert_eq!(path.len(), 7);
        assert_eq!(path[0], Vec2::new(0.0, 50.0));
        assert_eq!(path[4].x, 30.0);
        assert_eq!(path[5], Vec2::new(35.0, 100.0));
        assert_eq!(path[6], Vec2::new(0.0, 100.0));
        for p in &path[1..5] {
            assert!((p.y - 50.0).abs() <= 50.0);
        }
    }

    #[test]
    fn tiny_step_is_clamped() {
        let wave = WaveConfig {
            step: 1e-300,
            ..WaveConfig::default()
        };
        let path = wave.path(&Geometry::new(10.0, 100.0), 0);
        // x = 0, 0.5, .., 9.5 plus start and corners
        assert_eq!(path.len(), 23);
    }
}
