use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::color::Rgba;
use crate::geometry::{Geometry, Vec2};

/// What happens when a particle crosses the surface boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgePolicy {
    /// Clamp to the edge and point the velocity component back inward
    #[default]
    Bounce,
    /// Re-enter at the opposite edge
    Wrap,
}

/// Sampling ranges used when a particle is created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRanges {
    pub min_size: f64,
    pub max_size: f64,
    pub min_opacity: f64,
    pub max_opacity: f64,
    /// Each velocity component is uniform in `[-speed, speed)`
    pub speed: f64,
}

/// A single animated point sprite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    /// Pixels per frame
    pub velocity: Vec2,
    pub radius: f64,
    pub opacity: f64,
    pub color: Rgba,
}

impl Particle {
    /// Uniformly random position over the surface, signed random velocity,
    /// size and opacity drawn from `ranges`.
    pub fn spawn<R: Rng>(
        rng: &mut R,
        geometry: &Geometry,
        ranges: &SpawnRanges,
        color: Rgba,
    ) -> Self {
        let mut lerp = |lo: f64, hi: f64| lo + rng.gen::<f64>() * (hi - lo);

        let position = Vec2::new(lerp(0.0, geometry.width), lerp(0.0, geometry.height));
        let velocity = Vec2::new(
            lerp(-ranges.speed, ranges.speed),
            lerp(-ranges.speed, ranges.speed),
        );
        let radius = lerp(ranges.min_size, ranges.max_size);
        let opacity = lerp(ranges.min_opacity, ranges.max_opacity);

        Self {
            position,
            velocity,
            radius,
            opacity,
            color,
        }
    }

    pub fn advance(&mut self) {
        self.position += self.velocity;
    }

    /// Bring the particle back inside `geometry` according to `policy`.
    pub fn apply_edge(&mut self, policy: EdgePolicy, geometry: &Geometry) {
        let (x, vx) = edge_axis(self.position.x, self.velocity.x, geometry.width, policy);
        let (y, vy) = edge_axis(self.position.y, self.velocity.y, geometry.height, policy);
        self.position = Vec2::new(x, y);
        self.velocity = Vec2::new(vx, vy);
    }
}

fn edge_axis(pos: f64, vel: f64, extent: f64, policy: EdgePolicy) -> (f64, f64) {
    match policy {
        EdgePolicy::Bounce => {
            if pos < 0.0 {
                (0.0, vel.abs())
            } else if pos > extent {
                (extent, -vel.abs())
            } else {
                (pos, vel)
            }
        }
        EdgePolicy::Wrap => {
            if pos > extent {
                (0.0, vel)
            } else if pos < 0.0 {
                (extent, vel)
            } else {
                (pos, vel)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn particle(x: f64, y: f64, vx: f64, vy: f64) -> Particle {
        Particle {
            position: Vec2::new(x, y),
            velocity: Vec2::new(vx, vy),
            radius: 1.0,
            opacity: 1.0,
            color: Rgba::opaque(0, 0, 0),
        }
    }

    #[test]
    fn spawn_respects_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let geometry = Geometry::new(200.0, 100.0);
        let ranges = SpawnRanges {
            min_size: 1.0,
            max_size: 3.0,
            min_opacity: 0.5,
            max_opacity: 1.0,
            speed: 2.0,
        };
        for _ in 0..500 {
            let p = Particle::spawn(&mut rng, &geometry, &ranges, Rgba::opaque(1, 2, 3));
            assert!(geometry.contains(p.position));
            assert!((-2.0..2.0).contains(&p.velocity.x));
            assert!((-2.0..2.0).contains(&p.velocity.y));
            assert!((1.0..3.0).contains(&p.radius));
            assert!((0.5..1.0).contains(&p.opacity));
        }
    }

    #[test]
    fn bounce_clamps_and_turns_inward() {
        let g = Geometry::new(100.0, 50.0);
        let mut p = particle(99.5, 1.0, 1.0, -2.0);
        p.advance();
        p.apply_edge(EdgePolicy::Bounce, &g);
        assert_eq!(p.position, Vec2::new(100.0, 0.0));
        assert_eq!(p.velocity, Vec2::new(-1.0, 2.0));
    }

    #[test]
    fn bounce_never_flips_an_inward_velocity_outward() {
        let g = Geometry::new(100.0, 50.0);
        // already outside but moving back in
        let mut p = particle(-1.0, 10.0, 0.5, 0.0);
        p.apply_edge(EdgePolicy::Bounce, &g);
        assert_eq!(p.position.x, 0.0);
        assert_eq!(p.velocity.x, 0.5);
    }

    #[test]
    fn wrap_reenters_opposite_edge() {
        let g = Geometry::new(100.0, 50.0);
        let mut p = particle(99.5, 0.5, 1.0, -1.0);
        p.advance();
        p.apply_edge(EdgePolicy::Wrap, &g);
        assert_eq!(p.position, Vec2::new(0.0, 50.0));
        assert_eq!(p.velocity, Vec2::new(1.0, -1.0));
    }
}
