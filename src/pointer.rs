//! Pointer repulsion.
//!
//! The pointer is sampled from discrete move/leave events; no smoothing or
//! prediction is applied, each frame reads the latest sample.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// How a particle inside the influence radius reacts to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum PointerResponse {
    /// Add `strength * force` to the velocity. Every particle's velocity is
    /// multiplied by `damping` each frame, pointer or not; `1.0` turns it off
    Accelerate { strength: f64, damping: f64 },
    /// Push the position directly by `strength * force`
    Displace { strength: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerConfig {
    /// Radius of influence in css pixels
    pub radius: f64,
    pub response: PointerResponse,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            radius: 100.0,
            response: PointerResponse::Accelerate {
                strength: 0.2,
                damping: 0.99,
            },
        }
    }
}

/// Latest pointer sample in canvas-local coordinates, absent when the
/// pointer is outside the surface.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pointer {
    position: Option<Vec2>,
}

impl Pointer {
    pub fn position(&self) -> Option<Vec2> {
        self.position
    }

    pub fn moved(&mut self, local: Vec2) {
        self.position = Some(local);
    }

    pub fn left(&mut self) {
        self.position = None;
    }
}

/// Screen-space client coordinates to canvas-local coordinates given the
/// canvas bounding rectangle origin.
pub fn to_local(client: Vec2, rect_origin: Vec2) -> Vec2 {
    client - rect_origin
}

/// Repulsive force on a particle at `particle` from a pointer at `pointer`.
///
/// Points away from the pointer with magnitude `(radius - d) / radius`;
/// `None` at or beyond the radius. At zero distance the direction
/// degenerates to `+x` at full magnitude.
pub fn repulsion(particle: Vec2, pointer: Vec2, radius: f64) -> Option<Vec2> {
    let delta = particle - pointer;
    let distance = delta.length();
    if distance >= radius {
        return None;
    }
    let angle = delta.y.atan2(delta.x);
    let force = (radius - distance) / radius;
    Some(Vec2::new(angle.cos() * force, angle.sin() * force))
}
