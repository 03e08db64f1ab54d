use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color::Rgba;
use crate::connections::{ConnectionSearch, ConnectionStyle};
use crate::error::{FieldError, Result};
use crate::particle::{EdgePolicy, SpawnRanges};
use crate::pointer::{PointerConfig, PointerResponse};
use crate::theme::{Palette, ThemePalettes};
use crate::wave::{WaveConfig, MIN_WAVE_STEP};

/// Where the field draws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SurfaceTarget {
    /// An existing canvas element, sized from its parent element
    CanvasId { id: String },
    /// A container element; a canvas is created inside it and sized from it
    Container { selector: String },
}

impl SurfaceTarget {
    pub fn describe(&self) -> &str {
        match self {
            SurfaceTarget::CanvasId { id } => id,
            SurfaceTarget::Container { selector } => selector,
        }
    }
}

/// Per-breakpoint overrides. Applies when the viewport is at most
/// `max_width` wide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    pub max_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub particle_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_distance: Option<f64>,
}

/// Reduction of the configured values on narrow viewports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum Responsive {
    Off,
    /// For each property, the smallest matching breakpoint that overrides it wins
    Breakpoints { breakpoints: Vec<Breakpoint> },
    /// Cap the particle count at one particle per `pixels_per_particle` of
    /// surface width
    #[serde(rename_all = "camelCase")]
    WidthRatio { pixels_per_particle: f64 },
}

/// Values in effect for a given viewport and surface width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    pub particle_count: usize,
    pub speed: f64,
    pub connect_distance: f64,
}

/// Immutable configuration of one particle field instance.
///
/// `Default` is the hero background preset; [`FieldConfig::particles`] is the
/// standalone container preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldConfig {
    pub surface: SurfaceTarget,
    pub particle_count: usize,
    pub particle_color: Rgba,
    pub connect_color: Rgba,
    pub min_size: f64,
    pub max_size: f64,
    pub min_opacity: f64,
    pub max_opacity: f64,
    /// Each velocity component starts uniform in `[-speed, speed)` px/frame
    pub speed: f64,
    pub connect_particles: bool,
    pub connect_distance: f64,
    pub connection_style: ConnectionStyle,
    pub connection_search: ConnectionSearch,
    pub line_width: f64,
    /// `None` disables the wave overlay
    pub wave: Option<WaveConfig>,
    /// `None` leaves the surface transparent
    pub background: Option<Rgba>,
    pub interactive: bool,
    pub pointer: PointerConfig,
    pub edge_policy: EdgePolicy,
    pub responsive: Responsive,
    /// Palettes swapped in on theme changes; `None` ignores theme changes and
    /// keeps the colors above
    pub themes: Option<ThemePalettes>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        let particle = Rgba::new(74, 108, 247, 0.6);
        let connection = Rgba::new(74, 108, 247, 0.2);
        let wave = WaveConfig::default();

        Self {
            surface: SurfaceTarget::CanvasId {
                id: "heroCanvas".to_string(),
            },
            particle_count: 100,
            particle_color: particle,
            connect_color: connection,
            min_size: 1.0,
            max_size: 4.0,
            min_opacity: 0.3,
            max_opacity: 0.8,
            speed: 0.25,
            connect_particles: true,
            connect_distance: 150.0,
            connection_style: ConnectionStyle::ScaleWidth,
            connection_search: ConnectionSearch::BruteForce,
            line_width: 1.0,
            wave: Some(wave),
            background: None,
            interactive: true,
            pointer: PointerConfig::default(),
            edge_policy: EdgePolicy::Bounce,
            responsive: Responsive::WidthRatio {
                pixels_per_particle: 10.0,
            },
            themes: None,
        }
    }
}

impl FieldConfig {
    /// Standalone particle background appended to a container element.
    pub fn particles() -> Self {
        Self {
            surface: SurfaceTarget::Container {
                selector: "#particles-js".to_string(),
            },
            particle_count: 80,
            particle_color: Rgba::opaque(0x43, 0x61, 0xee),
            connect_color: Rgba::opaque(0x48, 0x95, 0xef),
            min_size: 1.0,
            max_size: 3.0,
            min_opacity: 0.5,
            max_opacity: 1.0,
            speed: 1.0,
            connect_particles: true,
            connect_distance: 150.0,
            connection_style: ConnectionStyle::FadeOpacity,
            connection_search: ConnectionSearch::BruteForce,
            line_width: 0.5,
            wave: None,
            background: None,
            interactive: false,
            pointer: PointerConfig {
                radius: 100.0,
                response: PointerResponse::Displace { strength: 2.0 },
            },
            edge_policy: EdgePolicy::Wrap,
            responsive: Responsive::Breakpoints {
                breakpoints: vec![
                    Breakpoint {
                        max_width: 768.0,
                        particle_count: Some(40),
                        speed: None,
                        connect_distance: None,
                    },
                    Breakpoint {
                        max_width: 480.0,
                        particle_count: Some(20),
                        speed: None,
                        connect_distance: None,
                    },
                ],
            },
            themes: None,
        }
    }

    /// Merge a JSON object of caller options over `base` and validate the
    /// result. Nested objects merge key by key; arrays and scalars replace.
    pub fn from_json(base: &FieldConfig, json: &str) -> Result<Self> {
        let overrides: Value = serde_json::from_str(json)?;
        Self::from_value(base, overrides)
    }

    pub fn from_value(base: &FieldConfig, overrides: Value) -> Result<Self> {
        if !(overrides.is_object() || overrides.is_null()) {
            return Err(FieldError::InvalidConfig(
                "options must be a JSON object".to_string(),
            ));
        }
        let mut merged = serde_json::to_value(base)?;
        merge(&mut merged, overrides);
        let config: FieldConfig = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(FieldError::InvalidConfig(msg));
        let finite_non_negative = |v: f64| v.is_finite() && v >= 0.0;

        if !finite_non_negative(self.min_size) || !finite_non_negative(self.max_size) {
            return fail("particle sizes must be finite and non-negative".to_string());
        }
        if self.min_size > self.max_size {
            return fail(format!(
                "minSize {} exceeds maxSize {}",
                self.min_size, self.max_size
            ));
        }
        if !(0.0..=1.0).contains(&self.min_opacity) || !(0.0..=1.0).contains(&self.max_opacity) {
            return fail("opacity range must lie within [0, 1]".to_string());
        }
        if self.min_opacity > self.max_opacity {
            return fail(format!(
                "minOpacity {} exceeds maxOpacity {}",
                self.min_opacity, self.max_opacity
            ));
        }
        if !finite_non_negative(self.speed) {
            return fail(format!("speed must be non-negative, got {}", self.speed));
        }
        if !(self.connect_distance.is_finite() && self.connect_distance > 0.0) {
            return fail(format!(
                "connectDistance must be positive, got {}",
                self.connect_distance
            ));
        }
        if !finite_non_negative(self.line_width) {
            return fail(format!("lineWidth must be non-negative, got {}", self.line_width));
        }
        if let Some(wave) = &self.wave {
            if !(wave.step.is_finite() && wave.step >= MIN_WAVE_STEP) {
                return fail(format!(
                    "wave step must be at least {MIN_WAVE_STEP}, got {}",
                    wave.step
                ));
            }
        }
        if !(self.pointer.radius.is_finite() && self.pointer.radius > 0.0) {
            return fail(format!(
                "pointer radius must be positive, got {}",
                self.pointer.radius
            ));
        }
        if let PointerResponse::Accelerate { damping, .. } = self.pointer.response {
            if !(damping > 0.0 && damping <= 1.0) {
                return fail(format!("damping must lie in (0, 1], got {damping}"));
            }
        }
        match &self.responsive {
            Responsive::Off => {}
            Responsive::Breakpoints { breakpoints } => {
                for bp in breakpoints {
                    if !(bp.max_width.is_finite() && bp.max_width > 0.0) {
                        return fail(format!("breakpoint width must be positive, got {}", bp.max_width));
                    }
                    if bp.speed.is_some_and(|s| !finite_non_negative(s)) {
                        return fail(format!("breakpoint {} has a negative speed", bp.max_width));
                    }
                    if bp.connect_distance.is_some_and(|d| !(d.is_finite() && d > 0.0)) {
                        return fail(format!(
                            "breakpoint {} has a non-positive connectDistance",
                            bp.max_width
                        ));
                    }
                }
            }
            Responsive::WidthRatio {
                pixels_per_particle,
            } => {
                if !(pixels_per_particle.is_finite() && *pixels_per_particle > 0.0) {
                    return fail(format!(
                        "pixelsPerParticle must be positive, got {pixels_per_particle}"
                    ));
                }
            }
        }
        Ok(())
    }

    /// Effective values for a viewport `viewport_width` wide rendering onto a
    /// surface `surface_width` wide.
    pub fn resolve(&self, viewport_width: f64, surface_width: f64) -> Resolved {
        let mut resolved = Resolved {
            particle_count: self.particle_count,
            speed: self.speed,
            connect_distance: self.connect_distance,
        };

        match &self.responsive {
            Responsive::Off => {}
            Responsive::Breakpoints { breakpoints } => {
                let mut matching: Vec<&Breakpoint> = breakpoints
                    .iter()
                    .filter(|bp| viewport_width <= bp.max_width)
                    .collect();
                matching.sort_by(|a, b| a.max_width.total_cmp(&b.max_width));

                if let Some(count) = matching.iter().find_map(|bp| bp.particle_count) {
                    resolved.particle_count = count;
                }
                if let Some(speed) = matching.iter().find_map(|bp| bp.speed) {
                    resolved.speed = speed;
                }
                if let Some(distance) = matching.iter().find_map(|bp| bp.connect_distance) {
                    resolved.connect_distance = distance;
                }
            }
            Responsive::WidthRatio {
                pixels_per_particle,
            } => {
                let cap = (surface_width.max(0.0) / pixels_per_particle).floor() as usize;
                resolved.particle_count = resolved.particle_count.min(cap);
            }
        }

        resolved
    }

    pub(crate) fn spawn_ranges(&self, resolved: &Resolved) -> SpawnRanges {
        SpawnRanges {
            min_size: self.min_size,
            max_size: self.max_size,
            min_opacity: self.min_opacity,
            max_opacity: self.max_opacity,
            speed: resolved.speed,
        }
    }

    /// Colors in effect before any theme change.
    pub fn base_palette(&self) -> Palette {
        Palette {
            particle: self.particle_color,
            connection: self.connect_color,
            wave: self
                .wave
                .map(|w| w.color)
                .unwrap_or(Rgba::TRANSPARENT),
        }
    }
}

fn merge(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                let nested = value.is_object() && base.get(&key).is_some_and(Value::is_object);
                match base.get_mut(&key) {
                    Some(existing) if nested => merge(existing, value),
                    _ => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (base, overrides) => *base = overrides,
    }
}
