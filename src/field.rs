//! The particle field engine: particle state, pointer repulsion, connection
//! edges and the wave overlay, rendered in a fixed order every frame.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{FieldConfig, Resolved};
use crate::connections::{self, ConnectionStyle, Edge};
use crate::error::Result;
use crate::geometry::{Geometry, Vec2};
use crate::particle::Particle;
use crate::pointer::{self, Pointer, PointerResponse};
use crate::surface::Surface;
use crate::theme::{Palette, Theme};

pub struct ParticleField<R: Rng = StdRng> {
    config: FieldConfig,
    geometry: Geometry,
    viewport_width: f64,
    resolved: Resolved,
    particles: Vec<Particle>,
    pointer: Pointer,
    palette: Palette,
    theme: Theme,
    /// Frames rendered so far, drives the wave phase
    time: u64,
    rng: R,
}

impl ParticleField<StdRng> {
    /// Field seeded from the host's entropy source.
    pub fn new(config: FieldConfig, geometry: Geometry, viewport_width: f64) -> Result<Self> {
        Self::with_rng(config, geometry, viewport_width, StdRng::from_entropy())
    }
}

impl<R: Rng> ParticleField<R> {
    pub fn with_rng(
        config: FieldConfig,
        geometry: Geometry,
        viewport_width: f64,
        rng: R,
    ) -> Result<Self> {
        config.validate()?;
        let palette = config.base_palette();
        let resolved = config.resolve(viewport_width, geometry.width);
        let mut field = Self {
            config,
            geometry,
            viewport_width,
            resolved,
            particles: Vec::new(),
            pointer: Pointer::default(),
            palette,
            theme: Theme::default(),
            time: 0,
            rng,
        };
        field.populate();
        Ok(field)
    }

    fn populate(&mut self) {
        self.resolved = self.config.resolve(self.viewport_width, self.geometry.width);
        let ranges = self.config.spawn_ranges(&self.resolved);
        let color = self.palette.particle;
        let geometry = self.geometry;

        self.particles.clear();
        self.particles.reserve(self.resolved.particle_count);
        for _ in 0..self.resolved.particle_count {
            self.particles
                .push(Particle::spawn(&mut self.rng, &geometry, &ranges, color));
        }

        log::debug!(
            "populated {} particles on {}x{} (viewport {})",
            self.particles.len(),
            geometry.width,
            geometry.height,
            self.viewport_width
        );
    }

    /// Adopt new surface dimensions and regenerate every particle.
    pub fn resize(&mut self, geometry: Geometry, viewport_width: f64) {
        self.geometry = geometry;
        self.viewport_width = viewport_width;
        self.populate();
    }

    pub fn pointer_moved(&mut self, local: Vec2) {
        self.pointer.moved(local);
    }

    pub fn pointer_left(&mut self) {
        self.pointer.left();
    }

    /// Switch to the palette configured for `theme` and recolor existing
    /// particles. Returns false when the field has no theme palettes or is
    /// already showing `theme`.
    pub fn apply_theme(&mut self, theme: Theme) -> bool {
        let Some(themes) = self.config.themes else {
            return false;
        };
        if theme == self.theme {
            return false;
        }
        self.theme = theme;
        self.palette = themes.for_theme(theme);
        for particle in &mut self.particles {
            particle.color = self.palette.particle;
        }
        true
    }

    /// Advance every particle by one frame.
    pub fn update(&mut self) {
        let geometry = self.geometry;
        let edge_policy = self.config.edge_policy;
        let pointer_at = if self.config.interactive {
            self.pointer.position()
        } else {
            None
        };
        let radius = self.config.pointer.radius;
        let response = self.config.pointer.response;
        let damping = match response {
            PointerResponse::Accelerate { damping, .. } => Some(damping),
            PointerResponse::Displace { .. } => None,
        };

        for particle in &mut self.particles {
            particle.advance();

            if let Some(force) =
                pointer_at.and_then(|p| pointer::repulsion(particle.position, p, radius))
            {
                match response {
                    PointerResponse::Accelerate { strength, .. } => {
                        particle.velocity += force * strength;
                    }
                    PointerResponse::Displace { strength } => {
                        particle.position += force * strength;
                    }
                }
            }

            particle.apply_edge(edge_policy, &geometry);

            if let Some(damping) = damping {
                particle.velocity = particle.velocity * damping;
            }
        }
    }

    /// Edges between particles closer than the effective connect distance.
    pub fn connections(&self) -> Vec<Edge> {
        let points: Vec<Vec2> = self.particles.iter().map(|p| p.position).collect();
        connections::find(
            &points,
            self.resolved.connect_distance,
            self.config.connection_search,
        )
    }

    pub fn wave_path(&self) -> Option<Vec<Vec2>> {
        self.config
            .wave
            .map(|wave| wave.path(&self.geometry, self.time))
    }

    /// Draw the current state: clear, background, wave, connections,
    /// particles.
    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S) -> Result<()> {
        let Geometry { width, height, .. } = self.geometry;
        surface.clear(width, height)?;

        if let Some(background) = self.config.background.filter(|c| !c.is_transparent()) {
            surface.fill_rect(width, height, &background)?;
        }

        if let Some(path) = self.wave_path() {
            surface.fill_path(&path, &self.palette.wave)?;
        }

        if self.config.connect_particles {
            for edge in self.connections() {
                let (from, to) = (
                    self.particles[edge.a].position,
                    self.particles[edge.b].position,
                );
                match self.config.connection_style {
                    ConnectionStyle::FadeOpacity => {
                        let color = self.palette.connection.scale_alpha(edge.strength);
                        surface.draw_line(from, to, &color, self.config.line_width)?;
                    }
                    ConnectionStyle::ScaleWidth => {
                        let width = self.config.line_width * edge.strength;
                        surface.draw_line(from, to, &self.palette.connection, width)?;
                    }
                }
            }
        }

        for particle in &self.particles {
            surface.draw_circle(
                particle.position,
                particle.radius,
                &particle.color,
                particle.opacity,
            )?;
        }

        Ok(())
    }

    /// One animation frame: render, then update, then advance the frame
    /// counter.
    pub fn frame<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Result<()> {
        self.render(surface)?;
        self.update();
        self.time += 1;
        Ok(())
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn resolved(&self) -> Resolved {
        self.resolved
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer.position()
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn time(&self) -> u64 {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::config::Responsive;
    use crate::particle::EdgePolicy;
    use crate::surface::{DrawCommand, RecordingSurface};
    use crate::theme::ThemePalettes;

    fn seeded(config: FieldConfig, width: f64, height: f64) -> ParticleField<StdRng> {
        ParticleField::with_rng(
            config,
            Geometry::new(width, height),
            width,
            StdRng::seed_from_u64(11),
        )
        .unwrap()
    }

    fn single(config: FieldConfig, position: Vec2, velocity: Vec2) -> ParticleField<StdRng> {
        let mut field = seeded(
            FieldConfig {
                particle_count: 1,
                responsive: Responsive::Off,
                ..config
            },
            500.0,
            300.0,
        );
        field.particles[0].position = position;
        field.particles[0].velocity = velocity;
        field
    }

    #[test]
    fn frame_draw_order() {
        let mut field = seeded(
            FieldConfig {
                particle_count: 5,
                background: Some(Rgba::opaque(0, 0, 0)),
                connect_distance: 10_000.0,
                ..FieldConfig::default()
            },
            500.0,
            300.0,
        );
        let mut surface = RecordingSurface::new();
        field.frame(&mut surface).unwrap();

        let kinds: Vec<u8> = surface
            .commands
            .iter()
            .map(|c| match c {
                DrawCommand::Clear { .. } => 0,
                DrawCommand::FillRect { .. } => 1,
                DrawCommand::Path { .. } => 2,
                DrawCommand::Line { .. } => 3,
                DrawCommand::Circle { .. } => 4,
            })
            .collect();
        let mut sorted = kinds.clone();
        sorted.sort();
        assert_eq!(kinds, sorted);
        assert_eq!(kinds.iter().filter(|k| **k == 3).count(), 10);
        assert_eq!(kinds.iter().filter(|k| **k == 4).count(), 5);
        assert_eq!(field.time(), 1);
    }

    #[test]
    fn transparent_background_is_skipped() {
        let field = seeded(
            FieldConfig {
                background: Some(Rgba::TRANSPARENT),
                ..FieldConfig::default()
            },
            200.0,
            200.0,
        );
        let mut surface = RecordingSurface::new();
        field.render(&mut surface).unwrap();
        assert!(!surface
            .commands
            .iter()
            .any(|c| matches!(c, DrawCommand::FillRect { .. })));
    }

    #[test]
    fn fade_style_scales_alpha() {
        let mut field = seeded(
            FieldConfig {
                particle_count: 2,
                responsive: Responsive::Off,
                connect_distance: 100.0,
                ..FieldConfig::particles()
            },
            500.0,
            300.0,
        );
        field.particles[0].position = Vec2::new(100.0, 100.0);
        field.particles[1].position = Vec2::new(175.0, 100.0);

        let mut surface = RecordingSurface::new();
        field.render(&mut surface).unwrap();
        let line = surface
            .commands
            .iter()
            .find_map(|c| match c {
                DrawCommand::Line { color, width, .. } => Some((*color, *width)),
                _ => None,
            })
            .unwrap();
        assert!((line.0.a - 0.25).abs() < 1e-12);
        assert_eq!(line.1, 0.5);
    }

    #[test]
    fn scale_style_scales_width() {
        let mut field = seeded(
            FieldConfig {
                particle_count: 2,
                responsive: Responsive::Off,
                connect_distance: 100.0,
                line_width: 2.0,
                ..FieldConfig::default()
            },
            500.0,
            300.0,
        );
        field.particles[0].position = Vec2::new(100.0, 100.0);
        field.particles[1].position = Vec2::new(100.0, 150.0);

        let mut surface = RecordingSurface::new();
        field.render(&mut surface).unwrap();
        let width = surface
            .commands
            .iter()
            .find_map(|c| match c {
                DrawCommand::Line { width, .. } => Some(*width),
                _ => None,
            })
            .unwrap();
        assert!((width - 1.0).abs() < 1e-12);
    }

    #[test]
    fn accelerate_pushes_velocity_away_from_pointer() {
        let mut field = single(
            FieldConfig::default(),
            Vec2::new(250.0, 150.0),
            Vec2::ZERO,
        );
        field.pointer_moved(Vec2::new(240.0, 150.0));
        field.update();
        let v = field.particles()[0].velocity;
        assert!(v.x > 0.0);
        assert!(v.y.abs() < 1e-12);
    }

    #[test]
    fn displace_pushes_position() {
        let config = FieldConfig {
            interactive: true,
            edge_policy: EdgePolicy::Bounce,
            ..FieldConfig::particles()
        };
        let mut field = single(config, Vec2::new(250.0, 150.0), Vec2::ZERO);
        field.pointer_moved(Vec2::new(250.0, 100.0));
        field.update();
        let p = field.particles()[0];
        // force = (100 - 50) / 100, strength 2
        assert!((p.position.y - 151.0).abs() < 1e-12);
        assert_eq!(p.velocity, Vec2::ZERO);
    }

    #[test]
    fn pointer_ignored_when_not_interactive() {
        let config = FieldConfig {
            interactive: false,
            ..FieldConfig::default()
        };
        let mut field = single(config, Vec2::new(250.0, 150.0), Vec2::ZERO);
        field.pointer_moved(Vec2::new(250.0, 150.0));
        field.update();
        assert_eq!(field.particles()[0].velocity, Vec2::ZERO);
    }

    #[test]
    fn damping_bounds_pointer_driven_speed() {
        let mut field = single(
            FieldConfig::default(),
            Vec2::new(250.0, 150.0),
            Vec2::ZERO,
        );
        for _ in 0..2_000 {
            // keep the pointer glued just behind the particle
            let p = field.particles()[0].position;
            field.pointer_moved(p - Vec2::new(1.0, 0.0));
            field.update();
        }
        // terminal speed of v = 0.99 (v + 0.2) is below 20
        assert!(field.particles()[0].velocity.length() < 20.0);
    }

    #[test]
    fn accelerate_damps_every_frame() {
        let mut field = single(
            FieldConfig::default(),
            Vec2::new(250.0, 150.0),
            Vec2::new(0.1, -0.2),
        );
        field.update();
        let v = field.particles()[0].velocity;
        assert!((v.x - 0.1 * 0.99).abs() < 1e-15);
        assert!((v.y + 0.2 * 0.99).abs() < 1e-15);

        let mut undamped = single(
            FieldConfig::particles(),
            Vec2::new(250.0, 150.0),
            Vec2::new(0.1, -0.2),
        );
        undamped.update();
        assert_eq!(undamped.particles()[0].velocity, Vec2::new(0.1, -0.2));
    }

    #[test]
    fn theme_change_recolors() {
        let dark = Palette {
            particle: Rgba::opaque(255, 255, 255),
            connection: Rgba::opaque(200, 200, 200),
            wave: Rgba::new(10, 10, 10, 0.5),
        };
        let config = FieldConfig {
            themes: Some(ThemePalettes {
                light: FieldConfig::default().base_palette(),
                dark,
            }),
            ..FieldConfig::default()
        };
        let mut field = seeded(config, 300.0, 300.0);
        assert!(field.apply_theme(Theme::Dark));
        assert_eq!(field.palette(), dark);
        assert!(field.particles().iter().all(|p| p.color == dark.particle));

        let mut plain = seeded(FieldConfig::particles(), 300.0, 300.0);
        assert!(!plain.apply_theme(Theme::Dark));
        assert_eq!(plain.theme(), Theme::Light);
    }

    #[test]
    fn light_theme_keeps_caller_colors() {
        let red = Rgba::opaque(255, 0, 0);
        let config =
            FieldConfig::from_json(&FieldConfig::default(), r##"{"particleColor": "#ff0000"}"##)
                .unwrap();
        let mut field = seeded(config, 300.0, 300.0);
        assert!(!field.apply_theme(Theme::Light));
        assert_eq!(field.palette().particle, red);
        assert!(field.particles().iter().all(|p| p.color == red));

        // palettes given, page already light: nothing is swapped in
        let dark = Palette {
            particle: Rgba::opaque(255, 255, 255),
            ..field.palette()
        };
        let themed = FieldConfig {
            themes: Some(ThemePalettes {
                light: FieldConfig::default().base_palette(),
                dark,
            }),
            ..field.config().clone()
        };
        let mut field = seeded(themed, 300.0, 300.0);
        assert!(!field.apply_theme(Theme::Light));
        assert_eq!(field.palette().particle, red);
        assert!(field.apply_theme(Theme::Dark));
        assert_eq!(field.palette().particle, dark.particle);
    }
}
