//! Decorative particle field for web pages: drifting particles joined by
//! distance-faded connection lines, an optional sinusoidal wave band and
//! pointer repulsion, drawn onto a 2D canvas every animation frame.
//!
//! The engine is host-agnostic and runs anywhere; the browser bindings are
//! compiled only for `wasm32`.

#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

pub mod animation;
pub mod color;
pub mod config;
pub mod connections;
pub mod error;
pub mod field;
pub mod geometry;
pub mod particle;
pub mod pointer;
pub mod surface;
pub mod theme;
pub mod wave;

pub use animation::{AnimationHandle, FrameScheduler, ManualScheduler};
pub use color::Rgba;
pub use config::{Breakpoint, FieldConfig, Resolved, Responsive, SurfaceTarget};
pub use connections::{ConnectionSearch, ConnectionStyle, Edge};
pub use error::{FieldError, Result};
pub use field::ParticleField;
pub use geometry::{Geometry, Vec2};
pub use particle::{EdgePolicy, Particle};
pub use pointer::{PointerConfig, PointerResponse};
pub use surface::{DrawCommand, RecordingSurface, Surface};
pub use theme::{Palette, Theme, ThemePalettes};
pub use wave::WaveConfig;

// Only compile wasm-specific code when targeting wasm32.
#[cfg(target_arch = "wasm32")]
mod wasm {
    use wasm_bindgen::prelude::*;

    mod logger;
    mod mount;
    mod render;
    mod theme;

    pub use mount::ParticleCanvas;

    /// Install the console logger and mount the page's standard surfaces.
    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        logger::init(log::LevelFilter::Info);
        mount::autostart()?;
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::ParticleCanvas;
