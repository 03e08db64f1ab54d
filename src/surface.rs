//! Drawing primitives the field needs from its host.

use crate::color::Rgba;
use crate::error::Result;
use crate::geometry::Vec2;

/// A 2D drawing target in css-pixel coordinates.
pub trait Surface {
    /// Erase the whole `width` x `height` area to transparent.
    fn clear(&mut self, width: f64, height: f64) -> Result<()>;

    fn fill_rect(&mut self, width: f64, height: f64, color: &Rgba) -> Result<()>;

    /// Filled circle; `alpha` multiplies the color's own alpha.
    fn draw_circle(&mut self, center: Vec2, radius: f64, color: &Rgba, alpha: f64) -> Result<()>;

    fn draw_line(&mut self, from: Vec2, to: Vec2, color: &Rgba, width: f64) -> Result<()>;

    /// Fill the closed polygon through `points`.
    fn fill_path(&mut self, points: &[Vec2], color: &Rgba) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear {
        width: f64,
        height: f64,
    },
    FillRect {
        width: f64,
        height: f64,
        color: Rgba,
    },
    Circle {
        center: Vec2,
        radius: f64,
        color: Rgba,
        alpha: f64,
    },
    Line {
        from: Vec2,
        to: Vec2,
        color: Rgba,
        width: f64,
    },
    Path {
        points: Vec<Vec2>,
        color: Rgba,
    },
}

/// Surface that records every call, for headless hosts and tests.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain the commands recorded so far.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl Surface for RecordingSurface {
    fn clear(&mut self, width: f64, height: f64) -> Result<()> {
        self.commands.push(DrawCommand::Clear { width, height });
        Ok(())
    }

    fn fill_rect(&mut self, width: f64, height: f64, color: &Rgba) -> Result<()> {
        self.commands.push(DrawCommand::FillRect {
            width,
            height,
            color: *color,
        });
        Ok(())
    }

    fn draw_circle(&mut self, center: Vec2, radius: f64, color: &Rgba, alpha: f64) -> Result<()> {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color: *color,
            alpha,
        });
        Ok(())
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, color: &Rgba, width: f64) -> Result<()> {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            color: *color,
            width,
        });
        Ok(())
    }

    fn fill_path(&mut self, points: &[Vec2], color: &Rgba) -> Result<()> {
        self.commands.push(DrawCommand::Path {
            points: points.to_vec(),
            color: *color,
        });
        Ok(())
    }
}
