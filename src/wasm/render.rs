use std::f64::consts::PI;

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{window, CanvasRenderingContext2d, HtmlCanvasElement};

use crate::animation::FrameScheduler;
use crate::color::Rgba;
use crate::error::{FieldError, Result};
use crate::geometry::{Geometry, Vec2};
use crate::surface::Surface;

/// [`Surface`] backed by a canvas 2D context. Coordinates are css pixels;
/// the device pixel ratio is folded into the context transform.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| FieldError::Host("2D canvas context not supported".to_string()))?
            .dyn_into()
            .map_err(|_| FieldError::Host("unexpected canvas context type".to_string()))?;
        Ok(Self { canvas, ctx })
    }

    /// Size the backing store and css box to `geometry` and reset the
    /// transform to the device pixel ratio.
    pub fn resize(&self, geometry: &Geometry) -> Result<()> {
        let (w, h) = geometry.backing_size();
        self.canvas.set_width(w);
        self.canvas.set_height(h);

        let style = self.canvas.style();
        style.set_property("width", &format!("{}px", geometry.width))?;
        style.set_property("height", &format!("{}px", geometry.height))?;

        let dpr = geometry.device_pixel_ratio;
        self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
        Ok(())
    }
}

impl Surface for CanvasSurface {
    fn clear(&mut self, width: f64, height: f64) -> Result<()> {
        self.ctx.clear_rect(0.0, 0.0, width, height);
        Ok(())
    }

    fn fill_rect(&mut self, width: f64, height: f64, color: &Rgba) -> Result<()> {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill_rect(0.0, 0.0, width, height);
        Ok(())
    }

    fn draw_circle(&mut self, center: Vec2, radius: f64, color: &Rgba, alpha: f64) -> Result<()> {
        self.ctx.begin_path();
        self.ctx.arc(center.x, center.y, radius, 0.0, 2.0 * PI)?;
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.set_global_alpha(alpha);
        self.ctx.fill();
        self.ctx.set_global_alpha(1.0);
        Ok(())
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, color: &Rgba, width: f64) -> Result<()> {
        self.ctx.begin_path();
        self.ctx.set_stroke_style_str(&color.to_css());
        self.ctx.set_line_width(width);
        self.ctx.move_to(from.x, from.y);
        self.ctx.line_to(to.x, to.y);
        self.ctx.stroke();
        Ok(())
    }

    fn fill_path(&mut self, points: &[Vec2], color: &Rgba) -> Result<()> {
        let Some((first, rest)) = points.split_first() else {
            return Ok(());
        };
        self.ctx.begin_path();
        self.ctx.move_to(first.x, first.y);
        for p in rest {
            self.ctx.line_to(p.x, p.y);
        }
        self.ctx.close_path();
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill();
        Ok(())
    }
}

/// Runs frames on `requestAnimationFrame`.
pub struct AnimationFrames;

impl FrameScheduler for AnimationFrames {
    fn schedule(&self, frame: Box<dyn FnOnce()>) -> Result<()> {
        let window = window().ok_or_else(|| FieldError::Host("no window".to_string()))?;
        // a one-shot closure frees itself after running
        let callback: JsValue = Closure::once_into_js(frame);
        window.request_animation_frame(callback.unchecked_ref())?;
        Ok(())
    }
}
