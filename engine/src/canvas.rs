use std::collections::HashMap;

use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::engine::AnimationEngine;
use crate::surface::{CompositeOp, Paint, Surface};

/// `Surface` over a browser 2D context. Images are looked up by `src` in the
/// engine's cache; sources that have not been registered are skipped.
pub struct CanvasSurface<'a> {
    ctx: &'a CanvasRenderingContext2d,
    images: &'a HashMap<String, HtmlImageElement>,
    width: f64,
    height: f64,
}

impl<'a> CanvasSurface<'a> {
    pub fn new(ctx: &'a CanvasRenderingContext2d, images: &'a HashMap<String, HtmlImageElement>) -> Self {
        let (width, height) = ctx
            .canvas()
            .map(|c| (c.width() as f64, c.height() as f64))
            .unwrap_or((0.0, 0.0));
        CanvasSurface { ctx, images, width, height }
    }
}

enum Slot {
    Fill,
    Stroke,
}

fn apply_paint(ctx: &CanvasRenderingContext2d, paint: &Paint, slot: Slot) {
    let gradient = match paint {
        Paint::Solid { color } => {
            match slot {
                Slot::Fill => ctx.set_fill_style_str(color),
                Slot::Stroke => ctx.set_stroke_style_str(color),
            }
            return;
        }
        Paint::Linear { x0, y0, x1, y1, stops } => Some((ctx.create_linear_gradient(*x0, *y0, *x1, *y1), stops)),
        Paint::Radial { x0, y0, r0, x1, y1, r1, stops } => {
            ctx.create_radial_gradient(*x0, *y0, *r0, *x1, *y1, *r1).ok().map(|g| (g, stops))
        }
    };
    if let Some((canvas_grad, stops)) = gradient {
        for (offset, color) in stops {
            let _ = canvas_grad.add_color_stop(*offset as f32, color);
        }
        match slot {
            Slot::Fill => ctx.set_fill_style(&canvas_grad),
            Slot::Stroke => ctx.set_stroke_style(&canvas_grad),
        }
    }
}

impl Surface for CanvasSurface<'_> {
    fn width(&self) -> f64 { self.width }
    fn height(&self) -> f64 { self.height }

    fn save(&mut self) { self.ctx.save(); }
    fn restore(&mut self) { self.ctx.restore(); }
    fn reset_transform(&mut self) {
        let _ = self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    }
    fn translate(&mut self, x: f64, y: f64) { let _ = self.ctx.translate(x, y); }
    fn rotate(&mut self, angle: f64) { let _ = self.ctx.rotate(angle); }
    fn scale(&mut self, sx: f64, sy: f64) { let _ = self.ctx.scale(sx, sy); }

    fn clear(&mut self) {
        self.ctx.save();
        let _ = self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        self.ctx.clear_rect(0.0, 0.0, self.width, self.height);
        self.ctx.restore();
    }

    fn set_global_alpha(&mut self, alpha: f64) { self.ctx.set_global_alpha(alpha); }
    fn set_composite(&mut self, op: CompositeOp) {
        let _ = self.ctx.set_global_composite_operation(op.as_str());
    }
    fn set_fill(&mut self, paint: &Paint) { apply_paint(self.ctx, paint, Slot::Fill); }
    fn set_stroke(&mut self, paint: &Paint) { apply_paint(self.ctx, paint, Slot::Stroke); }
    fn set_line_width(&mut self, width: f64) { self.ctx.set_line_width(width); }
    fn set_line_dash(&mut self, dash: &[f64]) {
        let segments = js_sys::Array::new();
        for d in dash {
            segments.push(&JsValue::from_f64(*d));
        }
        let _ = self.ctx.set_line_dash(&segments);
    }
    fn set_round_caps(&mut self) {
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
    }
    fn set_font(&mut self, font: &str) { self.ctx.set_font(font); }
    fn set_shadow(&mut self, color: &str, blur: f64) {
        self.ctx.set_shadow_color(color);
        self.ctx.set_shadow_blur(blur);
        self.ctx.set_shadow_offset_x(0.0);
        self.ctx.set_shadow_offset_y(0.0);
    }

    fn begin_path(&mut self) { self.ctx.begin_path(); }
    fn move_to(&mut self, x: f64, y: f64) { self.ctx.move_to(x, y); }
    fn line_to(&mut self, x: f64, y: f64) { self.ctx.line_to(x, y); }
    fn quadratic_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) { self.ctx.quadratic_curve_to(cx, cy, x, y); }
    fn close_path(&mut self) { self.ctx.close_path(); }
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) { self.ctx.rect(x, y, w, h); }
    fn arc(&mut self, cx: f64, cy: f64, r: f64, start: f64, end: f64) {
        let _ = self.ctx.arc(cx, cy, r.max(0.0), start, end);
    }
    fn ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, start: f64, end: f64) {
        let _ = self.ctx.ellipse(cx, cy, rx.max(0.0), ry.max(0.0), 0.0, start, end);
    }
    fn fill(&mut self) { self.ctx.fill(); }
    fn stroke(&mut self) { self.ctx.stroke(); }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) { self.ctx.fill_rect(x, y, w, h); }
    fn fill_text(&mut self, text: &str, x: f64, y: f64) { let _ = self.ctx.fill_text(text, x, y); }
    fn draw_image(&mut self, src: &str, x: f64, y: f64, w: f64, h: f64) {
        match self.images.get(src) {
            Some(image) => {
                let _ = self.ctx.draw_image_with_html_image_element_and_dw_and_dh(image, x, y, w, h);
            }
            None => log::debug!("image '{}' not registered, skipped", src),
        }
    }
}

#[wasm_bindgen]
impl AnimationEngine {
    /// Redraws the main and overlay canvases.
    pub fn render(&self, main_ctx: &CanvasRenderingContext2d, overlay_ctx: &CanvasRenderingContext2d) {
        let mut main = CanvasSurface::new(main_ctx, &self.image_cache);
        let mut overlay = CanvasSurface::new(overlay_ctx, &self.image_cache);
        self.redraw_to(&mut main, &mut overlay);
    }

    /// Composites one frame for export. Returns false for an unknown index.
    pub fn render_frame_to_canvas(&self, index: usize, ctx: &CanvasRenderingContext2d) -> bool {
        let mut surface = CanvasSurface::new(ctx, &self.image_cache);
        match self.render_frame_to(index, &mut surface) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("export of frame {} failed: {}", index, e);
                false
            }
        }
    }
}
