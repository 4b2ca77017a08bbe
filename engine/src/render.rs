use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, FRAC_PI_6, PI, TAU};

use kurbo::Point;

use crate::engine::AnimationEngine;
use crate::error::{EngineError, EngineResult};
use crate::input::DrawingState;
use crate::objects::{BoxData, EllipseData, LineData, ParticleData, PathData, SceneObject, Shape, TextData, extent_or_default};
use crate::scene::Frame;
use crate::surface::{CompositeOp, Paint, Surface};
use crate::transform::HandleLayout;
use crate::types::{Tool, HandleType};

const HANDLE_STROKE: &str = "#4f46e5";
const HANDLE_FILL: &str = "#ffffff";
const ROTATE_FILL: &str = "#22c55e";
const ROTATE_STROKE: &str = "#16a34a";
const GLOW_COLOR: &str = "#ff6b35";
const GLOW_BLUR: f64 = 20.0;
const ARROW_HEAD: f64 = 15.0;
const PREVIEW_ARROW_HEAD: f64 = 20.0;
const PREVIEW_ALPHA: f64 = 0.7;
const STAR_SPIKES: usize = 5;
const STAR_INNER_RATIO: f64 = 0.4;
/// Opaque fill used by exports when no background is configured.
pub const EXPORT_BACKGROUND: &str = "#ffffff";

/// Fallbacks for payloads that carry no colour or width, plus the clock used
/// for flame flicker.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawDefaults {
    pub color: String,
    pub line_width: f64,
    pub clock_ms: f64,
}

impl Default for DrawDefaults {
    fn default() -> Self {
        DrawDefaults { color: "#4f46e5".to_string(), line_width: 5.0, clock_ms: 0.0 }
    }
}

/// Background fill then every visible object, with no onion skin, handles
/// or zoom. Exporters drive this once per frame.
pub fn render_frame_to_surface(frame: &Frame, background: Option<&str>, surface: &mut dyn Surface, defaults: &DrawDefaults) {
    surface.reset_transform();
    surface.clear();
    if let Some(color) = background {
        surface.set_fill(&Paint::solid(color));
        surface.fill_rect(0.0, 0.0, surface.width(), surface.height());
    }
    draw_frame_objects(frame, surface, 1.0, defaults);
}

/// Draws the top-level objects of `frame`, back to front, at `pass_alpha`.
pub fn draw_frame_objects(frame: &Frame, surface: &mut dyn Surface, pass_alpha: f64, defaults: &DrawDefaults) {
    for obj in frame.objects.iter().filter(|o| o.visible) {
        draw_object(obj, surface, pass_alpha, defaults);
    }
}

pub fn draw_object(obj: &SceneObject, surface: &mut dyn Surface, pass_alpha: f64, defaults: &DrawDefaults) {
    let alpha = pass_alpha * obj.opacity;
    surface.save();
    surface.set_global_alpha(alpha);
    if obj.is_mask {
        surface.set_composite(CompositeOp::DestinationIn);
    }
    surface.translate(obj.x, obj.y);
    surface.rotate(obj.rotation);
    surface.scale(obj.scale_x, obj.scale_y);
    draw_shape(obj, surface, alpha, defaults);
    surface.restore();
}

/// Per-kind drawing in the object's local space (pivot at the origin).
pub fn draw_shape(obj: &SceneObject, surface: &mut dyn Surface, alpha: f64, defaults: &DrawDefaults) {
    let style = obj.shape.style();
    let color = style.and_then(|s| s.color.clone()).unwrap_or_else(|| defaults.color.clone());
    let fill_color = style.and_then(|s| s.fill_color.clone());
    surface.set_stroke(&Paint::solid(&color));
    surface.set_fill(&Paint::solid(&color));
    surface.set_line_width(style.and_then(|s| s.line_width).unwrap_or(defaults.line_width));
    surface.set_round_caps();

    match &obj.shape {
        Shape::Line(d) => draw_line(d, surface),
        Shape::Bone(d) => draw_bone(d, surface),
        Shape::Circle(d) => {
            let (rx, ry) = d.radii();
            surface.begin_path();
            surface.ellipse(0.0, 0.0, rx, ry, 0.0, TAU);
            fill_then_stroke(surface, fill_color.as_deref());
        }
        Shape::Semicircle(d) => {
            let (rx, ry) = d.radii();
            surface.begin_path();
            surface.ellipse(0.0, 0.0, rx, ry, 0.0, PI);
            surface.close_path();
            fill_then_stroke(surface, fill_color.as_deref());
        }
        Shape::Star(d) => draw_star(d, surface, fill_color.as_deref()),
        Shape::Square(d) => {
            let (w, h) = box_extent(d);
            surface.begin_path();
            surface.rect(-w / 2.0, -h / 2.0, w, h);
            fill_then_stroke(surface, fill_color.as_deref());
        }
        Shape::Triangle(d) => {
            let (w, h) = box_extent(d);
            surface.begin_path();
            surface.move_to(0.0, -h / 2.0);
            surface.line_to(-w / 2.0, h / 2.0);
            surface.line_to(w / 2.0, h / 2.0);
            surface.close_path();
            fill_then_stroke(surface, fill_color.as_deref());
        }
        Shape::Arrow(d) => {
            let (w, _) = box_extent(d);
            draw_arrow(surface, Point::new(-w / 2.0, 0.0), Point::new(w / 2.0, 0.0), fill_color.as_deref());
        }
        Shape::Text(d) => draw_text(d, surface),
        Shape::Path(d) => draw_path(d, surface, fill_color.as_deref()),
        Shape::EraserPath(d) => {
            if d.points.len() > 1 {
                surface.set_composite(CompositeOp::DestinationOut);
                trace_points(surface, &d.points);
                surface.stroke();
                surface.set_composite(CompositeOp::SourceOver);
            }
        }
        Shape::Pencil(d) => {
            surface.begin_path();
            surface.arc(0.0, 0.0, d.style.line_width.unwrap_or(defaults.line_width), 0.0, TAU);
            surface.fill();
        }
        Shape::Eraser(d) => {
            surface.set_composite(CompositeOp::DestinationOut);
            surface.begin_path();
            surface.arc(0.0, 0.0, d.style.line_width.unwrap_or(defaults.line_width), 0.0, TAU);
            surface.fill();
            surface.set_composite(CompositeOp::SourceOver);
        }
        Shape::FloodFill(d) => {
            let (w, h) = box_extent(d);
            if let Some(fill) = &fill_color {
                surface.set_fill(&Paint::solid(fill));
            }
            surface.begin_path();
            surface.rect(-w / 2.0, -h / 2.0, w, h);
            surface.fill();
        }
        Shape::Group(g) => {
            for child in g.objects.iter().filter(|c| c.visible) {
                draw_object(child, surface, alpha, defaults);
            }
        }
        Shape::Image(d) => {
            let w = extent_or_default(d.width);
            let h = extent_or_default(d.height);
            surface.save();
            if d.has_glow {
                surface.set_shadow(GLOW_COLOR, GLOW_BLUR);
            }
            surface.draw_image(&d.src, -w / 2.0, -h / 2.0, w, h);
            surface.restore();
        }
        Shape::Raindrop(d) => draw_raindrop(d, surface),
        Shape::Snowflake(d) => draw_snowflake(d, surface),
        Shape::Flame(d) => draw_flame(d, surface, defaults.clock_ms),
    }
}

fn box_extent(d: &BoxData) -> (f64, f64) {
    (extent_or_default(d.width), extent_or_default(d.height))
}

fn fill_then_stroke(surface: &mut dyn Surface, fill_color: Option<&str>) {
    if let Some(fill) = fill_color {
        surface.set_fill(&Paint::solid(fill));
        surface.fill();
    }
    surface.stroke();
}

fn trace_points(surface: &mut dyn Surface, points: &[Point]) {
    surface.begin_path();
    if let Some((first, rest)) = points.split_first() {
        surface.move_to(first.x, first.y);
        for p in rest {
            surface.line_to(p.x, p.y);
        }
    }
}

fn draw_line(d: &LineData, surface: &mut dyn Surface) {
    surface.begin_path();
    surface.move_to(d.start_x, d.start_y);
    surface.line_to(d.end_x, d.end_y);
    surface.stroke();
}

/// Bones are inert: a segment with a joint at each end.
fn draw_bone(d: &LineData, surface: &mut dyn Surface) {
    draw_line(d, surface);
    for joint in [d.start(), d.end()] {
        surface.begin_path();
        surface.arc(joint.x, joint.y, 4.0, 0.0, TAU);
        surface.fill();
    }
}

fn draw_path(d: &PathData, surface: &mut dyn Surface, fill_color: Option<&str>) {
    if d.points.len() < 2 {
        return;
    }
    trace_points(surface, &d.points);
    if d.closed {
        surface.close_path();
        if let Some(fill) = fill_color {
            surface.set_fill(&Paint::solid(fill));
            surface.fill();
        }
    }
    surface.stroke();
}

fn draw_text(d: &TextData, surface: &mut dyn Surface) {
    let size = d.font_size.unwrap_or(24.0);
    let family = d.font_family.as_deref().unwrap_or("Inter");
    let w = extent_or_default(d.width);
    surface.set_font(&format!("{}px {}", size, family));
    surface.fill_text(&d.text, -w / 2.0, 0.0);
}

pub fn star_points(rx: f64, ry: f64) -> Vec<Point> {
    let step = PI / STAR_SPIKES as f64;
    (0..STAR_SPIKES * 2)
        .map(|i| {
            let angle = -FRAC_PI_2 + step * i as f64;
            let k = if i % 2 == 0 { 1.0 } else { STAR_INNER_RATIO };
            Point::new(angle.cos() * rx * k, angle.sin() * ry * k)
        })
        .collect()
}

fn draw_star(d: &EllipseData, surface: &mut dyn Surface, fill_color: Option<&str>) {
    let (rx, ry) = d.radii();
    trace_points(surface, &star_points(rx, ry));
    surface.close_path();
    fill_then_stroke(surface, fill_color);
}

fn arrow_head(from: Point, to: Point, length: f64) -> (Point, Point) {
    let angle = (to - from).atan2();
    let a = Point::new(to.x - length * (angle - FRAC_PI_6).cos(), to.y - length * (angle - FRAC_PI_6).sin());
    let b = Point::new(to.x - length * (angle + FRAC_PI_6).cos(), to.y - length * (angle + FRAC_PI_6).sin());
    (a, b)
}

fn draw_arrow(surface: &mut dyn Surface, from: Point, to: Point, fill_color: Option<&str>) {
    surface.begin_path();
    surface.move_to(from.x, from.y);
    surface.line_to(to.x, to.y);
    surface.stroke();

    let (a, b) = arrow_head(from, to, ARROW_HEAD);
    surface.begin_path();
    surface.move_to(to.x, to.y);
    surface.line_to(a.x, a.y);
    surface.line_to(b.x, b.y);
    surface.close_path();
    fill_then_stroke(surface, fill_color);
}

fn draw_raindrop(d: &ParticleData, surface: &mut dyn Surface) {
    let w = d.width.unwrap_or(5.0);
    let h = d.height.unwrap_or(15.0);
    let base = d.style.fill_color.as_deref().or(d.style.color.as_deref()).unwrap_or(crate::effects::RAIN_COLOR);

    surface.begin_path();
    surface.move_to(0.0, -h / 2.0);
    surface.quadratic_to(-w / 2.0, -h / 4.0, -w / 2.0, h / 4.0);
    surface.quadratic_to(-w / 4.0, h / 2.0, 0.0, h / 2.0);
    surface.quadratic_to(w / 4.0, h / 2.0, w / 2.0, h / 4.0);
    surface.quadratic_to(w / 2.0, -h / 4.0, 0.0, -h / 2.0);
    surface.close_path();

    surface.set_fill(&Paint::Radial {
        x0: -w / 4.0,
        y0: -h / 4.0,
        r0: 0.0,
        x1: 0.0,
        y1: 0.0,
        r1: w,
        stops: vec![
            (0.0, "rgba(255, 255, 255, 0.8)".to_string()),
            (0.3, base.to_string()),
            (1.0, "rgba(0, 0, 139, 0.9)".to_string()),
        ],
    });
    surface.fill();
    surface.set_stroke(&Paint::solid("rgba(0, 0, 139, 0.3)"));
    surface.set_line_width(0.5);
    surface.stroke();
}

fn spoke(surface: &mut dyn Surface, from: Point, angle: f64, length: f64) {
    surface.move_to(from.x, from.y);
    surface.line_to(from.x + angle.cos() * length, from.y + angle.sin() * length);
}

fn draw_snowflake(d: &ParticleData, surface: &mut dyn Surface) {
    let size = d.width.unwrap_or(8.0);
    let color = d.style.color.as_deref().unwrap_or(crate::effects::SNOW_COLOR);
    surface.set_stroke(&Paint::solid(color));
    surface.set_line_width(1.5);

    surface.begin_path();
    for arm in 0..6 {
        let angle = arm as f64 * PI / 3.0;
        spoke(surface, Point::ORIGIN, angle, size);
        for t in [0.3, 0.7] {
            let branch = Point::new(angle.cos() * size * t, angle.sin() * size * t);
            spoke(surface, branch, angle + FRAC_PI_4, size * 0.25);
            spoke(surface, branch, angle - FRAC_PI_4, size * 0.25);
        }
        let tip = Point::new(angle.cos() * size, angle.sin() * size);
        spoke(surface, tip, angle + FRAC_PI_2, size * 0.15);
        spoke(surface, tip, angle - FRAC_PI_2, size * 0.15);
    }
    surface.stroke();

    surface.begin_path();
    surface.arc(0.0, 0.0, size * 0.1, 0.0, TAU);
    surface.set_fill(&Paint::solid(color));
    surface.fill();
}

/// Outline of a flame at clock `time` (seconds × 3), flickering per vertex.
pub fn flame_outline(size: f64, time: f64) -> Vec<Point> {
    const STEPS: usize = 12;
    (0..=STEPS)
        .map(|i| {
            let angle = i as f64 / STEPS as f64 * PI;
            let radius = size * 0.4 + (time * 4.0 + i as f64).sin() * 8.0;
            Point::new(angle.sin() * radius, -angle.cos() * radius * 1.5)
        })
        .collect()
}

fn draw_flame(d: &ParticleData, surface: &mut dyn Surface, clock_ms: f64) {
    let size = d.width.unwrap_or(80.0);
    surface.save();
    if d.has_glow {
        surface.set_shadow(GLOW_COLOR, GLOW_BLUR);
    }
    surface.set_fill(&Paint::Linear {
        x0: 0.0,
        y0: size / 2.0,
        x1: 0.0,
        y1: -size / 2.0,
        stops: vec![
            (0.0, "#ff4500".to_string()),
            (0.3, "#ff6500".to_string()),
            (0.6, "#ffaa00".to_string()),
            (0.8, "#ffdd00".to_string()),
            (1.0, "#fff200".to_string()),
        ],
    });
    trace_points(surface, &flame_outline(size, clock_ms * 0.003));
    surface.close_path();
    surface.fill();

    surface.set_fill(&Paint::Radial {
        x0: 0.0,
        y0: 0.0,
        r0: 0.0,
        x1: 0.0,
        y1: 0.0,
        r1: size * 0.3,
        stops: vec![(0.0, "rgba(255, 255, 255, 0.8)".to_string()), (1.0, "rgba(255, 255, 255, 0)".to_string())],
    });
    surface.fill();
    surface.restore();
}

/// Selection chrome for `obj`, in frame space. Sizes are divided by `zoom`
/// so the handles keep a constant on-screen size.
pub fn draw_transform_handles(obj: &SceneObject, surface: &mut dyn Surface, zoom: f64, handle_size: f64, rotate_offset: f64) {
    let size = handle_size / zoom;
    surface.save();
    surface.scale(zoom, zoom);
    surface.set_stroke(&Paint::solid(HANDLE_STROKE));
    surface.set_line_width(2.0 / zoom);

    match HandleLayout::for_object(obj, rotate_offset / zoom) {
        HandleLayout::Line { start, end } => {
            surface.set_line_dash(&[8.0 / zoom, 4.0 / zoom]);
            surface.begin_path();
            surface.move_to(start.x, start.y);
            surface.line_to(end.x, end.y);
            surface.stroke();
            surface.set_line_dash(&[]);

            surface.set_fill(&Paint::solid(HANDLE_FILL));
            for p in [start, end] {
                surface.begin_path();
                surface.arc(p.x, p.y, size / 2.0, 0.0, TAU);
                surface.fill();
                surface.stroke();
            }
        }
        HandleLayout::Box { bounds, rotate } => {
            surface.set_line_dash(&[8.0 / zoom, 4.0 / zoom]);
            surface.begin_path();
            surface.rect(bounds.x, bounds.y, bounds.width, bounds.height);
            surface.stroke();
            surface.set_line_dash(&[]);

            surface.set_fill(&Paint::solid(HANDLE_FILL));
            for corner in HandleType::CORNERS {
                let c = bounds.corner(corner);
                surface.fill_rect(c.x - size / 2.0, c.y - size / 2.0, size, size);
                surface.begin_path();
                surface.rect(c.x - size / 2.0, c.y - size / 2.0, size, size);
                surface.stroke();
            }

            surface.begin_path();
            surface.move_to(rotate.x, bounds.y);
            surface.line_to(rotate.x, rotate.y);
            surface.stroke();

            surface.begin_path();
            surface.arc(rotate.x, rotate.y, size / 2.0, 0.0, TAU);
            surface.set_fill(&Paint::solid(ROTATE_FILL));
            surface.fill();
            surface.set_stroke(&Paint::solid(ROTATE_STROKE));
            surface.stroke();
        }
    }
    surface.restore();
}

/// Dashed outline of the shape being dragged out, in frame space.
pub fn draw_shape_preview(tool: Tool, start: Point, current: Point, surface: &mut dyn Surface, stroke: &str, line_width: f64) {
    let width = (current.x - start.x).abs();
    let height = (current.y - start.y).abs();
    let center = start.midpoint(current);
    let (left, right) = (start.x.min(current.x), start.x.max(current.x));
    let (top, bottom) = (start.y.min(current.y), start.y.max(current.y));

    surface.save();
    surface.set_stroke(&Paint::solid(stroke));
    surface.set_line_width(line_width);
    surface.set_line_dash(&[8.0, 4.0]);
    surface.set_global_alpha(PREVIEW_ALPHA);
    surface.set_round_caps();
    surface.begin_path();

    match tool {
        Tool::Line => {
            surface.move_to(start.x, start.y);
            surface.line_to(current.x, current.y);
        }
        Tool::Circle => surface.ellipse(center.x, center.y, width / 2.0, height / 2.0, 0.0, TAU),
        Tool::Semicircle => {
            surface.ellipse(center.x, center.y, width / 2.0, height / 2.0, 0.0, PI);
            surface.close_path();
        }
        Tool::Square => surface.rect(left, top, width, height),
        Tool::Triangle => {
            surface.move_to(center.x, top);
            surface.line_to(left, bottom);
            surface.line_to(right, bottom);
            surface.close_path();
        }
        Tool::Star => {
            let points = star_points(width / 2.0, height / 2.0);
            if let Some((first, rest)) = points.split_first() {
                surface.move_to(center.x + first.x, center.y + first.y);
                for p in rest {
                    surface.line_to(center.x + p.x, center.y + p.y);
                }
            }
            surface.close_path();
        }
        Tool::Arrow => {
            let (a, b) = arrow_head(start, current, PREVIEW_ARROW_HEAD);
            surface.move_to(start.x, start.y);
            surface.line_to(current.x, current.y);
            surface.move_to(current.x, current.y);
            surface.line_to(a.x, a.y);
            surface.move_to(current.x, current.y);
            surface.line_to(b.x, b.y);
        }
        _ => {}
    }
    surface.stroke();
    surface.restore();
}

impl AnimationEngine {
    pub fn draw_defaults(&self) -> DrawDefaults {
        DrawDefaults {
            color: self.brush.primary_color.clone(),
            line_width: self.brush.brush_size,
            clock_ms: self.clock_ms,
        }
    }

    fn live_background(&self, frame: &Frame) -> Option<String> {
        if !self.background_enabled {
            return None;
        }
        Some(frame.background_color.clone().unwrap_or_else(|| self.background_color.clone()))
    }

    /// Full redraw: both surfaces cleared, background, onion skin, current
    /// frame and in-progress stroke on `main`; shape preview and handles on
    /// `overlay`.
    pub fn redraw_to(&self, main: &mut dyn Surface, overlay: &mut dyn Surface) {
        let defaults = self.draw_defaults();
        let index = self.scene.current_frame;
        let frame = self.scene.current();

        main.reset_transform();
        main.clear();
        overlay.reset_transform();
        overlay.clear();

        if let Some(color) = self.live_background(frame) {
            main.set_fill(&Paint::solid(&color));
            main.fill_rect(0.0, 0.0, main.width(), main.height());
        }

        main.save();
        main.scale(self.zoom, self.zoom);
        if self.onion.enabled {
            let previous = (1..=self.onion.prev).filter_map(|i| index.checked_sub(i));
            let following = (1..=self.onion.next).map(|i| index + i);
            for neighbour in previous.chain(following) {
                if let Some(frame) = self.scene.frames.get(neighbour) {
                    draw_frame_objects(frame, main, self.onion.alpha, &defaults);
                }
            }
        }
        draw_frame_objects(frame, main, 1.0, &defaults);
        self.draw_stroke_in_progress(main);
        main.restore();

        if let DrawingState::Shape { tool, start, current } = &self.drawing {
            overlay.save();
            overlay.scale(self.zoom, self.zoom);
            draw_shape_preview(*tool, *start, *current, overlay, &self.brush.primary_color, self.brush.brush_size);
            overlay.restore();
        }

        if self.tool == Tool::Move {
            if let Some(obj) = self.scene.primary_object() {
                draw_transform_handles(obj, overlay, self.zoom, self.config.handle_size, self.config.rotate_handle_offset);
            }
        }
    }

    fn draw_stroke_in_progress(&self, surface: &mut dyn Surface) {
        let DrawingState::Stroke { eraser, points } = &self.drawing else {
            return;
        };
        if points.len() < 2 {
            return;
        }
        surface.save();
        if *eraser {
            surface.set_composite(CompositeOp::DestinationOut);
        } else {
            surface.set_stroke(&Paint::solid(&self.brush.primary_color));
            surface.set_global_alpha(self.brush.opacity);
        }
        surface.set_line_width(self.brush.brush_size);
        surface.set_round_caps();
        trace_points(surface, points);
        surface.stroke();
        surface.restore();
    }

    /// Exporter entry point: composites frame `index` onto `surface` exactly
    /// as the live view draws its objects.
    pub fn render_frame_to(&self, index: usize, surface: &mut dyn Surface) -> EngineResult<()> {
        let frame = self.scene.frames.get(index).ok_or(EngineError::FrameOutOfRange(index))?;
        let background = self.live_background(frame).unwrap_or_else(|| EXPORT_BACKGROUND.to_string());
        render_frame_to_surface(frame, Some(&background), surface, &self.draw_defaults());
        Ok(())
    }
}
