use kurbo::{Point, Rect};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::config::BrushConfig;
use crate::engine::AnimationEngine;
use crate::objects::{BoxData, EllipseData, LineData, PathData, Shape, Style, TextData};
use crate::transform::HandleLayout;
use crate::types::{HandleType, Modifiers, PointerButton, Tool};

/// Drags shorter than this do not create a shape.
pub const MIN_SHAPE_DRAG: f64 = 10.0;
/// Pencil strokes ending this close to their start are closed...
pub const CLOSE_DISTANCE: f64 = 20.0;
/// ...provided they have more than this many points.
pub const CLOSE_MIN_POINTS: usize = 10;
/// Factor used by the zoom-in and zoom-out tools.
pub const TOOL_ZOOM_FACTOR: f64 = 1.5;
/// Margin kept around the canvas by zoom-to-fit.
pub const FIT_PADDING: f64 = 80.0;

/// In-progress drawing gesture (shape drag, freehand stroke or pan).
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DrawingState {
    #[default]
    Idle,
    Shape { tool: Tool, start: Point, current: Point },
    Stroke { eraser: bool, points: Vec<Point> },
    /// `last` is in surface pixels.
    Panning { last: Point },
}

/// What a key press did, for the host to react to.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum KeyOutcome {
    Ignored,
    Redraw,
    SaveRequested,
    NewRequested,
}

/// Shape committed by a drag from `start` to `end` with a shape tool.
/// Returns the pivot (drag centre) and payload, or `None` for non-shape
/// tools.
pub fn shape_from_drag(tool: Tool, start: Point, end: Point, brush: &BrushConfig) -> Option<(Point, Shape)> {
    let width = (end.x - start.x).abs();
    let height = (end.y - start.y).abs();
    let center = start.midpoint(end);
    let distance = start.distance(end);
    let style = Style::stroked(&brush.primary_color, &brush.secondary_color, brush.brush_size);
    let (w, h) = (Some(width.max(MIN_SHAPE_DRAG)), Some(height.max(MIN_SHAPE_DRAG)));

    let ellipse = || EllipseData { width: w, height: h, radius: Some(distance / 2.0), radius_x: None, radius_y: None, style: style.clone() };
    let boxed = || BoxData { width: w, height: h, style: style.clone() };

    let shape = match tool {
        Tool::Line => Shape::Line(LineData {
            start_x: start.x - center.x,
            start_y: start.y - center.y,
            end_x: end.x - center.x,
            end_y: end.y - center.y,
            width: w,
            height: h,
            style: style.clone(),
        }),
        Tool::Circle => Shape::Circle(ellipse()),
        Tool::Semicircle => Shape::Semicircle(ellipse()),
        Tool::Star => Shape::Star(ellipse()),
        Tool::Square => Shape::Square(boxed()),
        Tool::Triangle => Shape::Triangle(boxed()),
        Tool::Arrow => Shape::Arrow(boxed()),
        _ => return None,
    };
    Some((center, shape))
}

/// Turns raw stroke points (frame coordinates) into a path object centred
/// on the stroke's bounding box. Pencil strokes that end near their start
/// are closed.
pub fn stroke_to_path(points: &[Point], eraser: bool, brush: &BrushConfig) -> Option<(Point, Shape)> {
    let first = *points.first()?;
    let last = *points.last()?;
    let bbox = points.iter().fold(Rect::from_points(first, first), |r, p| r.union_pt(*p));
    let pivot = bbox.center();
    let local = points.iter().map(|p| *p - pivot.to_vec2()).collect();

    if eraser {
        let data = PathData {
            points: local,
            closed: false,
            style: Style { color: None, fill_color: None, line_width: Some(brush.brush_size) },
        };
        return Some((pivot, Shape::EraserPath(data)));
    }
    let closed = first.distance(last) < CLOSE_DISTANCE && points.len() > CLOSE_MIN_POINTS;
    let data = PathData {
        points: local,
        closed,
        style: Style { color: Some(brush.primary_color.clone()), fill_color: None, line_width: Some(brush.brush_size) },
    };
    Some((pivot, Shape::Path(data)))
}

fn resize_cursor(handle: HandleType) -> &'static str {
    match handle {
        HandleType::TopLeft | HandleType::BottomRight => "nwse-resize",
        HandleType::TopRight | HandleType::BottomLeft => "nesw-resize",
        HandleType::Rotate => "grab",
        HandleType::LineStart | HandleType::LineEnd => "crosshair",
    }
}

impl AnimationEngine {
    pub fn drawing(&self) -> &DrawingState {
        &self.drawing
    }

    pub fn to_frame_space(&self, screen: Point) -> Point {
        Point::new(screen.x / self.zoom, screen.y / self.zoom)
    }

    fn clamp_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.config.zoom_min, self.config.zoom_max);
    }

    /// Handle of the primary selection under `pos` (frame space), using the
    /// given screen-space radius.
    pub fn handle_at(&self, pos: Point, screen_radius: f64) -> Option<HandleType> {
        let obj = self.scene.primary_object()?;
        let layout = HandleLayout::for_object(obj, self.config.rotate_handle_offset / self.zoom);
        layout.hit(pos, screen_radius / self.zoom)
    }

    pub fn handle_pointer_down(&mut self, screen: Point, button: PointerButton, mods: Modifiers) -> bool {
        if button == PointerButton::Middle {
            self.drawing = DrawingState::Panning { last: screen };
            return false;
        }
        let pos = self.to_frame_space(screen);

        match self.tool {
            Tool::ZoomIn => {
                self.clamp_zoom(self.zoom * TOOL_ZOOM_FACTOR);
                true
            }
            Tool::ZoomOut => {
                self.clamp_zoom(self.zoom / TOOL_ZOOM_FACTOR);
                true
            }
            Tool::ZoomReset => {
                self.zoom = 1.0;
                true
            }
            Tool::FloodFill => self.flood_fill_at(pos, button),
            Tool::Move | Tool::Bone => {
                if self.tool == Tool::Move && !mods.shift {
                    if let Some(handle) = self.handle_at(pos, self.config.handle_hit_radius) {
                        if let Some(obj) = self.scene.primary_object() {
                            let obj = obj.clone();
                            self.transform.begin(&obj, Some(handle), pos);
                            return true;
                        }
                    }
                }
                match self.scene.find_object_at_position(pos) {
                    Some(id) if mods.shift => self.scene.selection.toggle(id),
                    Some(id) => {
                        self.scene.selection.select_only(id);
                        if self.tool == Tool::Move {
                            if let Some(obj) = self.scene.object(id).cloned() {
                                self.transform.begin(&obj, None, pos);
                            }
                        }
                    }
                    None if mods.shift => {}
                    None => self.scene.selection.clear(),
                }
                true
            }
            Tool::Pencil | Tool::Eraser => {
                self.drawing = DrawingState::Stroke { eraser: self.tool == Tool::Eraser, points: vec![pos] };
                true
            }
            Tool::Text => false,
            tool => {
                self.drawing = DrawingState::Shape { tool, start: pos, current: pos };
                true
            }
        }
    }

    fn flood_fill_at(&mut self, pos: Point, button: PointerButton) -> bool {
        let Some(id) = self.scene.find_object_at_position(pos) else {
            return false;
        };
        let (color, fill) = if button == PointerButton::Secondary {
            (self.brush.secondary_color.clone(), true)
        } else {
            (self.brush.primary_color.clone(), false)
        };
        match self.scene.recolor(id, &color, fill) {
            Ok(true) => {
                self.save_state("Fill");
                true
            }
            _ => false,
        }
    }

    pub fn handle_pointer_move(&mut self, screen: Point) -> bool {
        let pos = self.to_frame_space(screen);
        if let DrawingState::Panning { last } = &mut self.drawing {
            self.pan += screen - *last;
            *last = screen;
            return true;
        }
        if let Some(target) = self.transform.target() {
            let min = self.config.min_resize;
            return match self.scene.current_mut().get_mut(target) {
                Some(obj) => self.transform.drag(obj, pos, min),
                None => false,
            };
        }
        match &mut self.drawing {
            DrawingState::Stroke { points, .. } => {
                points.push(pos);
                true
            }
            DrawingState::Shape { current, .. } => {
                *current = pos;
                true
            }
            _ => false,
        }
    }

    pub fn handle_pointer_up(&mut self, screen: Point) -> bool {
        let pos = self.to_frame_space(screen);
        if let Some(commit) = self.transform.finish() {
            if commit.changed {
                self.save_state("Transform");
            }
            return true;
        }

        match std::mem::take(&mut self.drawing) {
            DrawingState::Shape { tool, start, .. } => {
                if start.distance(pos) <= MIN_SHAPE_DRAG {
                    return true;
                }
                if let Some((center, shape)) = shape_from_drag(tool, start, pos, &self.brush) {
                    let label = format!("Add {}", shape.kind_name());
                    self.create_object(center.x, center.y, shape);
                    self.save_state(&label);
                }
                true
            }
            DrawingState::Stroke { eraser, points } => {
                if eraser && points.len() < 2 {
                    return true;
                }
                if let Some((pivot, shape)) = stroke_to_path(&points, eraser, &self.brush) {
                    let label = if eraser { "Erase" } else { "Draw Path" };
                    let id = self.create_object(pivot.x, pivot.y, shape);
                    if !eraser {
                        if let Some(obj) = self.scene.object_mut(id) {
                            obj.opacity = self.brush.opacity;
                        }
                    }
                    self.save_state(label);
                }
                true
            }
            DrawingState::Panning { .. } | DrawingState::Idle => false,
        }
    }

    /// Wheel zoom: up zooms in one step, down zooms out.
    pub fn handle_wheel(&mut self, delta_y: f64, _mods: Modifiers) -> bool {
        let step = if delta_y < 0.0 { self.config.zoom_step } else { -self.config.zoom_step };
        let before = self.zoom;
        self.clamp_zoom(self.zoom + step);
        self.zoom != before
    }

    pub fn handle_key(&mut self, key: &str, mods: Modifiers) -> KeyOutcome {
        let lower = key.to_ascii_lowercase();
        if mods.command() {
            return match lower.as_str() {
                "z" if mods.shift => self.redo_outcome(),
                "z" => {
                    if self.undo() { KeyOutcome::Redraw } else { KeyOutcome::Ignored }
                }
                "y" => self.redo_outcome(),
                "c" => match self.scene.selection.primary() {
                    Some(id) => {
                        if let Err(e) = self.scene.copy_object(id) {
                            log::warn!("copy of {} failed: {}", id, e);
                        }
                        KeyOutcome::Ignored
                    }
                    None => KeyOutcome::Ignored,
                },
                "v" => match self.scene.paste_object() {
                    Some(_) => {
                        self.save_state("Paste");
                        KeyOutcome::Redraw
                    }
                    None => KeyOutcome::Ignored,
                },
                "s" => KeyOutcome::SaveRequested,
                "n" => KeyOutcome::NewRequested,
                _ => KeyOutcome::Ignored,
            };
        }

        match key {
            "Delete" | "Backspace" => {
                if self.delete_selected() > 0 { KeyOutcome::Redraw } else { KeyOutcome::Ignored }
            }
            " " => {
                self.playback.toggle();
                KeyOutcome::Redraw
            }
            "ArrowLeft" => {
                let index = self.scene.previous_frame_index();
                if self.go_to_frame(index).is_ok() { KeyOutcome::Redraw } else { KeyOutcome::Ignored }
            }
            "ArrowRight" => {
                let index = self.scene.next_frame_index();
                if self.go_to_frame(index).is_ok() { KeyOutcome::Redraw } else { KeyOutcome::Ignored }
            }
            "Escape" => {
                if let Some(original) = self.transform.cancel() {
                    self.replace_object(original);
                }
                self.drawing = DrawingState::Idle;
                KeyOutcome::Redraw
            }
            _ => KeyOutcome::Ignored,
        }
    }

    fn redo_outcome(&mut self) -> KeyOutcome {
        if self.redo() { KeyOutcome::Redraw } else { KeyOutcome::Ignored }
    }

    /// Places a text object at `(x, y)` in frame space, sized from the
    /// current font.
    pub fn place_text(&mut self, pos: Point, text: &str) -> Option<u32> {
        if text.is_empty() {
            return None;
        }
        let size = self.brush.font_size;
        let shape = Shape::Text(TextData {
            text: text.to_string(),
            font_size: Some(size),
            font_family: Some(self.brush.font_family.clone()),
            width: Some(text.chars().count() as f64 * size * 0.6),
            height: Some(size),
            style: Style { color: Some(self.brush.primary_color.clone()), fill_color: None, line_width: None },
        });
        let id = self.create_object(pos.x, pos.y, shape);
        self.save_state("Add text");
        Some(id)
    }

    pub fn cursor_at(&self, pos: Point) -> &'static str {
        match self.tool {
            Tool::Move => {}
            Tool::Bone => return "grab",
            Tool::ZoomIn => return "zoom-in",
            Tool::ZoomOut => return "zoom-out",
            Tool::Text => return "text",
            _ => return "crosshair",
        }
        if let Some(handle) = self.handle_at(pos, self.config.hover_hit_radius) {
            return resize_cursor(handle);
        }
        match self.scene.primary_object() {
            Some(obj) if obj.hit_test(pos) => "move",
            _ => "default",
        }
    }
}

#[wasm_bindgen]
impl AnimationEngine {
    pub fn on_pointer_down(&mut self, x: f64, y: f64, button: u8, shift: bool, ctrl: bool, meta: bool) -> bool {
        self.handle_pointer_down(Point::new(x, y), PointerButton::from_index(button), Modifiers { shift, ctrl, meta })
    }

    pub fn on_pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.handle_pointer_move(Point::new(x, y))
    }

    pub fn on_pointer_up(&mut self, x: f64, y: f64) -> bool {
        self.handle_pointer_up(Point::new(x, y))
    }

    pub fn on_wheel(&mut self, delta_y: f64, shift: bool, ctrl: bool, meta: bool) -> bool {
        self.handle_wheel(delta_y, Modifiers { shift, ctrl, meta })
    }

    /// Returns the outcome name ("ignored", "redraw", "saveRequested",
    /// "newRequested").
    pub fn on_key(&mut self, key: &str, shift: bool, ctrl: bool, meta: bool) -> String {
        let outcome = self.handle_key(key, Modifiers { shift, ctrl, meta });
        serde_json::to_value(outcome)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    /// Text placement after the host has prompted for the string. `x, y`
    /// are surface pixels.
    pub fn add_text(&mut self, x: f64, y: f64, text: &str) -> Option<u32> {
        let pos = self.to_frame_space(Point::new(x, y));
        self.place_text(pos, text)
    }

    pub fn get_cursor(&self, x: f64, y: f64) -> String {
        self.cursor_at(self.to_frame_space(Point::new(x, y))).to_string()
    }

    pub fn zoom_in(&mut self) {
        self.clamp_zoom(self.zoom + self.config.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.clamp_zoom(self.zoom - self.config.zoom_step);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.clamp_zoom(zoom);
    }

    /// Fits the canvas into a container of the given size, never zooming
    /// past 1.
    pub fn reset_zoom_to_fit(&mut self, container_width: f64, container_height: f64) -> f64 {
        let sx = (container_width - FIT_PADDING) / self.config.canvas_width;
        let sy = (container_height - FIT_PADDING) / self.config.canvas_height;
        self.clamp_zoom(sx.min(sy).min(1.0));
        self.zoom
    }

    pub fn get_pan_x(&self) -> f64 {
        self.pan.x
    }

    pub fn get_pan_y(&self) -> f64 {
        self.pan.y
    }
}
