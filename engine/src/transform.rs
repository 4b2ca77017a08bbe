use kurbo::{Point, Vec2};

use crate::geometry::Bounds;
use crate::objects::{SceneObject, Shape};
use crate::types::HandleType;

/// Where the handles of an object sit, in frame coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum HandleLayout {
    /// Line objects: one handle per endpoint.
    Line { start: Point, end: Point },
    /// Everything else: rotate knob above the box plus four corners.
    Box { bounds: Bounds, rotate: Point },
}

impl HandleLayout {
    pub fn for_object(obj: &SceneObject, rotate_offset: f64) -> HandleLayout {
        match &obj.shape {
            Shape::Line(d) => HandleLayout::Line {
                start: obj.pivot() + d.start().to_vec2(),
                end: obj.pivot() + d.end().to_vec2(),
            },
            _ => {
                let bounds = obj.get_object_bounds();
                let rotate = Point::new(bounds.x + bounds.width / 2.0, bounds.y - rotate_offset);
                HandleLayout::Box { bounds, rotate }
            }
        }
    }

    /// Box test against every handle: |dx| < radius and |dy| < radius.
    /// The rotate knob wins over the corners.
    pub fn hit(&self, p: Point, radius: f64) -> Option<HandleType> {
        let near = |h: Point| (p.x - h.x).abs() < radius && (p.y - h.y).abs() < radius;
        match self {
            HandleLayout::Line { start, end } => {
                if near(*start) {
                    Some(HandleType::LineStart)
                } else if near(*end) {
                    Some(HandleType::LineEnd)
                } else {
                    None
                }
            }
            HandleLayout::Box { bounds, rotate } => {
                if near(*rotate) {
                    return Some(HandleType::Rotate);
                }
                HandleType::CORNERS.into_iter().find(|&c| near(bounds.corner(c)))
            }
        }
    }
}

/// Groups rotate around their bounds centre, everything else around its
/// pivot.
pub fn rotation_center(obj: &SceneObject) -> Point {
    if obj.is_group() {
        obj.get_object_bounds().center()
    } else {
        obj.pivot()
    }
}

/// New width/height for a corner drag. The opposite corner stays put.
pub fn resize_extent(handle: HandleType, initial: &Bounds, delta: Vec2, min_size: f64) -> (f64, f64) {
    let (w, h) = match handle {
        HandleType::BottomRight => (initial.width + delta.x, initial.height + delta.y),
        HandleType::BottomLeft => (initial.width - delta.x, initial.height + delta.y),
        HandleType::TopRight => (initial.width + delta.x, initial.height - delta.y),
        HandleType::TopLeft => (initial.width - delta.x, initial.height - delta.y),
        _ => (initial.width, initial.height),
    };
    (w.max(min_size), h.max(min_size))
}

#[derive(Clone, Debug, PartialEq, Default)]
pub enum TransformState {
    #[default]
    Idle,
    Moving { last: Point },
    Resizing { handle: HandleType, start: Point, initial: Bounds },
    Rotating { center: Point, last_angle: f64 },
    LineEndpointDrag { handle: HandleType, last: Point },
}

/// Outcome of a finished gesture.
#[derive(Clone, Debug, PartialEq)]
pub struct Commit {
    pub target: u32,
    pub changed: bool,
}

/// The single active transform gesture, if any.
#[derive(Clone, Debug, Default)]
pub struct TransformEngine {
    state: TransformState,
    target: Option<u32>,
    original: Option<SceneObject>,
    changed: bool,
}

impl TransformEngine {
    pub fn state(&self) -> &TransformState {
        &self.state
    }

    pub fn target(&self) -> Option<u32> {
        self.target
    }

    pub fn is_active(&self) -> bool {
        self.state != TransformState::Idle
    }

    /// Starts a gesture on `obj`. `handle` is the handle under the pointer,
    /// `None` for a plain move.
    pub fn begin(&mut self, obj: &SceneObject, handle: Option<HandleType>, p: Point) {
        self.state = match handle {
            None => TransformState::Moving { last: p },
            Some(HandleType::Rotate) => {
                let center = rotation_center(obj);
                TransformState::Rotating { center, last_angle: (p - center).atan2() }
            }
            Some(h @ (HandleType::LineStart | HandleType::LineEnd)) => TransformState::LineEndpointDrag { handle: h, last: p },
            Some(corner) => TransformState::Resizing { handle: corner, start: p, initial: obj.get_object_bounds() },
        };
        log::debug!("begin {:?} on {}", self.state, obj.id);
        self.target = Some(obj.id);
        self.original = Some(obj.clone());
        self.changed = false;
    }

    /// Applies the pointer motion to `obj`. Returns true if geometry moved.
    pub fn drag(&mut self, obj: &mut SceneObject, p: Point, min_size: f64) -> bool {
        if self.target != Some(obj.id) {
            return false;
        }
        let changed = match &mut self.state {
            TransformState::Idle => false,
            TransformState::Moving { last } => {
                let delta = p - *last;
                *last = p;
                if delta == Vec2::ZERO {
                    false
                } else {
                    obj.translate(delta);
                    true
                }
            }
            TransformState::Rotating { center, last_angle } => {
                let angle = (p - *center).atan2();
                let delta = angle - *last_angle;
                *last_angle = angle;
                if delta == 0.0 {
                    false
                } else {
                    obj.rotate_by(delta, *center);
                    true
                }
            }
            TransformState::LineEndpointDrag { handle, last } => {
                let delta = p - *last;
                *last = p;
                match &mut obj.shape {
                    Shape::Line(d) if delta != Vec2::ZERO => {
                        if *handle == HandleType::LineStart {
                            d.start_x += delta.x;
                            d.start_y += delta.y;
                        } else {
                            d.end_x += delta.x;
                            d.end_y += delta.y;
                        }
                        true
                    }
                    _ => false,
                }
            }
            TransformState::Resizing { handle, start, initial } => {
                let (w, h) = resize_extent(*handle, initial, p - *start, min_size);
                if obj.shape.extent().is_none() {
                    log::debug!("{} {} has no box to resize", obj.kind_name(), obj.id);
                    false
                } else {
                    let before = obj.shape.extent();
                    obj.shape.set_size(w, h);
                    obj.shape.extent() != before
                }
            }
        };
        self.changed |= changed;
        changed
    }

    /// Ends the gesture and reports whether it changed anything.
    pub fn finish(&mut self) -> Option<Commit> {
        let target = self.target.take()?;
        let commit = Commit { target, changed: self.changed };
        log::debug!("commit {:?}", commit);
        self.reset();
        Some(commit)
    }

    /// Aborts the gesture, handing back the object as it was when the
    /// gesture started.
    pub fn cancel(&mut self) -> Option<SceneObject> {
        let original = self.original.take();
        self.target = None;
        self.reset();
        original
    }

    fn reset(&mut self) {
        self.state = TransformState::Idle;
        self.original = None;
        self.changed = false;
    }
}
