use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Distance under which a point counts as touching an open path.
pub const PATH_HIT_TOLERANCE: f64 = 10.0;

/// Axis-aligned box in frame coordinates.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Default)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Bounds { x, y, width, height }
    }

    /// Box of the given size centred on `center`.
    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        Bounds { x: center.x - width / 2.0, y: center.y - height / 2.0, width, height }
    }

    pub fn from_rect(rect: Rect) -> Self {
        Bounds { x: rect.x0, y: rect.y0, width: rect.width(), height: rect.height() }
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive containment, matching the hit test of the drawing surface.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds::from_rect(self.to_rect().union(other.to_rect()))
    }

    pub fn translate(&self, offset: Vec2) -> Bounds {
        Bounds { x: self.x + offset.x, y: self.y + offset.y, ..*self }
    }

    pub fn corner(&self, handle: crate::types::HandleType) -> Point {
        use crate::types::HandleType::*;
        match handle {
            TopLeft => Point::new(self.x, self.y),
            TopRight => Point::new(self.x + self.width, self.y),
            BottomRight => Point::new(self.x + self.width, self.y + self.height),
            BottomLeft => Point::new(self.x, self.y + self.height),
            _ => self.center(),
        }
    }
}

/// Min/max box over `points`, grown by `padding` on every side.
pub fn points_bounds(points: &[Point], padding: f64) -> Option<Bounds> {
    let first = points.first()?;
    let mut rect = Rect::from_points(*first, *first);
    for p in &points[1..] {
        rect = rect.union_pt(*p);
    }
    Some(Bounds::from_rect(rect.inflate(padding, padding)))
}

pub fn distance_to_line_segment(px: f64, py: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let a = px - x1;
    let b = py - y1;
    let c = x2 - x1;
    let d = y2 - y1;
    let dot = a * c + b * d;
    let len_sq = c * c + d * d;

    if len_sq == 0.0 {
        return (a * a + b * b).sqrt();
    }

    let param = (dot / len_sq).clamp(0.0, 1.0);
    let xx = x1 + param * c;
    let yy = y1 + param * d;
    let dx = px - xx;
    let dy = py - yy;
    (dx * dx + dy * dy).sqrt()
}

/// Open paths (or fewer than three points) hit within a tolerance of any
/// segment; closed paths use even-odd ray casting.
pub fn is_point_in_path(x: f64, y: f64, points: &[Point], closed: bool) -> bool {
    if !closed || points.len() < 3 {
        return points.windows(2).any(|seg| {
            distance_to_line_segment(x, y, seg[0].x, seg[0].y, seg[1].x, seg[1].y) < PATH_HIT_TOLERANCE
        });
    }

    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (pi, pj) = (points[i], points[j]);
        if (pi.y > y) != (pj.y > y) && x < (pj.x - pi.x) * (y - pi.y) / (pj.y - pi.y) + pi.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Revolves `p` around `center` by `angle` radians.
pub fn rotate_about(p: Point, center: Point, angle: f64) -> Point {
    let offset = p - center;
    let distance = offset.hypot();
    let theta = offset.atan2() + angle;
    center + Vec2::from_angle(theta) * distance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_distance_clamps_to_endpoints() {
        assert_eq!(distance_to_line_segment(5.0, 3.0, 0.0, 0.0, 10.0, 0.0), 3.0);
        assert_eq!(distance_to_line_segment(-3.0, 4.0, 0.0, 0.0, 10.0, 0.0), 5.0);
        assert_eq!(distance_to_line_segment(13.0, 4.0, 0.0, 0.0, 10.0, 0.0), 5.0);
    }

    #[test]
    fn degenerate_segment_is_point_distance() {
        assert_eq!(distance_to_line_segment(3.0, 4.0, 0.0, 0.0, 0.0, 0.0), 5.0);
    }

    #[test]
    fn open_path_uses_tolerance() {
        let pts = [Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        assert!(is_point_in_path(50.0, 9.0, &pts, false));
        assert!(!is_point_in_path(50.0, 10.0, &pts, false));
    }

    #[test]
    fn closed_path_ray_casting() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ];
        assert!(is_point_in_path(50.0, 50.0, &square, true));
        assert!(!is_point_in_path(150.0, 50.0, &square, true));
        // fewer than three points falls back to the segment test
        assert!(is_point_in_path(50.0, 5.0, &square[..2], true));
    }

    #[test]
    fn rotate_about_quarter_turn() {
        let p = rotate_about(Point::new(10.0, 0.0), Point::ZERO, std::f64::consts::FRAC_PI_2);
        assert!((p.x - 0.0).abs() < 1e-9);
        assert!((p.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn points_bounds_pads() {
        let b = points_bounds(&[Point::new(0.0, 0.0), Point::new(10.0, 20.0)], 2.5).unwrap();
        assert_eq!(b, Bounds::new(-2.5, -2.5, 15.0, 25.0));
        assert!(points_bounds(&[], 1.0).is_none());
    }
}
