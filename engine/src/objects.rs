use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

use crate::effects::EffectParams;
use crate::geometry::{self, Bounds};

/// Width/height used when a payload carries none.
pub const DEFAULT_EXTENT: f64 = 50.0;
/// Stroke width assumed for bounds padding when a payload carries none.
pub const DEFAULT_LINE_WIDTH: f64 = 5.0;

/// Missing, zero or negative extents fall back to `DEFAULT_EXTENT`.
pub fn extent_or_default(v: Option<f64>) -> f64 {
    v.filter(|v| *v > 0.0).unwrap_or(DEFAULT_EXTENT)
}

fn default_one() -> f64 { 1.0 }
fn default_true() -> bool { true }

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
}

impl Style {
    pub fn stroked(color: &str, fill: &str, line_width: f64) -> Self {
        Style {
            color: Some(color.to_string()),
            fill_color: Some(fill.to_string()),
            line_width: Some(line_width),
        }
    }
}

/// Plain centred box: squares, triangles, arrows, fills, dots.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BoxData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(flatten)]
    pub style: Style,
}

/// Circles, semicircles and stars. `radius_x`/`radius_y` win over
/// width/height once a resize has stretched the shape.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EllipseData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_y: Option<f64>,
    #[serde(flatten)]
    pub style: Style,
}

impl EllipseData {
    pub fn radii(&self) -> (f64, f64) {
        let w = extent_or_default(self.width);
        let h = extent_or_default(self.height);
        (self.radius_x.unwrap_or(w / 2.0), self.radius_y.unwrap_or(h / 2.0))
    }
}

/// Endpoints are relative to the object's pivot.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LineData {
    #[serde(default)]
    pub start_x: f64,
    #[serde(default)]
    pub start_y: f64,
    #[serde(default)]
    pub end_x: f64,
    #[serde(default)]
    pub end_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(flatten)]
    pub style: Style,
}

impl LineData {
    pub fn start(&self) -> Point { Point::new(self.start_x, self.start_y) }
    pub fn end(&self) -> Point { Point::new(self.end_x, self.end_y) }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TextData {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(flatten)]
    pub style: Style,
}

/// Freehand strokes. Points are relative to the object's pivot.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PathData {
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(default)]
    pub closed: bool,
    #[serde(flatten)]
    pub style: Style,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GroupData {
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    #[serde(default)]
    pub expanded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<EffectParams>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    #[serde(default)]
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default)]
    pub has_glow: bool,
    #[serde(default)]
    pub is_animated: bool,
}

/// Generated effect particles (raindrop, snowflake, flame).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ParticleData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default)]
    pub has_glow: bool,
    #[serde(flatten)]
    pub style: Style,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Shape {
    Line(LineData),
    Circle(EllipseData),
    Semicircle(EllipseData),
    Square(BoxData),
    Triangle(BoxData),
    Star(EllipseData),
    Arrow(BoxData),
    Text(TextData),
    Path(PathData),
    EraserPath(PathData),
    Pencil(BoxData),
    Eraser(BoxData),
    #[serde(rename = "flood-fill")]
    FloodFill(BoxData),
    Group(GroupData),
    Image(ImageData),
    Raindrop(ParticleData),
    Snowflake(ParticleData),
    Flame(ParticleData),
    Bone(LineData),
}

impl Shape {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Line(_) => "line",
            Shape::Circle(_) => "circle",
            Shape::Semicircle(_) => "semicircle",
            Shape::Square(_) => "square",
            Shape::Triangle(_) => "triangle",
            Shape::Star(_) => "star",
            Shape::Arrow(_) => "arrow",
            Shape::Text(_) => "text",
            Shape::Path(_) => "path",
            Shape::EraserPath(_) => "eraserPath",
            Shape::Pencil(_) => "pencil",
            Shape::Eraser(_) => "eraser",
            Shape::FloodFill(_) => "flood-fill",
            Shape::Group(_) => "group",
            Shape::Image(_) => "image",
            Shape::Raindrop(_) => "raindrop",
            Shape::Snowflake(_) => "snowflake",
            Shape::Flame(_) => "flame",
            Shape::Bone(_) => "bone",
        }
    }

    pub fn style(&self) -> Option<&Style> {
        match self {
            Shape::Line(d) | Shape::Bone(d) => Some(&d.style),
            Shape::Circle(d) | Shape::Semicircle(d) | Shape::Star(d) => Some(&d.style),
            Shape::Square(d) | Shape::Triangle(d) | Shape::Arrow(d) | Shape::Pencil(d) | Shape::Eraser(d) | Shape::FloodFill(d) => Some(&d.style),
            Shape::Text(d) => Some(&d.style),
            Shape::Path(d) | Shape::EraserPath(d) => Some(&d.style),
            Shape::Raindrop(d) | Shape::Snowflake(d) | Shape::Flame(d) => Some(&d.style),
            Shape::Group(_) | Shape::Image(_) => None,
        }
    }

    pub fn style_mut(&mut self) -> Option<&mut Style> {
        match self {
            Shape::Line(d) | Shape::Bone(d) => Some(&mut d.style),
            Shape::Circle(d) | Shape::Semicircle(d) | Shape::Star(d) => Some(&mut d.style),
            Shape::Square(d) | Shape::Triangle(d) | Shape::Arrow(d) | Shape::Pencil(d) | Shape::Eraser(d) | Shape::FloodFill(d) => Some(&mut d.style),
            Shape::Text(d) => Some(&mut d.style),
            Shape::Path(d) | Shape::EraserPath(d) => Some(&mut d.style),
            Shape::Raindrop(d) | Shape::Snowflake(d) | Shape::Flame(d) => Some(&mut d.style),
            Shape::Group(_) | Shape::Image(_) => None,
        }
    }

    /// Stored width/height, if this kind is sized by a box.
    pub fn extent(&self) -> Option<(Option<f64>, Option<f64>)> {
        match self {
            Shape::Circle(d) | Shape::Semicircle(d) | Shape::Star(d) => Some((d.width, d.height)),
            Shape::Square(d) | Shape::Triangle(d) | Shape::Arrow(d) | Shape::Pencil(d) | Shape::Eraser(d) | Shape::FloodFill(d) => Some((d.width, d.height)),
            Shape::Text(d) => Some((d.width, d.height)),
            Shape::Image(d) => Some((d.width, d.height)),
            Shape::Raindrop(d) | Shape::Snowflake(d) | Shape::Flame(d) => Some((d.width, d.height)),
            Shape::Line(_) | Shape::Bone(_) | Shape::Path(_) | Shape::EraserPath(_) | Shape::Group(_) => None,
        }
    }

    /// Sets width/height on box-sized kinds. Ellipse kinds also take the
    /// matching radii so the drawn shape stretches. Returns false for kinds
    /// whose geometry is not a box.
    pub fn set_size(&mut self, width: f64, height: f64) -> bool {
        match self {
            Shape::Circle(d) | Shape::Semicircle(d) | Shape::Star(d) => {
                d.width = Some(width);
                d.height = Some(height);
                d.radius_x = Some(width / 2.0);
                d.radius_y = Some(height / 2.0);
            }
            Shape::Square(d) | Shape::Triangle(d) | Shape::Arrow(d) | Shape::Pencil(d) | Shape::Eraser(d) | Shape::FloodFill(d) => {
                d.width = Some(width);
                d.height = Some(height);
            }
            Shape::Text(d) => {
                d.width = Some(width);
                d.height = Some(height);
            }
            Shape::Image(d) => {
                d.width = Some(width);
                d.height = Some(height);
            }
            Shape::Raindrop(d) | Shape::Snowflake(d) | Shape::Flame(d) => {
                d.width = Some(width);
                d.height = Some(height);
            }
            Shape::Line(_) | Shape::Bone(_) | Shape::Path(_) | Shape::EraserPath(_) | Shape::Group(_) => return false,
        }
        true
    }

    pub fn is_path(&self) -> bool {
        matches!(self, Shape::Path(_) | Shape::EraserPath(_))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SceneObject {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub rotation: f64, // radians
    #[serde(default = "default_one")]
    pub scale_x: f64,
    #[serde(default = "default_one")]
    pub scale_y: f64,
    #[serde(default = "default_one")]
    pub opacity: f64,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub is_mask: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub shape: Shape,
}

impl SceneObject {
    pub fn new(id: u32, x: f64, y: f64, shape: Shape) -> Self {
        SceneObject {
            id,
            x,
            y,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 1.0,
            visible: true,
            is_mask: false,
            name: None,
            shape,
        }
    }

    pub fn pivot(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn kind_name(&self) -> &'static str {
        self.shape.kind_name()
    }

    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("{} {}", self.kind_name(), self.id),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.shape, Shape::Group(_))
    }

    pub fn children(&self) -> Option<&[SceneObject]> {
        match &self.shape {
            Shape::Group(g) => Some(&g.objects),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<SceneObject>> {
        match &mut self.shape {
            Shape::Group(g) => Some(&mut g.objects),
            _ => None,
        }
    }

    pub fn effect(&self) -> Option<&EffectParams> {
        match &self.shape {
            Shape::Group(g) => g.effect.as_ref(),
            _ => None,
        }
    }

    /// Axis-aligned box in frame coordinates. Rotation and scale are not
    /// taken into account.
    pub fn get_object_bounds(&self) -> Bounds {
        let pivot = self.pivot();
        match &self.shape {
            Shape::Group(g) => {
                let mut children = g.objects.iter().map(SceneObject::get_object_bounds);
                match children.next() {
                    Some(first) => children
                        .fold(first, |acc, b| acc.union(&b))
                        .translate(pivot.to_vec2()),
                    None => Bounds::new(self.x, self.y, 0.0, 0.0),
                }
            }
            Shape::Path(d) | Shape::EraserPath(d) => {
                let pad = d.style.line_width.unwrap_or(DEFAULT_LINE_WIDTH) / 2.0;
                match geometry::points_bounds(&d.points, pad) {
                    Some(b) => b.translate(pivot.to_vec2()),
                    None => Bounds::centered(pivot, DEFAULT_EXTENT, DEFAULT_EXTENT),
                }
            }
            Shape::Line(d) | Shape::Bone(d) => {
                let pad = d.style.line_width.unwrap_or(DEFAULT_LINE_WIDTH) / 2.0;
                let ends = [pivot + d.start().to_vec2(), pivot + d.end().to_vec2()];
                geometry::points_bounds(&ends, pad).unwrap_or_default()
            }
            shape => {
                let (w, h) = shape.extent().unwrap_or((None, None));
                Bounds::centered(pivot, extent_or_default(w), extent_or_default(h))
            }
        }
    }

    /// Hit test in frame coordinates. Paths only hit along their stroke or
    /// inside their closed outline.
    pub fn hit_test(&self, p: Point) -> bool {
        match &self.shape {
            Shape::Path(d) | Shape::EraserPath(d) => {
                let local = p - self.pivot().to_vec2();
                geometry::is_point_in_path(local.x, local.y, &d.points, d.closed)
            }
            _ => self.get_object_bounds().contains(p),
        }
    }

    /// Groups pass the offset to every child and keep their own pivot.
    pub fn translate(&mut self, delta: Vec2) {
        match &mut self.shape {
            Shape::Group(g) => {
                for child in &mut g.objects {
                    child.x += delta.x;
                    child.y += delta.y;
                }
            }
            _ => {
                self.x += delta.x;
                self.y += delta.y;
            }
        }
    }

    /// Rotates by `delta` radians. Group children revolve around `center`
    /// (frame coordinates) and each gains the same rotation.
    pub fn rotate_by(&mut self, delta: f64, center: Point) {
        let offset = self.pivot().to_vec2();
        match &mut self.shape {
            Shape::Group(g) => {
                let local_center = center - offset;
                for child in &mut g.objects {
                    let p = geometry::rotate_about(child.pivot(), local_center, delta);
                    child.x = p.x;
                    child.y = p.y;
                    child.rotation += delta;
                }
            }
            _ => self.rotation += delta,
        }
    }

    /// Depth-first pre-order walk over this object and every descendant.
    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut SceneObject)) {
        f(self);
        if let Some(children) = self.children_mut() {
            for child in children {
                child.walk_mut(f);
            }
        }
    }

    pub fn count_objects(&self) -> usize {
        1 + self.children().map_or(0, |c| c.iter().map(SceneObject::count_objects).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, w: f64, h: f64) -> SceneObject {
        SceneObject::new(1, x, y, Shape::Square(BoxData { width: Some(w), height: Some(h), ..Default::default() }))
    }

    #[test]
    fn box_bounds_are_centred_on_pivot() {
        let b = square(100.0, 100.0, 50.0, 30.0).get_object_bounds();
        assert_eq!(b, Bounds::new(75.0, 85.0, 50.0, 30.0));
    }

    #[test]
    fn missing_extent_defaults_to_fifty() {
        let obj = SceneObject::new(1, 0.0, 0.0, Shape::Triangle(BoxData::default()));
        assert_eq!(obj.get_object_bounds(), Bounds::new(-25.0, -25.0, 50.0, 50.0));
    }

    #[test]
    fn zero_or_negative_extent_defaults_to_fifty() {
        let obj: SceneObject =
            serde_json::from_str(r#"{"id":2,"x":0,"y":0,"type":"square","data":{"width":0,"height":-10}}"#).unwrap();
        assert_eq!(obj.get_object_bounds(), Bounds::new(-25.0, -25.0, 50.0, 50.0));
        assert_eq!(extent_or_default(Some(12.0)), 12.0);
    }

    #[test]
    fn line_bounds_use_endpoints_and_padding() {
        let line = SceneObject::new(
            1,
            10.0,
            10.0,
            Shape::Line(LineData {
                start_x: -5.0,
                start_y: 0.0,
                end_x: 5.0,
                end_y: 20.0,
                style: Style { line_width: Some(2.0), ..Default::default() },
                ..Default::default()
            }),
        );
        assert_eq!(line.get_object_bounds(), Bounds::new(4.0, 9.0, 12.0, 22.0));
    }

    #[test]
    fn path_bounds_follow_pivot() {
        let path = SceneObject::new(
            1,
            100.0,
            0.0,
            Shape::Path(PathData {
                points: vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)],
                closed: false,
                style: Style { line_width: Some(4.0), ..Default::default() },
            }),
        );
        assert_eq!(path.get_object_bounds(), Bounds::new(98.0, -2.0, 14.0, 14.0));
    }

    #[test]
    fn group_bounds_union_children_plus_offset() {
        let group = SceneObject::new(
            3,
            5.0,
            0.0,
            Shape::Group(GroupData {
                objects: vec![square(0.0, 0.0, 10.0, 10.0), square(20.0, 20.0, 10.0, 10.0)],
                ..Default::default()
            }),
        );
        assert_eq!(group.get_object_bounds(), Bounds::new(0.0, -5.0, 30.0, 30.0));
    }

    #[test]
    fn set_size_stretches_ellipse_radii() {
        let mut shape = Shape::Circle(EllipseData::default());
        assert!(shape.set_size(40.0, 20.0));
        match shape {
            Shape::Circle(d) => assert_eq!(d.radii(), (20.0, 10.0)),
            _ => unreachable!(),
        }
        assert!(!Shape::Path(PathData::default()).set_size(1.0, 1.0));
    }

    #[test]
    fn serializes_as_type_and_data() {
        let obj = SceneObject::new(7, 1.0, 2.0, Shape::FloodFill(BoxData::default()));
        let value = serde_json::to_value(&obj).unwrap();
        assert_eq!(value["type"], "flood-fill");
        assert_eq!(value["scaleX"], 1.0);
        assert!(value["data"].is_object());
    }

    #[test]
    fn lenient_load_defaults_missing_fields() {
        let obj: SceneObject = serde_json::from_str(r#"{"id":4,"type":"circle","data":{"width":20}}"#).unwrap();
        assert_eq!(obj.opacity, 1.0);
        assert!(obj.visible);
        assert_eq!(obj.scale_y, 1.0);
        assert_eq!(obj.get_object_bounds(), Bounds::new(-10.0, -25.0, 20.0, 50.0));
    }

    #[test]
    fn group_rotation_revolves_children() {
        let mut group = SceneObject::new(
            3,
            0.0,
            0.0,
            Shape::Group(GroupData { objects: vec![square(10.0, 0.0, 4.0, 4.0), square(-10.0, 0.0, 4.0, 4.0)], ..Default::default() }),
        );
        group.rotate_by(std::f64::consts::PI, Point::ZERO);
        let kids = group.children().unwrap();
        assert!((kids[0].x + 10.0).abs() < 1e-9);
        assert!((kids[1].x - 10.0).abs() < 1e-9);
        assert!((kids[0].rotation - std::f64::consts::PI).abs() < 1e-9);
        assert_eq!(group.rotation, 0.0);
    }
}
