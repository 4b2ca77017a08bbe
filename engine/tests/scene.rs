use animation_engine::geometry::Bounds;
use animation_engine::objects::{BoxData, EllipseData, GroupData, LineData, PathData, SceneObject, Shape, Style};
use animation_engine::scene::Scene;
use animation_engine::{AnimationEngine, EngineError};
use kurbo::Point;

fn square(w: f64, h: f64) -> Shape {
    Shape::Square(BoxData { width: Some(w), height: Some(h), ..Default::default() })
}

fn circle(w: f64, h: f64) -> Shape {
    Shape::Circle(EllipseData { width: Some(w), height: Some(h), ..Default::default() })
}

fn close(a: Bounds, b: Bounds) -> bool {
    (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9 && (a.width - b.width).abs() < 1e-9 && (a.height - b.height).abs() < 1e-9
}

#[test]
fn box_kinds_are_centred_on_their_pivot() {
    let kinds = vec![
        square(40.0, 20.0),
        circle(40.0, 20.0),
        Shape::Semicircle(EllipseData { width: Some(40.0), height: Some(20.0), ..Default::default() }),
        Shape::Star(EllipseData { width: Some(40.0), height: Some(20.0), ..Default::default() }),
        Shape::Triangle(BoxData { width: Some(40.0), height: Some(20.0), ..Default::default() }),
        Shape::Arrow(BoxData { width: Some(40.0), height: Some(20.0), ..Default::default() }),
        Shape::FloodFill(BoxData { width: Some(40.0), height: Some(20.0), ..Default::default() }),
    ];
    for shape in kinds {
        let obj = SceneObject::new(1, 300.0, 200.0, shape);
        let b = obj.get_object_bounds();
        assert_eq!(b.center(), Point::new(300.0, 200.0), "{}", obj.kind_name());
        assert_eq!((b.width, b.height), (40.0, 20.0), "{}", obj.kind_name());
    }
}

#[test]
fn line_and_path_bounds_centre_on_symmetric_geometry() {
    let line = SceneObject::new(
        1,
        50.0,
        60.0,
        Shape::Line(LineData { start_x: -10.0, start_y: -5.0, end_x: 10.0, end_y: 5.0, ..Default::default() }),
    );
    assert_eq!(line.get_object_bounds().center(), Point::new(50.0, 60.0));

    let path = SceneObject::new(
        2,
        50.0,
        60.0,
        Shape::Path(PathData {
            points: vec![Point::new(-10.0, -10.0), Point::new(10.0, 10.0)],
            closed: false,
            style: Style::default(),
        }),
    );
    let b = path.get_object_bounds();
    assert_eq!(b.center(), Point::new(50.0, 60.0));
    assert_eq!(b.width, 25.0);
}

#[test]
fn bounds_ignore_a_no_op_transform() {
    let mut obj = SceneObject::new(1, 10.0, 10.0, circle(20.0, 20.0));
    let before = obj.get_object_bounds();
    obj.rotation = 0.0;
    obj.scale_x = 1.0;
    obj.scale_y = 1.0;
    assert_eq!(obj.get_object_bounds(), before);
}

#[test]
fn find_object_hits_inside_square_only() {
    let mut scene = Scene::new();
    let id = scene.create_object(100.0, 100.0, square(50.0, 50.0));
    assert_eq!(scene.find_object_at_position(Point::new(100.0, 100.0)), Some(id));
    assert_eq!(scene.find_object_at_position(Point::new(200.0, 200.0)), None);
}

#[test]
fn topmost_visible_object_wins() {
    let mut scene = Scene::new();
    let below = scene.create_object(100.0, 100.0, square(50.0, 50.0));
    let above = scene.create_object(100.0, 100.0, square(50.0, 50.0));
    assert_eq!(scene.find_object_at_position(Point::new(100.0, 100.0)), Some(above));
    scene.set_visible(above, false).unwrap();
    assert_eq!(scene.find_object_at_position(Point::new(100.0, 100.0)), Some(below));
}

#[test]
fn open_paths_hit_along_the_stroke() {
    let mut scene = Scene::new();
    let id = scene.create_object(
        0.0,
        0.0,
        Shape::Path(PathData {
            points: vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)],
            closed: false,
            style: Style::default(),
        }),
    );
    assert_eq!(scene.find_object_at_position(Point::new(50.0, 8.0)), Some(id));
    assert_eq!(scene.find_object_at_position(Point::new(50.0, 30.0)), None);
}

#[test]
fn ids_are_never_reused() {
    let mut scene = Scene::new();
    let a = scene.create_object(0.0, 0.0, square(10.0, 10.0));
    scene.delete_object(a);
    let b = scene.create_object(0.0, 0.0, square(10.0, 10.0));
    assert!(b > a);
}

#[test]
fn delete_clears_selection_and_ignores_unknown_ids() {
    let mut scene = Scene::new();
    let id = scene.create_object(0.0, 0.0, square(10.0, 10.0));
    assert_eq!(scene.selection.primary(), Some(id));
    assert!(scene.delete_object(id).is_some());
    assert!(scene.selection.is_empty());
    assert!(scene.delete_object(999).is_none());
}

#[test]
fn grouping_needs_two_objects() {
    let mut engine = AnimationEngine::default();
    let a = engine.create_object(10.0, 10.0, square(10.0, 10.0));
    let before = engine.scene().current().clone();
    let err = engine.group_objects(&[a, 4242], None).unwrap_err();
    assert!(matches!(err, EngineError::GroupNeedsTwoObjects));
    assert_eq!(engine.scene().current(), &before);
}

#[test]
fn group_bounds_are_the_union_and_undo_restores_members() {
    let mut engine = AnimationEngine::default();
    let a = engine.create_object(100.0, 100.0, square(50.0, 50.0));
    let b = engine.create_object(300.0, 200.0, circle(40.0, 20.0));
    engine.save_state("Add Objects");

    let bounds_a = engine.scene().object(a).unwrap().get_object_bounds();
    let bounds_b = engine.scene().object(b).unwrap().get_object_bounds();
    let members = engine.scene().current().objects.clone();

    let group = engine.group_objects(&[a, b], None).unwrap();
    let group_obj = engine.scene().object(group).unwrap();
    assert!(close(group_obj.get_object_bounds(), bounds_a.union(&bounds_b)));
    assert_eq!(group_obj.display_name(), "Group 1");
    assert_eq!(engine.scene().current().objects.len(), 1);

    assert!(engine.undo());
    assert_eq!(engine.scene().current().objects, members);
}

#[test]
fn ungroup_splices_children_back_in_place() {
    let mut scene = Scene::new();
    let bottom = scene.create_object(0.0, 0.0, square(10.0, 10.0));
    let a = scene.create_object(10.0, 10.0, square(10.0, 10.0));
    let b = scene.create_object(20.0, 20.0, square(10.0, 10.0));
    let top = scene.create_object(30.0, 30.0, square(10.0, 10.0));

    let group = scene.group_objects(&[b, a], Some("Pair")).unwrap();
    assert!(scene.move_down(group));
    let order: Vec<u32> = scene.current().objects.iter().map(|o| o.id).collect();
    assert_eq!(order, vec![bottom, group, top]);

    scene.object_mut(group).unwrap().x = 5.0;
    let ids = scene.ungroup(group).unwrap();
    assert_eq!(ids, vec![a, b]);
    let order: Vec<u32> = scene.current().objects.iter().map(|o| o.id).collect();
    assert_eq!(order, vec![bottom, a, b, top]);
    assert_eq!(scene.object(a).unwrap().x, 15.0);
}

#[test]
fn layer_ordering() {
    let mut scene = Scene::new();
    let a = scene.create_object(0.0, 0.0, square(10.0, 10.0));
    let b = scene.create_object(0.0, 0.0, square(10.0, 10.0));
    let c = scene.create_object(0.0, 0.0, square(10.0, 10.0));
    let ids = |s: &Scene| s.current().objects.iter().map(|o| o.id).collect::<Vec<_>>();

    assert!(scene.move_to_back(c));
    assert_eq!(ids(&scene), vec![c, a, b]);
    assert!(scene.move_to_front(c));
    assert_eq!(ids(&scene), vec![a, b, c]);
    assert!(!scene.move_up(c));
    assert!(scene.move_layer(c, a));
    assert_eq!(ids(&scene), vec![c, a, b]);
}

#[test]
fn duplicate_and_paste_assign_fresh_ids_with_offset() {
    let mut scene = Scene::new();
    let a = scene.create_object(10.0, 10.0, square(10.0, 10.0));
    let b = scene.create_object(40.0, 10.0, square(10.0, 10.0));
    let group = scene.group_objects(&[a, b], None).unwrap();

    let copy = scene.duplicate_object(group).unwrap();
    let copy_obj = scene.object(copy).unwrap();
    let child_ids: Vec<u32> = copy_obj.children().unwrap().iter().map(|c| c.id).collect();
    assert!(child_ids.iter().all(|id| *id > copy));
    assert_eq!(copy_obj.x, 20.0);

    assert!(scene.paste_object().is_none());
    scene.copy_object(a).unwrap_err();
    scene.copy_object(group).unwrap();
    let pasted = scene.paste_object().unwrap();
    assert!(pasted > *child_ids.last().unwrap());
}

#[test]
fn transparency_cycles_and_mask_toggles() {
    let mut scene = Scene::new();
    let id = scene.create_object(0.0, 0.0, square(10.0, 10.0));
    let steps: Vec<f64> = (0..4).map(|_| scene.cycle_transparency(id).unwrap()).collect();
    assert_eq!(steps, vec![0.75, 0.5, 0.25, 1.0]);
    assert!(scene.toggle_mask(id).unwrap());
    assert!(!scene.toggle_mask(id).unwrap());
}

#[test]
fn last_frame_cannot_be_removed() {
    let mut scene = Scene::new();
    assert!(matches!(scene.remove_frame(0), Err(EngineError::LastFrame)));
    scene.add_frame();
    assert!(matches!(scene.remove_frame(5), Err(EngineError::FrameOutOfRange(5))));
    scene.remove_frame(0).unwrap();
    assert_eq!(scene.frames.len(), 1);
    assert_eq!(scene.current_frame, 0);
}

#[test]
fn frame_pointer_follows_moves_and_wraps() {
    let mut scene = Scene::new();
    scene.add_frame();
    scene.add_frame();
    scene.load_frame(0).unwrap();
    scene.move_frame(0, 2).unwrap();
    assert_eq!(scene.current_frame, 2);
    assert_eq!(scene.next_frame_index(), 0);
    scene.load_frame(0).unwrap();
    assert_eq!(scene.previous_frame_index(), 2);
}

#[test]
fn pasted_frame_lands_after_current_with_new_ids() {
    let mut scene = Scene::new();
    let id = scene.create_object(0.0, 0.0, square(10.0, 10.0));
    scene.copy_frame(0).unwrap();
    let index = scene.paste_frame().unwrap();
    assert_eq!(index, 1);
    assert_eq!(scene.current_frame, 1);
    let pasted = &scene.frames[1].objects[0];
    assert_ne!(pasted.id, id);
}

#[test]
fn nested_group_payload_is_kept_in_data() {
    let inner = SceneObject::new(2, 0.0, 0.0, square(10.0, 10.0));
    let group = SceneObject::new(1, 0.0, 0.0, Shape::Group(GroupData { objects: vec![inner], expanded: true, effect: None }));
    let value = serde_json::to_value(&group).unwrap();
    assert_eq!(value["type"], "group");
    assert_eq!(value["data"]["objects"][0]["type"], "square");
    assert_eq!(group.count_objects(), 2);
}
