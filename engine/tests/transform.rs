use animation_engine::input::{KeyOutcome, DrawingState};
use animation_engine::objects::{BoxData, LineData, Shape};
use animation_engine::{AnimationEngine, Modifiers, PointerButton};
use kurbo::Point;

fn engine_with_square() -> (AnimationEngine, u32) {
    let mut engine = AnimationEngine::default();
    let id = engine.create_object(
        100.0,
        100.0,
        Shape::Square(BoxData { width: Some(50.0), height: Some(50.0), ..Default::default() }),
    );
    engine.save_state("Add square");
    (engine, id)
}

fn drag(engine: &mut AnimationEngine, from: Point, to: Point) {
    engine.handle_pointer_down(from, PointerButton::Primary, Modifiers::default());
    engine.handle_pointer_move(to);
    engine.handle_pointer_up(to);
}

#[test]
fn dragging_an_object_moves_it_and_records_history() {
    let (mut engine, id) = engine_with_square();
    let entries = engine.history().len();

    drag(&mut engine, Point::new(100.0, 100.0), Point::new(120.0, 110.0));

    let obj = engine.scene().object(id).unwrap();
    assert_eq!((obj.x, obj.y), (120.0, 110.0));
    assert_eq!(engine.history().len(), entries + 1);
    assert_eq!(engine.history().labels().last(), Some(&"Transform"));
}

#[test]
fn click_without_motion_adds_no_history() {
    let (mut engine, _) = engine_with_square();
    let entries = engine.history().len();
    drag(&mut engine, Point::new(100.0, 100.0), Point::new(100.0, 100.0));
    assert_eq!(engine.history().len(), entries);
}

#[test]
fn corner_handle_resizes() {
    let (mut engine, id) = engine_with_square();
    drag(&mut engine, Point::new(125.0, 125.0), Point::new(145.0, 135.0));
    let obj = engine.scene().object(id).unwrap();
    assert_eq!(obj.shape.extent(), Some((Some(70.0), Some(60.0))));
    assert_eq!((obj.x, obj.y), (100.0, 100.0));
}

#[test]
fn rotate_knob_turns_a_quarter() {
    let (mut engine, id) = engine_with_square();
    drag(&mut engine, Point::new(100.0, 50.0), Point::new(150.0, 100.0));
    let rotation = engine.scene().object(id).unwrap().rotation;
    assert!((rotation - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
}

#[test]
fn line_endpoint_drag_moves_one_end() {
    let mut engine = AnimationEngine::default();
    let id = engine.create_object(
        50.0,
        50.0,
        Shape::Line(LineData { start_x: -20.0, start_y: 0.0, end_x: 20.0, end_y: 0.0, ..Default::default() }),
    );
    drag(&mut engine, Point::new(30.0, 50.0), Point::new(30.0, 70.0));
    match &engine.scene().object(id).unwrap().shape {
        Shape::Line(d) => {
            assert_eq!((d.start_x, d.start_y), (-20.0, 20.0));
            assert_eq!((d.end_x, d.end_y), (20.0, 0.0));
        }
        other => panic!("expected a line, got {}", other.kind_name()),
    }
}

#[test]
fn escape_restores_the_object_mid_gesture() {
    let (mut engine, id) = engine_with_square();
    let before = engine.scene().object(id).unwrap().clone();
    let entries = engine.history().len();

    engine.handle_pointer_down(Point::new(125.0, 125.0), PointerButton::Primary, Modifiers::default());
    engine.handle_pointer_move(Point::new(180.0, 190.0));
    assert_ne!(engine.scene().object(id).unwrap(), &before);

    assert_eq!(engine.handle_key("Escape", Modifiers::default()), KeyOutcome::Redraw);
    assert_eq!(engine.scene().object(id).unwrap(), &before);
    assert!(!engine.handle_pointer_up(Point::new(180.0, 190.0)));
    assert_eq!(engine.history().len(), entries);
}

#[test]
fn shift_click_toggles_selection_without_moving() {
    let (mut engine, a) = engine_with_square();
    let b = engine.create_object(
        300.0,
        300.0,
        Shape::Square(BoxData { width: Some(50.0), height: Some(50.0), ..Default::default() }),
    );
    let shift = Modifiers { shift: true, ..Default::default() };
    engine.handle_pointer_down(Point::new(100.0, 100.0), PointerButton::Primary, shift);
    engine.handle_pointer_up(Point::new(100.0, 100.0));
    assert_eq!(engine.scene().selection.ids(), &[b, a]);
    assert_eq!(engine.scene().selection.primary(), Some(a));

    engine.handle_pointer_down(Point::new(600.0, 600.0), PointerButton::Primary, Modifiers::default());
    assert!(engine.scene().selection.is_empty());
}

#[test]
fn square_tool_drag_creates_centred_square() {
    let mut engine = AnimationEngine::default();
    assert!(engine.set_tool("square"));
    drag(&mut engine, Point::new(10.0, 10.0), Point::new(70.0, 50.0));

    let objects = &engine.scene().current().objects;
    assert_eq!(objects.len(), 1);
    let obj = &objects[0];
    assert_eq!((obj.x, obj.y), (40.0, 30.0));
    assert_eq!(obj.shape.extent(), Some((Some(60.0), Some(40.0))));
    assert_eq!(engine.history().labels().last(), Some(&"Add square"));
}

#[test]
fn tiny_shape_drags_are_discarded() {
    let mut engine = AnimationEngine::default();
    engine.set_tool("circle");
    drag(&mut engine, Point::new(10.0, 10.0), Point::new(15.0, 14.0));
    assert!(engine.scene().current().objects.is_empty());
    assert!(!engine.can_undo());
}

#[test]
fn pencil_stroke_becomes_path_around_its_bbox_centre() {
    let mut engine = AnimationEngine::default();
    engine.set_tool("pencil");
    engine.handle_pointer_down(Point::new(0.0, 0.0), PointerButton::Primary, Modifiers::default());
    engine.handle_pointer_move(Point::new(50.0, 20.0));
    engine.handle_pointer_move(Point::new(100.0, 40.0));
    assert!(matches!(engine.drawing(), DrawingState::Stroke { points, .. } if points.len() == 3));
    engine.handle_pointer_up(Point::new(100.0, 40.0));

    let obj = &engine.scene().current().objects[0];
    assert_eq!((obj.x, obj.y), (50.0, 20.0));
    match &obj.shape {
        Shape::Path(d) => {
            assert!(!d.closed);
            assert_eq!(d.points.first(), Some(&Point::new(-50.0, -20.0)));
            assert_eq!(d.style.color.as_deref(), Some("#4f46e5"));
        }
        other => panic!("expected a path, got {}", other.kind_name()),
    }
    assert_eq!(engine.history().labels().last(), Some(&"Draw Path"));
}

#[test]
fn zoom_divides_pointer_coordinates() {
    let (mut engine, id) = engine_with_square();
    engine.set_zoom(2.0);
    assert_eq!(engine.to_frame_space(Point::new(200.0, 200.0)), Point::new(100.0, 100.0));

    drag(&mut engine, Point::new(200.0, 200.0), Point::new(240.0, 220.0));
    let obj = engine.scene().object(id).unwrap();
    assert_eq!((obj.x, obj.y), (120.0, 110.0));
}

#[test]
fn wheel_steps_zoom_within_limits() {
    let mut engine = AnimationEngine::default();
    assert!(engine.handle_wheel(-1.0, Modifiers::default()));
    assert!((engine.zoom() - 1.1).abs() < 1e-9);
    engine.set_zoom(5.0);
    assert!(!engine.handle_wheel(-1.0, Modifiers::default()));
    assert_eq!(engine.zoom(), 5.0);
}

#[test]
fn middle_button_pans() {
    let mut engine = AnimationEngine::default();
    engine.handle_pointer_down(Point::new(10.0, 10.0), PointerButton::Middle, Modifiers::default());
    engine.handle_pointer_move(Point::new(40.0, 25.0));
    engine.handle_pointer_up(Point::new(40.0, 25.0));
    assert_eq!((engine.get_pan_x(), engine.get_pan_y()), (30.0, 15.0));
}

#[test]
fn cursor_reflects_handles_and_body() {
    let (engine, _) = engine_with_square();
    assert_eq!(engine.cursor_at(Point::new(125.0, 125.0)), "nwse-resize");
    assert_eq!(engine.cursor_at(Point::new(100.0, 50.0)), "grab");
    assert_eq!(engine.cursor_at(Point::new(100.0, 100.0)), "move");
    assert_eq!(engine.cursor_at(Point::new(500.0, 500.0)), "default");
}

#[test]
fn keyboard_undo_redo_and_host_requests() {
    let (mut engine, id) = engine_with_square();
    let ctrl = Modifiers { ctrl: true, ..Default::default() };
    assert_eq!(engine.handle_key("z", ctrl), KeyOutcome::Redraw);
    assert!(engine.scene().object(id).is_none());
    assert_eq!(engine.handle_key("y", ctrl), KeyOutcome::Redraw);
    assert!(engine.scene().object(id).is_some());
    assert_eq!(engine.handle_key("s", ctrl), KeyOutcome::SaveRequested);
    assert_eq!(engine.on_key("n", false, false, true), "newRequested");
}

#[test]
fn text_is_sized_from_the_font() {
    let mut engine = AnimationEngine::default();
    let id = engine.place_text(Point::new(10.0, 20.0), "Hello").unwrap();
    let obj = engine.scene().object(id).unwrap();
    assert_eq!(obj.shape.extent(), Some((Some(5.0 * 24.0 * 0.6), Some(24.0))));
    assert!(engine.place_text(Point::ZERO, "").is_none());
}

fn grouped_pair() -> (AnimationEngine, u32, [u32; 2]) {
    let (mut engine, a) = engine_with_square();
    let b = engine.create_object(
        200.0,
        100.0,
        Shape::Square(BoxData { width: Some(50.0), height: Some(50.0), ..Default::default() }),
    );
    engine.save_state("Add square");
    let group = engine.group_objects(&[a, b], None).unwrap();
    (engine, group, [a, b])
}

fn child_pivot(engine: &AnimationEngine, group: u32, index: usize) -> (f64, f64) {
    let child = &engine.scene().object(group).unwrap().children().unwrap()[index];
    (child.x, child.y)
}

#[test]
fn dragging_a_group_moves_every_child() {
    let (mut engine, group, _) = grouped_pair();
    drag(&mut engine, Point::new(100.0, 100.0), Point::new(130.0, 110.0));

    let obj = engine.scene().object(group).unwrap();
    assert_eq!((obj.x, obj.y), (0.0, 0.0));
    assert_eq!(child_pivot(&engine, group, 0), (130.0, 110.0));
    assert_eq!(child_pivot(&engine, group, 1), (230.0, 110.0));
    assert_eq!(engine.history().labels().last(), Some(&"Transform"));
}

#[test]
fn rotating_a_group_revolves_children_around_its_bounds_centre() {
    let (mut engine, group, _) = grouped_pair();
    // Bounds span (75, 75)..(225, 125): centre (150, 100), knob at (150, 50).
    drag(&mut engine, Point::new(150.0, 50.0), Point::new(200.0, 100.0));

    let children = engine.scene().object(group).unwrap().children().unwrap();
    let expected = [(150.0, 50.0), (150.0, 150.0)];
    for (child, (x, y)) in children.iter().zip(expected) {
        assert!((child.x - x).abs() < 1e-9 && (child.y - y).abs() < 1e-9, "{:?}", (child.x, child.y));
        assert!((child.rotation - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }
}

#[test]
fn single_frame_playback_does_not_interrupt_a_drag() {
    let (mut engine, id) = engine_with_square();
    engine.start_playback();
    engine.tick(0.0);

    engine.handle_pointer_down(Point::new(100.0, 100.0), PointerButton::Primary, Modifiers::default());
    engine.handle_pointer_move(Point::new(130.0, 100.0));
    engine.tick(100.0);
    engine.handle_pointer_move(Point::new(160.0, 100.0));
    engine.handle_pointer_up(Point::new(160.0, 100.0));

    assert_eq!(engine.scene().object(id).unwrap().x, 160.0);
    assert_eq!(engine.history().labels().last(), Some(&"Transform"));
    assert!(engine.undo());
    assert!(engine.redo());
    assert_eq!(engine.scene().object(id).unwrap().x, 160.0);
}

#[test]
fn frame_switch_mid_drag_keeps_the_move_in_history() {
    let (mut engine, _) = engine_with_square();
    engine.scene_mut().add_frame();
    engine.save_state("Add Frame");
    engine.go_to_frame(0).unwrap();
    engine.start_playback();
    engine.tick(0.0);

    engine.handle_pointer_down(Point::new(100.0, 100.0), PointerButton::Primary, Modifiers::default());
    engine.handle_pointer_move(Point::new(130.0, 100.0));
    assert!(engine.tick(100.0));
    assert_eq!(engine.current_frame_index(), 1);
    engine.handle_pointer_move(Point::new(160.0, 100.0));
    engine.handle_pointer_up(Point::new(160.0, 100.0));

    let x = |engine: &AnimationEngine| engine.scene().frames[0].objects[0].x;
    assert_eq!(x(&engine), 130.0);
    assert_eq!(engine.history().labels().last(), Some(&"Transform"));
    assert!(engine.undo());
    assert_eq!(x(&engine), 100.0);
    assert!(engine.redo());
    assert_eq!(x(&engine), 130.0);
}

#[test]
fn switching_tools_mid_drag_commits_the_move() {
    let (mut engine, id) = engine_with_square();
    engine.handle_pointer_down(Point::new(100.0, 100.0), PointerButton::Primary, Modifiers::default());
    engine.handle_pointer_move(Point::new(140.0, 100.0));
    assert!(engine.set_tool("pencil"));

    assert_eq!(engine.history().labels().last(), Some(&"Transform"));
    assert!(engine.undo());
    assert_eq!(engine.scene().object(id).unwrap().x, 100.0);
}

#[test]
fn copy_and_paste_from_the_keyboard() {
    let (mut engine, id) = engine_with_square();
    let ctrl = Modifiers { ctrl: true, ..Default::default() };
    assert_eq!(engine.handle_key("c", ctrl), KeyOutcome::Ignored);
    assert_eq!(engine.handle_key("v", ctrl), KeyOutcome::Redraw);
    let objects = &engine.scene().current().objects;
    assert_eq!(objects.len(), 2);
    assert_ne!(objects[1].id, id);
}
