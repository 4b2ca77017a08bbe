use animation_engine::objects::{BoxData, Shape};
use animation_engine::render::{render_frame_to_surface, DrawDefaults, EXPORT_BACKGROUND};
use animation_engine::surface::{CommandRecorder, CompositeOp, DrawCommand, Paint};
use animation_engine::{AnimationEngine, EngineError};

fn square() -> Shape {
    Shape::Square(BoxData { width: Some(50.0), height: Some(50.0), ..Default::default() })
}

fn surfaces() -> (CommandRecorder, CommandRecorder) {
    (CommandRecorder::new(1920.0, 1080.0), CommandRecorder::new(1920.0, 1080.0))
}

fn is_rect(c: &DrawCommand) -> bool {
    matches!(c, DrawCommand::Rect { .. })
}

#[test]
fn onion_skin_draws_previous_frame_faded() {
    let mut engine = AnimationEngine::default();
    engine.create_object(100.0, 100.0, square());
    engine.scene_mut().add_frame();
    engine.create_object(200.0, 100.0, square());

    let (mut main, mut overlay) = surfaces();
    engine.redraw_to(&mut main, &mut overlay);

    assert_eq!(main.count(|c| matches!(c, DrawCommand::GlobalAlpha { alpha } if (*alpha - 0.3).abs() < 1e-9)), 1);
    assert_eq!(main.count(|c| matches!(c, DrawCommand::GlobalAlpha { alpha } if *alpha == 1.0)), 1);
    assert_eq!(main.count(is_rect), 2);
}

#[test]
fn onion_skin_can_be_switched_off() {
    let mut engine = AnimationEngine::default();
    engine.create_object(100.0, 100.0, square());
    engine.scene_mut().add_frame();
    engine.set_onion_skin(false, 1, 1, 0.3);

    let (mut main, mut overlay) = surfaces();
    engine.redraw_to(&mut main, &mut overlay);
    assert_eq!(main.count(is_rect), 0);
}

#[test]
fn export_without_background_fills_white() {
    let mut engine = AnimationEngine::default();
    engine.create_object(100.0, 100.0, square());

    let mut out = CommandRecorder::new(1920.0, 1080.0);
    engine.render_frame_to(0, &mut out).unwrap();
    assert_eq!(
        &out.commands[..4],
        &[
            DrawCommand::ResetTransform,
            DrawCommand::Clear,
            DrawCommand::Fill { paint: Paint::solid(EXPORT_BACKGROUND) },
            DrawCommand::FillRect { x: 0.0, y: 0.0, w: 1920.0, h: 1080.0 },
        ]
    );
    assert_eq!(out.count(is_rect), 1);
}

#[test]
fn export_uses_frame_background_when_enabled() {
    let mut engine = AnimationEngine::default();
    engine.set_background(true, "#000000");
    engine.scene_mut().set_frame_background(0, Some("#ff0000".to_string())).unwrap();

    let mut out = CommandRecorder::new(640.0, 480.0);
    engine.render_frame_to(0, &mut out).unwrap();
    assert_eq!(out.commands[2], DrawCommand::Fill { paint: Paint::solid("#ff0000") });
}

#[test]
fn export_of_missing_frame_fails() {
    let engine = AnimationEngine::default();
    let mut out = CommandRecorder::new(10.0, 10.0);
    assert!(matches!(engine.render_frame_to(3, &mut out), Err(EngineError::FrameOutOfRange(3))));
    assert!(out.commands.is_empty());
}

#[test]
fn hidden_objects_are_skipped() {
    let mut engine = AnimationEngine::default();
    engine.create_object(100.0, 100.0, square());
    let hidden = engine.create_object(200.0, 100.0, square());
    engine.set_object_visible(hidden, false).unwrap();

    let mut out = CommandRecorder::new(1920.0, 1080.0);
    engine.render_frame_to(0, &mut out).unwrap();
    assert_eq!(out.count(is_rect), 1);
}

#[test]
fn masks_composite_destination_in() {
    let mut engine = AnimationEngine::default();
    engine.create_object(100.0, 100.0, square());
    let mask = engine.create_object(100.0, 100.0, square());
    engine.scene_mut().toggle_mask(mask).unwrap();

    let mut out = CommandRecorder::new(1920.0, 1080.0);
    engine.render_frame_to(0, &mut out).unwrap();
    assert_eq!(out.count(|c| *c == DrawCommand::Composite { mode: CompositeOp::DestinationIn }), 1);
}

#[test]
fn opacity_multiplies_into_global_alpha() {
    let mut engine = AnimationEngine::default();
    let id = engine.create_object(100.0, 100.0, square());
    engine.scene_mut().cycle_transparency(id).unwrap();

    let mut out = CommandRecorder::new(100.0, 100.0);
    engine.render_frame_to(0, &mut out).unwrap();
    assert!(out.commands.contains(&DrawCommand::GlobalAlpha { alpha: 0.75 }));
}

#[test]
fn handles_go_to_the_overlay_for_the_move_tool_only() {
    let mut engine = AnimationEngine::default();
    engine.create_object(100.0, 100.0, square());

    let (mut main, mut overlay) = surfaces();
    engine.redraw_to(&mut main, &mut overlay);
    assert!(overlay.count(|c| matches!(c, DrawCommand::LineDash { dash } if !dash.is_empty())) > 0);
    assert_eq!(overlay.count(|c| matches!(c, DrawCommand::FillRect { .. })), 4);
    assert_eq!(main.count(|c| matches!(c, DrawCommand::LineDash { .. })), 0);

    engine.set_tool("pencil");
    let (mut main, mut overlay) = surfaces();
    engine.redraw_to(&mut main, &mut overlay);
    assert_eq!(overlay.commands, vec![DrawCommand::ResetTransform, DrawCommand::Clear]);
}

#[test]
fn zoom_scales_the_main_surface() {
    let mut engine = AnimationEngine::default();
    engine.set_zoom(2.0);
    let (mut main, mut overlay) = surfaces();
    engine.redraw_to(&mut main, &mut overlay);
    assert!(main.commands.contains(&DrawCommand::Scale { sx: 2.0, sy: 2.0 }));
}

#[test]
fn groups_draw_each_child_inside_their_own_transform() {
    let mut engine = AnimationEngine::default();
    let a = engine.create_object(100.0, 100.0, square());
    let b = engine.create_object(200.0, 100.0, square());
    engine.group_objects(&[a, b], None).unwrap();

    let mut out = CommandRecorder::new(1920.0, 1080.0);
    engine.render_frame_to(0, &mut out).unwrap();
    assert_eq!(out.count(is_rect), 2);
    assert_eq!(out.count(|c| matches!(c, DrawCommand::Translate { .. })), 3);
    assert_eq!(out.count(|c| *c == DrawCommand::Save), out.count(|c| *c == DrawCommand::Restore));
}

#[test]
fn frame_renderer_skips_background_when_none() {
    let engine = AnimationEngine::default();
    let mut out = CommandRecorder::new(10.0, 10.0);
    render_frame_to_surface(engine.scene().current(), None, &mut out, &DrawDefaults::default());
    assert_eq!(out.commands, vec![DrawCommand::ResetTransform, DrawCommand::Clear]);
}
