use std::collections::HashMap;

use kurbo::{Point, Vec2};
use wasm_bindgen::prelude::*;
use web_sys::HtmlImageElement;

use crate::animation::{EffectAnimator, EffectHandle, Playback};
use crate::config::{BrushConfig, EditorConfig, OnionSkinConfig};
use crate::effects::{self, EffectParams};
use crate::error::{EngineError, EngineResult};
use crate::history::History;
use crate::input::DrawingState;
use crate::objects::{SceneObject, Shape};
use crate::scene::{Frame, Scene};
use crate::transform::TransformEngine;
use crate::types::Tool;

/// Frames added by an effect generated with `add_frames`.
pub const EFFECT_FRAME_RUN: usize = 8;

#[wasm_bindgen]
pub struct AnimationEngine {
    pub(crate) scene: Scene,
    pub(crate) history: History<Vec<Frame>>,
    pub(crate) config: EditorConfig,
    pub(crate) brush: BrushConfig,
    pub(crate) onion: OnionSkinConfig,
    pub(crate) background_enabled: bool,
    pub(crate) background_color: String,
    pub(crate) tool: Tool,
    pub(crate) zoom: f64,
    pub(crate) pan: Vec2,
    pub(crate) transform: TransformEngine,
    pub(crate) drawing: DrawingState,
    pub(crate) effects: EffectAnimator,
    pub(crate) playback: Playback,
    pub(crate) clock_ms: f64,
    pub(crate) image_cache: HashMap<String, HtmlImageElement>,
}

impl Default for AnimationEngine {
    fn default() -> Self {
        AnimationEngine::from_config(EditorConfig::default())
    }
}

impl AnimationEngine {
    pub fn from_config(config: EditorConfig) -> AnimationEngine {
        let scene = Scene::new();
        let mut history = History::new(config.history_capacity);
        history.reset("Initial State", scene.frames.clone());
        AnimationEngine {
            scene,
            history,
            brush: config.brush.clone(),
            onion: config.onion_skin.clone(),
            background_enabled: config.background_enabled,
            background_color: config.background_color.clone(),
            tool: Tool::Move,
            zoom: 1.0,
            pan: Vec2::ZERO,
            transform: TransformEngine::default(),
            drawing: DrawingState::Idle,
            effects: EffectAnimator::default(),
            playback: Playback::new(config.playback_fps),
            clock_ms: 0.0,
            image_cache: HashMap::new(),
            config,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn history(&self) -> &History<Vec<Frame>> {
        &self.history
    }

    pub fn effects(&self) -> &EffectAnimator {
        &self.effects
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    pub fn brush(&self) -> &BrushConfig {
        &self.brush
    }

    pub fn brush_mut(&mut self) -> &mut BrushConfig {
        &mut self.brush
    }

    pub fn fire_anchor(&self) -> Point {
        Point::new(self.config.fire_anchor.0, self.config.fire_anchor.1)
    }

    /// Pushes a snapshot of every frame.
    pub fn save_state(&mut self, label: &str) {
        self.history.push(label, self.scene.frames.clone());
        log::debug!("history push '{}' ({} entries)", label, self.history.len());
    }

    /// Ends an in-flight gesture before the scene is switched underneath
    /// it. Geometry the gesture already moved is kept as a "Transform" step.
    pub(crate) fn abort_gesture(&mut self) {
        if let Some(commit) = self.transform.finish() {
            if commit.changed {
                self.save_state("Transform");
            }
        }
        self.drawing = DrawingState::Idle;
    }

    fn restore_snapshot(&mut self, frames: Vec<Frame>) {
        self.transform.cancel();
        self.drawing = DrawingState::Idle;
        self.scene.restore_frames(frames);
        self.prune_effect_tasks();
    }

    /// Stops animations whose group is no longer a visible object of the
    /// current frame.
    pub(crate) fn prune_effect_tasks(&mut self) {
        self.effects.retain_live(&self.scene.current().objects);
    }

    /// Low-level creation: appends and selects, without a history entry.
    pub fn create_object(&mut self, x: f64, y: f64, shape: Shape) -> u32 {
        self.scene.create_object(x, y, shape)
    }

    pub fn delete_object(&mut self, id: u32) -> bool {
        let Some(removed) = self.scene.delete_object(id) else {
            return false;
        };
        self.effects.cancel_group(removed.id);
        self.save_state("Delete Object");
        true
    }

    pub fn delete_selected(&mut self) -> usize {
        let removed = self.scene.delete_selected();
        for obj in &removed {
            self.effects.cancel_group(obj.id);
        }
        if !removed.is_empty() {
            self.save_state("Delete Object");
        }
        removed.len()
    }

    pub fn group_objects(&mut self, ids: &[u32], name: Option<&str>) -> EngineResult<u32> {
        let id = self.scene.group_objects(ids, name)?;
        // effect groups folded into a new group are no longer top-level
        self.prune_effect_tasks();
        self.save_state("Group Objects");
        Ok(id)
    }

    pub fn group_selected(&mut self, name: Option<&str>) -> EngineResult<u32> {
        let ids = self.scene.selection.ids().to_vec();
        self.group_objects(&ids, name)
    }

    pub fn ungroup(&mut self, id: u32) -> EngineResult<Vec<u32>> {
        self.effects.cancel_group(id);
        let ids = self.scene.ungroup(id)?;
        self.save_state("Ungroup");
        Ok(ids)
    }

    pub fn set_object_visible(&mut self, id: u32, visible: bool) -> EngineResult<()> {
        self.scene.set_visible(id, visible)?;
        self.prune_effect_tasks();
        self.save_state(if visible { "Show Object" } else { "Hide Object" });
        Ok(())
    }

    /// Generates an effect group in the current frame and starts its
    /// animation. With `add_frames`, the effect is also laid into
    /// `EFFECT_FRAME_RUN - 1` new frames (one step apart) and the first
    /// frame stays current.
    pub fn generate_effect(&mut self, mut params: EffectParams, add_frames: bool) -> (u32, EffectHandle) {
        let start_frame = self.scene.current_frame;
        let width = self.config.canvas_width;
        let anchor = self.fire_anchor();

        if params.seed == 0 {
            params.seed = u64::from(self.scene.last_id()) + 1;
        }
        let group = {
            let scene = &mut self.scene;
            effects::build_effect_group(params.clone(), width, anchor, &mut || scene.allocate_id())
        };
        let count = group.children().map_or(0, |c| c.len());
        let group_id = self.scene.insert_object(group);

        if add_frames {
            for step in 1..EFFECT_FRAME_RUN {
                self.scene.add_frame();
                let scene = &mut self.scene;
                let mut follow_up = effects::build_effect_group(params.clone(), width, anchor, &mut || scene.allocate_id());
                let particles = effects::generate_particles(&params, step as u64, width, anchor);
                effects::apply_particles(&mut follow_up, &particles);
                self.scene.insert_object(follow_up);
            }
            // load_frame only fails for an out-of-range index
            let _ = self.scene.load_frame(start_frame);
            self.scene.selection.select_only(group_id);
        }

        let handle = self.effects.spawn(group_id, &params, self.clock_ms);
        log::info!("created {} effect {} with {} particles", params.effect_type.label(), group_id, count);
        self.save_state(&format!("{} Effect", params.effect_type.label()));
        (group_id, handle)
    }

    pub fn cancel_effect(&mut self, handle: EffectHandle) -> bool {
        self.effects.cancel(handle)
    }

    pub fn go_to_frame(&mut self, index: usize) -> EngineResult<()> {
        if index >= self.scene.frames.len() {
            return Err(EngineError::FrameOutOfRange(index));
        }
        self.abort_gesture();
        self.scene.load_frame(index)?;
        self.prune_effect_tasks();
        Ok(())
    }

    /// Drives playback and effect animations. Returns true when the
    /// surfaces need a redraw.
    pub fn advance(&mut self, now_ms: f64) -> bool {
        self.clock_ms = now_ms;
        let mut redraw = false;
        if self.playback.due(now_ms) {
            let next = self.scene.next_frame_index();
            if next != self.scene.current_frame {
                redraw |= self.go_to_frame(next).is_ok();
            }
        }
        let width = self.config.canvas_width;
        let anchor = self.fire_anchor();
        let frame = self.scene.current_frame;
        redraw |= self.effects.tick(now_ms, &mut self.scene.frames[frame].objects, width, anchor);
        redraw
    }

    pub fn object_json(&self, id: u32) -> EngineResult<String> {
        let obj = self.scene.object(id).ok_or(EngineError::ObjectNotFound(id))?;
        Ok(serde_json::to_string(obj).unwrap_or_else(|_| "null".to_string()))
    }

    pub(crate) fn replace_object(&mut self, obj: SceneObject) {
        if let Some(slot) = self.scene.object_mut(obj.id) {
            *slot = obj;
        }
    }
}

#[wasm_bindgen]
impl AnimationEngine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> AnimationEngine {
        console_error_panic_hook::set_once();
        AnimationEngine::default()
    }

    /// Builds an engine from a partial JSON configuration.
    pub fn with_config(config_json: &str) -> Result<AnimationEngine, JsValue> {
        console_error_panic_hook::set_once();
        let config = EditorConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(AnimationEngine::from_config(config))
    }

    pub fn undo(&mut self) -> bool {
        let Some(frames) = self.history.undo().cloned() else {
            return false;
        };
        self.restore_snapshot(frames);
        log::debug!("undo");
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(frames) = self.history.redo().cloned() else {
            return false;
        };
        self.restore_snapshot(frames);
        log::debug!("redo");
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn get_history(&self) -> String {
        serde_json::to_string(&self.history.labels()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Single timer entry point for the host's animation loop.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        self.advance(now_ms)
    }

    pub fn start_playback(&mut self) {
        self.playback.start();
    }

    pub fn stop_playback(&mut self) {
        self.playback.stop();
    }

    pub fn toggle_playback(&mut self) -> bool {
        self.playback.toggle()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn set_playback_speed(&mut self, fps: f64) {
        self.playback.set_fps(fps);
    }

    pub fn set_tool(&mut self, name: &str) -> bool {
        match Tool::parse(name) {
            Some(tool) => {
                self.abort_gesture();
                self.tool = tool;
                true
            }
            None => {
                log::warn!("unknown tool '{}'", name);
                false
            }
        }
    }

    pub fn get_tool(&self) -> String {
        serde_json::to_value(self.tool)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    pub fn set_primary_color(&mut self, color: &str) {
        self.brush.primary_color = color.to_string();
    }

    pub fn set_secondary_color(&mut self, color: &str) {
        self.brush.secondary_color = color.to_string();
    }

    pub fn set_brush_size(&mut self, size: f64) {
        self.brush.brush_size = size.max(1.0);
    }

    pub fn set_brush_opacity(&mut self, opacity: f64) {
        self.brush.opacity = opacity.clamp(0.0, 1.0);
    }

    pub fn set_font(&mut self, family: &str, size: f64) {
        self.brush.font_family = family.to_string();
        self.brush.font_size = size.max(1.0);
    }

    pub fn set_onion_skin(&mut self, enabled: bool, prev: usize, next: usize, alpha: f64) {
        self.onion = OnionSkinConfig { enabled, prev, next, alpha: alpha.clamp(0.0, 1.0) };
    }

    pub fn set_background(&mut self, enabled: bool, color: &str) {
        self.background_enabled = enabled;
        self.background_color = color.to_string();
    }

    pub fn get_zoom(&self) -> f64 {
        self.zoom
    }

    pub fn frame_count(&self) -> usize {
        self.scene.frames.len()
    }

    pub fn current_frame_index(&self) -> usize {
        self.scene.current_frame
    }

    pub fn get_frames_json(&self) -> String {
        serde_json::to_string(&self.scene.frames).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn get_objects_json(&self) -> String {
        serde_json::to_string(&self.scene.current().objects).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn get_selected_ids(&self) -> String {
        serde_json::to_string(self.scene.selection.ids()).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn get_primary_selection(&self) -> Option<u32> {
        self.scene.selection.primary()
    }

    pub fn get_object_bounds(&self, id: u32) -> String {
        match self.scene.object(id) {
            Some(obj) => serde_json::to_string(&obj.get_object_bounds()).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }

    /// Structured copy of the current frame for the layer panel.
    pub fn get_current_frame(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.scene.current()).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn register_image(&mut self, src: &str, image: HtmlImageElement) {
        self.image_cache.insert(src.to_string(), image);
    }
}
