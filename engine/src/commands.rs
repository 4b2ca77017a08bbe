use serde::Deserialize;
use serde_json::{json, Value};
use wasm_bindgen::prelude::*;

use crate::animation::EffectHandle;
use crate::engine::AnimationEngine;
use crate::effects::EffectParams;
use crate::error::{EngineError, EngineResult};
use crate::objects::{SceneObject, Shape};

/// Top-level fields the properties panel may edit. Everything else goes
/// through `data`.
const EDITABLE_FIELDS: [&str; 9] = ["x", "y", "rotation", "scaleX", "scaleY", "opacity", "visible", "isMask", "name"];

fn as_id(v: &Value) -> EngineResult<u32> {
    v.as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| EngineError::InvalidCommand(format!("bad object id {}", v)))
}

fn param_id(params: &Value, key: &str) -> EngineResult<u32> {
    match params.get(key) {
        Some(v) if !v.is_null() => as_id(v),
        _ => Err(EngineError::InvalidCommand(format!("missing '{}'", key))),
    }
}

fn as_index(v: &Value) -> EngineResult<usize> {
    v.as_u64()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| EngineError::InvalidCommand(format!("bad frame index {}", v)))
}

fn param_index(params: &Value, key: &str) -> EngineResult<usize> {
    match params.get(key) {
        Some(v) if !v.is_null() => as_index(v),
        _ => Err(EngineError::InvalidCommand(format!("missing '{}'", key))),
    }
}

/// Optional frame index, falling back to the current frame.
fn param_index_or(params: &Value, key: &str, current: usize) -> EngineResult<usize> {
    match params.get(key) {
        Some(v) if !v.is_null() => as_index(v),
        _ => Ok(current),
    }
}

fn param_ids(params: &Value) -> Option<EngineResult<Vec<u32>>> {
    params["ids"].as_array().map(|ids| ids.iter().map(as_id).collect())
}

/// Merges `params` into a serialized copy of `obj` and parses it back, so a
/// bad value leaves the object untouched. The object's kind cannot change.
pub fn merge_object(obj: &SceneObject, params: &Value) -> EngineResult<SceneObject> {
    let mut value = serde_json::to_value(obj).map_err(|e| EngineError::InvalidCommand(e.to_string()))?;
    for key in EDITABLE_FIELDS {
        if let Some(v) = params.get(key) {
            value[key] = v.clone();
        }
    }
    if let (Some(patch), Some(data)) = (params.get("data").and_then(Value::as_object), value.get_mut("data")) {
        match data.as_object_mut() {
            Some(target) => {
                for (k, v) in patch {
                    if v.is_null() {
                        target.remove(k);
                    } else {
                        target.insert(k.clone(), v.clone());
                    }
                }
            }
            None => *data = Value::Object(patch.clone()),
        }
    }
    let mut merged: SceneObject = serde_json::from_value(value).map_err(|e| EngineError::InvalidCommand(e.to_string()))?;
    merged.id = obj.id;
    Ok(merged)
}

impl AnimationEngine {
    /// Property-panel edit. Returns the merged object.
    pub fn update_object(&mut self, id: u32, params: &Value) -> EngineResult<&SceneObject> {
        let current = self.scene.object(id).ok_or(EngineError::ObjectNotFound(id))?;
        let merged = merge_object(current, params)?;
        let slot = self.scene.require_mut(id)?;
        *slot = merged;
        if params.get("visible").is_some() {
            self.prune_effect_tasks();
        }
        self.scene.object(id).ok_or(EngineError::ObjectNotFound(id))
    }

    fn dispatch(&mut self, action: &str, params: &Value) -> EngineResult<Value> {
        match action {
            "create" => {
                let shape: Shape = serde_json::from_value(json!({
                    "type": params["type"],
                    "data": params.get("data").cloned().unwrap_or_else(|| json!({})),
                }))
                .map_err(|e| EngineError::InvalidCommand(e.to_string()))?;
                let label = format!("Add {}", shape.kind_name());
                let x = params["x"].as_f64().unwrap_or(0.0);
                let y = params["y"].as_f64().unwrap_or(0.0);
                let id = self.create_object(x, y, shape);
                self.save_state(&label);
                Ok(json!({ "id": id }))
            }
            "update" => {
                let ids = param_ids(params).unwrap_or_else(|| param_id(params, "id").map(|id| vec![id]))?;
                let merged = ids
                    .iter()
                    .map(|&id| {
                        let current = self.scene.object(id).ok_or(EngineError::ObjectNotFound(id))?;
                        merge_object(current, params)
                    })
                    .collect::<EngineResult<Vec<_>>>()?;
                for obj in merged {
                    self.replace_object(obj);
                }
                if params.get("visible").is_some() {
                    self.prune_effect_tasks();
                }
                if params["save_undo"].as_bool().unwrap_or(true) {
                    self.save_state("Update Object");
                }
                Ok(json!({}))
            }
            "delete" => {
                let removed = match param_ids(params).transpose()? {
                    Some(ids) => {
                        self.scene.selection.select_many(&ids);
                        self.delete_selected()
                    }
                    None => usize::from(self.delete_object(param_id(params, "id")?)),
                };
                if removed == 0 {
                    return Err(EngineError::NoSelection);
                }
                Ok(json!({ "removed": removed }))
            }
            "duplicate" => {
                let id = self.scene.duplicate_object(param_id(params, "id")?)?;
                self.save_state("Duplicate Object");
                Ok(json!({ "id": id }))
            }
            "copy" => {
                let id = match params.get("id").filter(|v| !v.is_null()) {
                    Some(v) => as_id(v)?,
                    None => self.scene.selection.primary().ok_or(EngineError::NoSelection)?,
                };
                self.scene.copy_object(id)?;
                Ok(json!({}))
            }
            "paste" => {
                let id = self.scene.paste_object().ok_or(EngineError::NoSelection)?;
                self.save_state("Paste Object");
                Ok(json!({ "id": id }))
            }
            "select" => {
                if let Some(ids) = param_ids(params).transpose()? {
                    self.scene.selection.select_many(&ids);
                } else if params.get("id").is_some_and(|v| !v.is_null()) {
                    self.scene.selection.select_only(param_id(params, "id")?);
                } else {
                    self.scene.selection.clear();
                }
                Ok(json!({ "ids": self.scene.selection.ids() }))
            }
            "toggle_select" => {
                self.scene.selection.toggle(param_id(params, "id")?);
                Ok(json!({ "ids": self.scene.selection.ids() }))
            }
            "group" => {
                let name = params["name"].as_str();
                let id = match param_ids(params).transpose()? {
                    Some(ids) => self.group_objects(&ids, name)?,
                    None => self.group_selected(name)?,
                };
                Ok(json!({ "id": id }))
            }
            "ungroup" => {
                let ids = self.ungroup(param_id(params, "id")?)?;
                Ok(json!({ "ids": ids }))
            }
            "move_to_front" | "move_to_back" | "move_up" | "move_down" => {
                let id = param_id(params, "id")?;
                let moved = match action {
                    "move_to_front" => self.scene.move_to_front(id),
                    "move_to_back" => self.scene.move_to_back(id),
                    "move_up" => self.scene.move_up(id),
                    _ => self.scene.move_down(id),
                };
                if moved {
                    self.save_state("Reorder");
                }
                Ok(json!({ "moved": moved }))
            }
            "move_layer" => {
                let moved = self.scene.move_layer(param_id(params, "dragged")?, param_id(params, "target")?);
                if moved {
                    self.save_state("Reorder");
                }
                Ok(json!({ "moved": moved }))
            }
            "toggle_mask" => {
                let is_mask = self.scene.toggle_mask(param_id(params, "id")?)?;
                self.save_state("Toggle Mask");
                Ok(json!({ "isMask": is_mask }))
            }
            "cycle_transparency" => {
                let opacity = self.scene.cycle_transparency(param_id(params, "id")?)?;
                self.save_state("Transparency");
                Ok(json!({ "opacity": opacity }))
            }
            "set_visible" => {
                let visible = params["visible"].as_bool().unwrap_or(true);
                self.set_object_visible(param_id(params, "id")?, visible)?;
                Ok(json!({ "visible": visible }))
            }
            "rename" => {
                let name = params["name"].as_str().unwrap_or_default();
                self.scene.rename_object(param_id(params, "id")?, name)?;
                self.save_state("Rename Object");
                Ok(json!({}))
            }
            "add_frame" => {
                self.abort_gesture();
                let index = self.scene.add_frame();
                self.prune_effect_tasks();
                self.save_state("Add Frame");
                Ok(json!({ "index": index }))
            }
            "remove_frame" => {
                let index = param_index_or(params, "index", self.scene.current_frame)?;
                self.abort_gesture();
                self.scene.remove_frame(index)?;
                self.prune_effect_tasks();
                self.save_state("Delete Frame");
                Ok(json!({ "current": self.scene.current_frame }))
            }
            "move_frame" => {
                self.scene.move_frame(param_index(params, "from")?, param_index(params, "to")?)?;
                self.save_state("Move Frame");
                Ok(json!({ "current": self.scene.current_frame }))
            }
            "go_to_frame" => {
                self.go_to_frame(param_index(params, "index")?)?;
                Ok(json!({ "current": self.scene.current_frame }))
            }
            "next_frame" => {
                self.go_to_frame(self.scene.next_frame_index())?;
                Ok(json!({ "current": self.scene.current_frame }))
            }
            "previous_frame" => {
                self.go_to_frame(self.scene.previous_frame_index())?;
                Ok(json!({ "current": self.scene.current_frame }))
            }
            "rename_frame" => {
                let index = param_index(params, "index")?;
                self.scene.rename_frame(index, params["name"].as_str().unwrap_or_default())?;
                self.save_state("Rename Frame");
                Ok(json!({}))
            }
            "copy_frame" => {
                let index = param_index_or(params, "index", self.scene.current_frame)?;
                self.scene.copy_frame(index)?;
                Ok(json!({}))
            }
            "paste_frame" => {
                self.abort_gesture();
                let index = self
                    .scene
                    .paste_frame()
                    .ok_or_else(|| EngineError::InvalidCommand("frame clipboard is empty".to_string()))?;
                self.prune_effect_tasks();
                self.save_state("Paste Frame");
                Ok(json!({ "index": index }))
            }
            "set_frame_background" => {
                let color = params["color"].as_str().map(str::to_string);
                if params["all"].as_bool().unwrap_or(false) {
                    let color = color.ok_or_else(|| EngineError::InvalidCommand("missing 'color'".to_string()))?;
                    self.scene.set_all_backgrounds(&color);
                } else {
                    let index = param_index_or(params, "index", self.scene.current_frame)?;
                    self.scene.set_frame_background(index, color)?;
                }
                self.save_state("Frame Background");
                Ok(json!({}))
            }
            "generate_effect" => {
                let effect: EffectParams =
                    serde_json::from_value(params.clone()).map_err(|e| EngineError::InvalidCommand(e.to_string()))?;
                let add_frames = params["addFrames"].as_bool().unwrap_or(false);
                let (id, handle) = self.generate_effect(effect, add_frames);
                Ok(json!({ "id": id, "handle": handle }))
            }
            "cancel_effect" => {
                let handle = params["handle"]
                    .as_u64()
                    .ok_or_else(|| EngineError::InvalidCommand("missing 'handle'".to_string()))?;
                Ok(json!({ "cancelled": self.cancel_effect(EffectHandle(handle)) }))
            }
            "set_tool" => {
                let tool = params["tool"].as_str().unwrap_or_default();
                if !self.set_tool(tool) {
                    return Err(EngineError::InvalidCommand(format!("unknown tool '{}'", tool)));
                }
                Ok(json!({}))
            }
            "undo" => Ok(json!({ "changed": self.undo() })),
            "redo" => Ok(json!({ "changed": self.redo() })),
            _ => Err(EngineError::InvalidCommand(format!("Unknown action: {}", action))),
        }
    }
}

#[wasm_bindgen]
impl AnimationEngine {
    /// JSON command entry point: `{"action": "...", "params": {...}}`.
    /// Answers `{"success": true, ...}` or `{"error": "..."}`.
    pub fn execute_command(&mut self, cmd_json: &str) -> String {
        #[derive(Deserialize)]
        struct Command {
            action: String,
            #[serde(default)]
            params: Value,
        }

        let cmd: Command = match serde_json::from_str(cmd_json) {
            Ok(c) => c,
            Err(e) => return EngineError::InvalidCommand(e.to_string()).to_json(),
        };

        match self.dispatch(&cmd.action, &cmd.params) {
            Ok(mut reply) => {
                if let Some(map) = reply.as_object_mut() {
                    map.insert("success".to_string(), Value::Bool(true));
                }
                reply.to_string()
            }
            Err(e) => {
                log::debug!("command '{}' rejected: {}", cmd.action, e);
                e.to_json()
            }
        }
    }

    /// Properties-panel edit from JS. Pushes a history entry on success.
    pub fn update_object_json(&mut self, id: u32, params_json: &str) -> String {
        let params: Value = match serde_json::from_str(params_json) {
            Ok(v) => v,
            Err(e) => return EngineError::InvalidCommand(e.to_string()).to_json(),
        };
        let reply = match self.update_object(id, &params) {
            Ok(obj) => serde_json::to_string(obj).map_err(|e| EngineError::InvalidCommand(e.to_string())),
            Err(e) => Err(e),
        };
        match reply {
            Ok(obj) => {
                self.save_state("Update Object");
                obj
            }
            Err(e) => e.to_json(),
        }
    }

    pub fn get_object(&self, id: u32) -> String {
        self.object_json(id).unwrap_or_else(|e| e.to_json())
    }
}
