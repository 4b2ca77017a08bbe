use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::engine::AnimationEngine;
use crate::error::{EngineError, EngineResult};
use crate::scene::{Frame, Scene};

/// On-disk project layout.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub frames: Vec<Frame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas_height: Option<f64>,
}

impl ProjectFile {
    /// Parses and validates a project. Nothing is applied on failure.
    pub fn parse(json: &str) -> EngineResult<ProjectFile> {
        let project: ProjectFile = serde_json::from_str(json)?;
        if project.frames.is_empty() {
            return Err(EngineError::InvalidProject("project has no frames".to_string()));
        }
        for size in [project.canvas_width, project.canvas_height].into_iter().flatten() {
            if !size.is_finite() || size <= 0.0 {
                return Err(EngineError::InvalidProject(format!("invalid canvas size {}", size)));
            }
        }
        Ok(project)
    }
}

impl AnimationEngine {
    pub fn project(&self) -> ProjectFile {
        ProjectFile {
            frames: self.scene.frames.clone(),
            canvas_width: Some(self.config.canvas_width),
            canvas_height: Some(self.config.canvas_height),
        }
    }

    /// Replaces the whole scene with `json`. The current scene survives any
    /// parse or validation error.
    pub fn load_project_json(&mut self, json: &str) -> EngineResult<usize> {
        let project = ProjectFile::parse(json)?;
        self.effects.cancel_all();
        self.transform.cancel();
        self.drawing = Default::default();
        self.playback.stop();

        if let Some(w) = project.canvas_width {
            self.config.canvas_width = w;
        }
        if let Some(h) = project.canvas_height {
            self.config.canvas_height = h;
        }
        let mut scene = Scene::new();
        scene.restore_frames(project.frames);
        scene.current_frame = 0;
        scene.renumber_ids();
        self.scene = scene;
        self.history.reset("Load Project", self.scene.frames.clone());

        let count = self.scene.object_count();
        log::info!("loaded project: {} frames, {} objects", self.scene.frames.len(), count);
        Ok(self.scene.frames.len())
    }

    pub fn reset_project(&mut self) {
        self.effects.cancel_all();
        self.transform.cancel();
        self.drawing = Default::default();
        self.playback.stop();
        self.scene = Scene::new();
        self.history.reset("Initial State", self.scene.frames.clone());
        log::info!("new project");
    }
}

#[wasm_bindgen]
impl AnimationEngine {
    pub fn save_project(&self) -> String {
        serde_json::to_string(&self.project()).unwrap_or_else(|e| EngineError::InvalidProject(e.to_string()).to_json())
    }

    /// Returns `{"success": true, "frames": n}` or `{"error": ...}`.
    pub fn load_project(&mut self, json: &str) -> String {
        match self.load_project_json(json) {
            Ok(frames) => serde_json::json!({ "success": true, "frames": frames }).to_string(),
            Err(e) => {
                log::warn!("{}", e);
                e.to_json()
            }
        }
    }

    pub fn new_project(&mut self) {
        self.reset_project();
    }
}
