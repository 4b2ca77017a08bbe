use kurbo::Point;
use serde::Serialize;

use crate::effects::{self, EffectParams};
use crate::objects::SceneObject;

/// Cancellation token for one running effect animation.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EffectHandle(pub u64);

#[derive(Clone, Debug)]
struct EffectTask {
    handle: EffectHandle,
    group_id: u32,
    params: EffectParams,
    interval_ms: f64,
    next_due_ms: f64,
    counter: u64,
}

/// Timer-driven regeneration of effect groups. Tasks are owned here and
/// only ever advanced from `tick`, so cancelling is a synchronous removal.
#[derive(Clone, Debug, Default)]
pub struct EffectAnimator {
    tasks: Vec<EffectTask>,
    next_handle: u64,
}

impl EffectAnimator {
    pub fn spawn(&mut self, group_id: u32, params: &EffectParams, now_ms: f64) -> EffectHandle {
        self.next_handle += 1;
        let handle = EffectHandle(self.next_handle);
        let interval_ms = params.interval_ms();
        self.tasks.push(EffectTask {
            handle,
            group_id,
            params: params.clone(),
            interval_ms,
            next_due_ms: now_ms + interval_ms,
            counter: 1,
        });
        log::debug!("effect task {:?} started for group {} every {}ms", handle, group_id, interval_ms);
        handle
    }

    pub fn cancel(&mut self, handle: EffectHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.handle != handle);
        let cancelled = self.tasks.len() != before;
        if cancelled {
            log::debug!("effect task {:?} cancelled", handle);
        }
        cancelled
    }

    pub fn cancel_group(&mut self, group_id: u32) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.group_id != group_id);
        before != self.tasks.len()
    }

    pub fn cancel_all(&mut self) {
        if !self.tasks.is_empty() {
            log::debug!("cancelling {} effect tasks", self.tasks.len());
        }
        self.tasks.clear();
    }

    /// Drops every task whose group is not a visible top-level object of
    /// `objects`.
    pub fn retain_live(&mut self, objects: &[SceneObject]) {
        self.tasks.retain(|t| {
            let live = objects.iter().any(|o| o.id == t.group_id && o.visible && o.is_group());
            if !live {
                log::debug!("effect task {:?} stopped: group {} left the frame", t.handle, t.group_id);
            }
            live
        });
    }

    pub fn is_running(&self, handle: EffectHandle) -> bool {
        self.tasks.iter().any(|t| t.handle == handle)
    }

    pub fn handle_for(&self, group_id: u32) -> Option<EffectHandle> {
        self.tasks.iter().find(|t| t.group_id == group_id).map(|t| t.handle)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Advances every due task once. Returns true if any particle moved.
    pub fn tick(&mut self, now_ms: f64, objects: &mut [SceneObject], canvas_width: f64, fire_anchor: Point) -> bool {
        self.retain_live(objects);
        let mut changed = false;
        for task in &mut self.tasks {
            if now_ms < task.next_due_ms {
                continue;
            }
            let Some(group) = objects.iter_mut().find(|o| o.id == task.group_id) else {
                continue;
            };
            let particles = effects::generate_particles(&task.params, task.counter, canvas_width, fire_anchor);
            changed |= effects::apply_particles(group, &particles);
            task.counter += 1;
            task.next_due_ms = now_ms + task.interval_ms;
        }
        changed
    }
}

/// Frame-advance clock for timeline playback.
#[derive(Clone, Debug)]
pub struct Playback {
    playing: bool,
    fps: f64,
    anchor_ms: Option<f64>,
}

impl Playback {
    pub fn new(fps: f64) -> Self {
        Playback { playing: false, fps, anchor_ms: None }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn start(&mut self) {
        self.playing = true;
        self.anchor_ms = None;
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.anchor_ms = None;
    }

    pub fn toggle(&mut self) -> bool {
        if self.playing { self.stop() } else { self.start() }
        self.playing
    }

    pub fn set_fps(&mut self, fps: f64) {
        if fps > 0.0 {
            self.fps = fps;
        }
    }

    /// True when a frame step is due at `now_ms`. The first call after
    /// `start` only anchors the clock.
    pub fn due(&mut self, now_ms: f64) -> bool {
        if !self.playing {
            return false;
        }
        match self.anchor_ms {
            None => {
                self.anchor_ms = Some(now_ms);
                false
            }
            Some(anchor) if now_ms - anchor >= 1000.0 / self.fps => {
                self.anchor_ms = Some(now_ms);
                true
            }
            Some(_) => false,
        }
    }
}
