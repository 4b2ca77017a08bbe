use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::objects::{GroupData, SceneObject, Shape};

/// Offset applied to duplicated and pasted objects.
pub const PASTE_OFFSET: f64 = 20.0;
/// Opacity steps for the transparency toggle.
pub const TRANSPARENCY_LEVELS: [f64; 4] = [1.0, 0.75, 0.5, 0.25];

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    #[serde(default)]
    pub objects: Vec<SceneObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Frame {
    pub fn named(name: String) -> Self {
        Frame { objects: Vec::new(), background_color: None, name: Some(name) }
    }

    pub fn index_of(&self, id: u32) -> Option<usize> {
        self.objects.iter().position(|o| o.id == id)
    }

    pub fn get(&self, id: u32) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Topmost visible object under `p`.
    pub fn find_object_at_position(&self, p: Point) -> Option<&SceneObject> {
        self.objects.iter().rev().filter(|o| o.visible).find(|o| o.hit_test(p))
    }
}

/// Selected ids in selection order plus the primary id that drives the
/// handles and the properties panel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    ids: Vec<u32>,
    primary: Option<u32>,
}

impl Selection {
    pub fn primary(&self) -> Option<u32> {
        self.primary
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn contains(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn select_only(&mut self, id: u32) {
        self.ids.clear();
        self.ids.push(id);
        self.primary = Some(id);
    }

    pub fn select_many(&mut self, ids: &[u32]) {
        self.ids = ids.to_vec();
        self.primary = ids.last().copied();
    }

    /// Shift-click: adds or drops `id` from the set.
    pub fn toggle(&mut self, id: u32) {
        if let Some(pos) = self.ids.iter().position(|&x| x == id) {
            self.ids.remove(pos);
            if self.primary == Some(id) {
                self.primary = self.ids.last().copied();
            }
        } else {
            self.ids.push(id);
            self.primary = Some(id);
        }
    }

    pub fn remove(&mut self, id: u32) {
        self.ids.retain(|&x| x != id);
        if self.primary == Some(id) {
            self.primary = self.ids.last().copied();
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.primary = None;
    }
}

/// Frames, the active frame pointer, selection and id bookkeeping.
#[derive(Clone, Debug)]
pub struct Scene {
    pub frames: Vec<Frame>,
    pub current_frame: usize,
    pub selection: Selection,
    next_id: u32,
    group_counter: u32,
    object_clipboard: Option<SceneObject>,
    frame_clipboard: Option<Frame>,
}

impl Default for Scene {
    fn default() -> Self {
        Scene::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Scene {
            frames: vec![Frame::named("Frame 1".to_string())],
            current_frame: 0,
            selection: Selection::default(),
            next_id: 0,
            group_counter: 0,
            object_clipboard: None,
            frame_clipboard: None,
        }
    }

    pub fn allocate_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Highest id handed out so far.
    pub fn last_id(&self) -> u32 {
        self.next_id
    }

    pub fn current(&self) -> &Frame {
        &self.frames[self.current_frame]
    }

    pub fn current_mut(&mut self) -> &mut Frame {
        &mut self.frames[self.current_frame]
    }

    pub fn object(&self, id: u32) -> Option<&SceneObject> {
        self.current().get(id)
    }

    pub fn object_mut(&mut self, id: u32) -> Option<&mut SceneObject> {
        self.current_mut().get_mut(id)
    }

    pub fn require_mut(&mut self, id: u32) -> EngineResult<&mut SceneObject> {
        self.object_mut(id).ok_or(EngineError::ObjectNotFound(id))
    }

    pub fn primary_object(&self) -> Option<&SceneObject> {
        self.selection.primary().and_then(|id| self.object(id))
    }

    pub fn find_object_at_position(&self, p: Point) -> Option<u32> {
        self.current().find_object_at_position(p).map(|o| o.id)
    }

    // ---- objects ----

    /// Appends a new object to the current frame and selects it.
    pub fn create_object(&mut self, x: f64, y: f64, shape: Shape) -> u32 {
        let id = self.allocate_id();
        log::debug!("create {} {}", shape.kind_name(), id);
        self.current_mut().objects.push(SceneObject::new(id, x, y, shape));
        self.selection.select_only(id);
        id
    }

    /// Appends an already built object (ids assigned by the caller).
    pub fn insert_object(&mut self, obj: SceneObject) -> u32 {
        let id = obj.id;
        self.current_mut().objects.push(obj);
        self.selection.select_only(id);
        id
    }

    pub fn delete_object(&mut self, id: u32) -> Option<SceneObject> {
        let index = self.current().index_of(id)?;
        let removed = self.current_mut().objects.remove(index);
        self.selection.remove(id);
        log::debug!("delete {} {}", removed.kind_name(), id);
        Some(removed)
    }

    pub fn delete_selected(&mut self) -> Vec<SceneObject> {
        let ids = self.selection.ids().to_vec();
        ids.into_iter().filter_map(|id| self.delete_object(id)).collect()
    }

    /// Deep-copies the named objects into a new group that replaces them.
    /// Children keep frame order; ids not in the current frame are ignored.
    pub fn group_objects(&mut self, ids: &[u32], name: Option<&str>) -> EngineResult<u32> {
        let frame = self.current();
        let found = frame.objects.iter().filter(|o| ids.contains(&o.id)).count();
        if found < 2 {
            return Err(EngineError::GroupNeedsTwoObjects);
        }

        self.group_counter += 1;
        let name = match name {
            Some(n) if !n.trim().is_empty() => n.to_string(),
            _ => format!("Group {}", self.group_counter),
        };
        let id = self.allocate_id();

        let frame = self.current_mut();
        let (children, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut frame.objects)
            .into_iter()
            .partition(|o| ids.contains(&o.id));
        frame.objects = rest;

        let mut group = SceneObject::new(
            id,
            0.0,
            0.0,
            Shape::Group(GroupData { objects: children, expanded: true, effect: None }),
        );
        group.name = Some(name);
        frame.objects.push(group);
        self.selection.select_only(id);
        log::info!("grouped {} objects into {}", found, id);
        Ok(id)
    }

    /// Replaces a group by its children at the group's z position. Children
    /// absorb the group offset.
    pub fn ungroup(&mut self, id: u32) -> EngineResult<Vec<u32>> {
        let index = self.current().index_of(id).ok_or(EngineError::ObjectNotFound(id))?;
        if !self.current().objects[index].is_group() {
            return Err(EngineError::InvalidCommand(format!("object {} is not a group", id)));
        }
        let group = self.current_mut().objects.remove(index);
        let (dx, dy) = (group.x, group.y);
        let mut children = match group.shape {
            Shape::Group(g) => g.objects,
            _ => Vec::new(),
        };
        for child in &mut children {
            child.x += dx;
            child.y += dy;
        }
        let ids: Vec<u32> = children.iter().map(|c| c.id).collect();
        self.current_mut().objects.splice(index..index, children);
        self.selection.select_many(&ids);
        Ok(ids)
    }

    fn clone_with_fresh_ids(&mut self, source: &SceneObject) -> SceneObject {
        let mut copy = source.clone();
        let mut assign = |o: &mut SceneObject| o.id = self.allocate_id();
        copy.walk_mut(&mut assign);
        copy
    }

    pub fn duplicate_object(&mut self, id: u32) -> EngineResult<u32> {
        let source = self.object(id).cloned().ok_or(EngineError::ObjectNotFound(id))?;
        let mut copy = self.clone_with_fresh_ids(&source);
        copy.x += PASTE_OFFSET;
        copy.y += PASTE_OFFSET;
        Ok(self.insert_object(copy))
    }

    pub fn copy_object(&mut self, id: u32) -> EngineResult<()> {
        let source = self.object(id).cloned().ok_or(EngineError::ObjectNotFound(id))?;
        self.object_clipboard = Some(source);
        Ok(())
    }

    /// Pastes the clipboard object into the current frame. `None` when the
    /// clipboard is empty.
    pub fn paste_object(&mut self) -> Option<u32> {
        let source = self.object_clipboard.clone()?;
        let mut copy = self.clone_with_fresh_ids(&source);
        copy.x += PASTE_OFFSET;
        copy.y += PASTE_OFFSET;
        Some(self.insert_object(copy))
    }

    pub fn has_object_clipboard(&self) -> bool {
        self.object_clipboard.is_some()
    }

    pub fn toggle_mask(&mut self, id: u32) -> EngineResult<bool> {
        let obj = self.require_mut(id)?;
        obj.is_mask = !obj.is_mask;
        Ok(obj.is_mask)
    }

    /// Steps opacity through 1, .75, .5, .25 and back to 1.
    pub fn cycle_transparency(&mut self, id: u32) -> EngineResult<f64> {
        let obj = self.require_mut(id)?;
        let next = match TRANSPARENCY_LEVELS.iter().position(|&l| (l - obj.opacity).abs() < 1e-9) {
            Some(i) => TRANSPARENCY_LEVELS[(i + 1) % TRANSPARENCY_LEVELS.len()],
            None => TRANSPARENCY_LEVELS[1],
        };
        obj.opacity = next;
        Ok(next)
    }

    pub fn set_visible(&mut self, id: u32, visible: bool) -> EngineResult<()> {
        self.require_mut(id)?.visible = visible;
        Ok(())
    }

    pub fn rename_object(&mut self, id: u32, name: &str) -> EngineResult<()> {
        self.require_mut(id)?.name = Some(name.to_string());
        Ok(())
    }

    /// Flood-fill recolouring: the fill colour with `fill`, the stroke
    /// colour otherwise. Returns false for kinds without a style.
    pub fn recolor(&mut self, id: u32, color: &str, fill: bool) -> EngineResult<bool> {
        let obj = self.require_mut(id)?;
        let Some(style) = obj.shape.style_mut() else {
            return Ok(false);
        };
        if fill {
            style.fill_color = Some(color.to_string());
        } else {
            style.color = Some(color.to_string());
        }
        Ok(true)
    }

    // ---- ordering ----

    pub fn move_to_front(&mut self, id: u32) -> bool {
        let objects = &mut self.current_mut().objects;
        match objects.iter().position(|o| o.id == id) {
            Some(i) => {
                let obj = objects.remove(i);
                objects.push(obj);
                true
            }
            None => false,
        }
    }

    pub fn move_to_back(&mut self, id: u32) -> bool {
        let objects = &mut self.current_mut().objects;
        match objects.iter().position(|o| o.id == id) {
            Some(i) => {
                let obj = objects.remove(i);
                objects.insert(0, obj);
                true
            }
            None => false,
        }
    }

    pub fn move_up(&mut self, id: u32) -> bool {
        let objects = &mut self.current_mut().objects;
        match objects.iter().position(|o| o.id == id) {
            Some(i) if i + 1 < objects.len() => {
                objects.swap(i, i + 1);
                true
            }
            _ => false,
        }
    }

    pub fn move_down(&mut self, id: u32) -> bool {
        let objects = &mut self.current_mut().objects;
        match objects.iter().position(|o| o.id == id) {
            Some(i) if i > 0 => {
                objects.swap(i, i - 1);
                true
            }
            _ => false,
        }
    }

    /// Layer-panel drag: removes `dragged` and reinserts it at the index
    /// `target` occupied.
    pub fn move_layer(&mut self, dragged: u32, target: u32) -> bool {
        let objects = &mut self.current_mut().objects;
        let from = objects.iter().position(|o| o.id == dragged);
        let to = objects.iter().position(|o| o.id == target);
        match (from, to) {
            (Some(from), Some(to)) if from != to => {
                let obj = objects.remove(from);
                objects.insert(to, obj);
                true
            }
            _ => false,
        }
    }

    // ---- frames ----

    pub fn add_frame(&mut self) -> usize {
        let name = format!("Frame {}", self.frames.len() + 1);
        self.frames.push(Frame::named(name));
        self.current_frame = self.frames.len() - 1;
        self.selection.clear();
        self.current_frame
    }

    pub fn remove_frame(&mut self, index: usize) -> EngineResult<()> {
        if self.frames.len() <= 1 {
            return Err(EngineError::LastFrame);
        }
        if index >= self.frames.len() {
            return Err(EngineError::FrameOutOfRange(index));
        }
        self.frames.remove(index);
        if self.current_frame >= self.frames.len() {
            self.current_frame = self.frames.len() - 1;
        } else if index < self.current_frame {
            self.current_frame -= 1;
        }
        self.selection.clear();
        Ok(())
    }

    /// Reorders frames; the current frame pointer keeps following the frame
    /// it pointed at.
    pub fn move_frame(&mut self, from: usize, to: usize) -> EngineResult<()> {
        let len = self.frames.len();
        if from >= len {
            return Err(EngineError::FrameOutOfRange(from));
        }
        if to >= len {
            return Err(EngineError::FrameOutOfRange(to));
        }
        if from == to {
            return Ok(());
        }
        let frame = self.frames.remove(from);
        self.frames.insert(to, frame);

        let current = self.current_frame;
        if current == from {
            self.current_frame = to;
        } else if from < current && to >= current {
            self.current_frame -= 1;
        } else if from > current && to <= current {
            self.current_frame += 1;
        }
        Ok(())
    }

    pub fn load_frame(&mut self, index: usize) -> EngineResult<()> {
        if index >= self.frames.len() {
            return Err(EngineError::FrameOutOfRange(index));
        }
        self.current_frame = index;
        self.selection.clear();
        Ok(())
    }

    pub fn next_frame_index(&self) -> usize {
        (self.current_frame + 1) % self.frames.len()
    }

    pub fn previous_frame_index(&self) -> usize {
        (self.current_frame + self.frames.len() - 1) % self.frames.len()
    }

    pub fn rename_frame(&mut self, index: usize, name: &str) -> EngineResult<()> {
        let frame = self.frames.get_mut(index).ok_or(EngineError::FrameOutOfRange(index))?;
        frame.name = Some(name.to_string());
        Ok(())
    }

    pub fn copy_frame(&mut self, index: usize) -> EngineResult<()> {
        let frame = self.frames.get(index).ok_or(EngineError::FrameOutOfRange(index))?;
        self.frame_clipboard = Some(frame.clone());
        Ok(())
    }

    /// Inserts a copy of the clipboard frame after the current one and makes
    /// it current. Every object gets a fresh id.
    pub fn paste_frame(&mut self) -> Option<usize> {
        let mut frame = self.frame_clipboard.clone()?;
        for obj in &mut frame.objects {
            let mut assign = |o: &mut SceneObject| o.id = self.allocate_id();
            obj.walk_mut(&mut assign);
        }
        let index = self.current_frame + 1;
        self.frames.insert(index, frame);
        self.current_frame = index;
        self.selection.clear();
        Some(index)
    }

    pub fn set_frame_background(&mut self, index: usize, color: Option<String>) -> EngineResult<()> {
        let frame = self.frames.get_mut(index).ok_or(EngineError::FrameOutOfRange(index))?;
        frame.background_color = color;
        Ok(())
    }

    pub fn set_all_backgrounds(&mut self, color: &str) {
        for frame in &mut self.frames {
            frame.background_color = Some(color.to_string());
        }
    }

    // ---- whole scene ----

    /// Swaps in a frame array (undo, redo, load) and clamps the pointer.
    pub fn restore_frames(&mut self, frames: Vec<Frame>) {
        self.frames = if frames.is_empty() { vec![Frame::named("Frame 1".to_string())] } else { frames };
        self.current_frame = self.current_frame.min(self.frames.len() - 1);
        self.selection.clear();
    }

    /// Reassigns every id depth-first from a fresh counter.
    pub fn renumber_ids(&mut self) {
        let mut counter = 0;
        for frame in &mut self.frames {
            for obj in &mut frame.objects {
                obj.walk_mut(&mut |o: &mut SceneObject| {
                    counter += 1;
                    o.id = counter;
                });
            }
        }
        self.next_id = counter;
    }

    pub fn object_count(&self) -> usize {
        self.frames.iter().flat_map(|f| &f.objects).map(SceneObject::count_objects).sum()
    }
}
