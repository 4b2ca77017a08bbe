use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub enum HandleType {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
    Rotate,
    LineStart,
    LineEnd,
}

impl HandleType {
    pub const CORNERS: [HandleType; 4] = [
        HandleType::TopLeft,
        HandleType::TopRight,
        HandleType::BottomRight,
        HandleType::BottomLeft,
    ];
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    #[default]
    Move,
    Bone,
    Pencil,
    Eraser,
    Line,
    Circle,
    Semicircle,
    Square,
    Triangle,
    Star,
    Arrow,
    Text,
    FloodFill,
    ZoomIn,
    ZoomOut,
    ZoomReset,
}

impl Tool {
    pub fn parse(name: &str) -> Option<Tool> {
        serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
    }

    /// Tools that commit a shape on pointer-up after a drag.
    pub fn is_shape_tool(self) -> bool {
        matches!(
            self,
            Tool::Line | Tool::Circle | Tool::Semicircle | Tool::Square | Tool::Triangle | Tool::Star | Tool::Arrow
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    pub fn from_index(button: u8) -> PointerButton {
        match button {
            1 => PointerButton::Middle,
            2 => PointerButton::Secondary,
            _ => PointerButton::Primary,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    Fire,
    Rain,
    Snow,
}

impl EffectKind {
    pub fn base_count(self) -> f64 {
        match self {
            EffectKind::Fire => 40.0,
            EffectKind::Rain => 60.0,
            EffectKind::Snow => 50.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EffectKind::Fire => "Fire",
            EffectKind::Rain => "Rain",
            EffectKind::Snow => "Snow",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Light,
    #[default]
    Medium,
    Heavy,
    Custom,
}

impl Intensity {
    pub fn multiplier(self) -> f64 {
        match self {
            Intensity::Light => 0.8,
            Intensity::Medium => 1.5,
            Intensity::Heavy => 2.8,
            Intensity::Custom => 2.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum EffectSize {
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum Wind {
    #[default]
    None,
    Left,
    Right,
}

impl Wind {
    pub fn sign(self) -> f64 {
        match self {
            Wind::None => 0.0,
            Wind::Left => -1.0,
            Wind::Right => 1.0,
        }
    }
}
