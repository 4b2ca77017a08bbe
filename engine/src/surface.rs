use serde::Serialize;

/// Colour or gradient used for fills and strokes. Gradient coordinates are
/// in the current transform's space.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Paint {
    Solid { color: String },
    Linear { x0: f64, y0: f64, x1: f64, y1: f64, stops: Vec<(f64, String)> },
    Radial { x0: f64, y0: f64, r0: f64, x1: f64, y1: f64, r1: f64, stops: Vec<(f64, String)> },
}

impl Paint {
    pub fn solid(color: &str) -> Paint {
        Paint::Solid { color: color.to_string() }
    }
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeOp {
    SourceOver,
    /// Keeps existing content only where the new drawing lands (masks).
    DestinationIn,
    /// Punches out existing content (erasers).
    DestinationOut,
}

impl CompositeOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompositeOp::SourceOver => "source-over",
            CompositeOp::DestinationIn => "destination-in",
            CompositeOp::DestinationOut => "destination-out",
        }
    }
}

/// A canvas-like sink for draw calls. The browser canvas context and the
/// command recorder both implement it so exports and tests see exactly what
/// the screen sees.
pub trait Surface {
    fn width(&self) -> f64;
    fn height(&self) -> f64;

    fn save(&mut self);
    fn restore(&mut self);
    fn reset_transform(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, angle: f64);
    fn scale(&mut self, sx: f64, sy: f64);

    /// Clears the whole surface regardless of the current transform.
    fn clear(&mut self);

    fn set_global_alpha(&mut self, alpha: f64);
    fn set_composite(&mut self, op: CompositeOp);
    fn set_fill(&mut self, paint: &Paint);
    fn set_stroke(&mut self, paint: &Paint);
    fn set_line_width(&mut self, width: f64);
    fn set_line_dash(&mut self, dash: &[f64]);
    fn set_round_caps(&mut self);
    fn set_font(&mut self, font: &str);
    fn set_shadow(&mut self, color: &str, blur: f64);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn quadratic_to(&mut self, cx: f64, cy: f64, x: f64, y: f64);
    fn close_path(&mut self);
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn arc(&mut self, cx: f64, cy: f64, r: f64, start: f64, end: f64);
    fn ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, start: f64, end: f64);
    fn fill(&mut self);
    fn stroke(&mut self);

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn fill_text(&mut self, text: &str, x: f64, y: f64);
    fn draw_image(&mut self, src: &str, x: f64, y: f64, w: f64, h: f64);
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawCommand {
    Save,
    Restore,
    ResetTransform,
    Translate { x: f64, y: f64 },
    Rotate { angle: f64 },
    Scale { sx: f64, sy: f64 },
    Clear,
    GlobalAlpha { alpha: f64 },
    Composite { mode: CompositeOp },
    Fill { paint: Paint },
    Stroke { paint: Paint },
    LineWidth { width: f64 },
    LineDash { dash: Vec<f64> },
    RoundCaps,
    Font { font: String },
    Shadow { color: String, blur: f64 },
    BeginPath,
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    QuadraticTo { cx: f64, cy: f64, x: f64, y: f64 },
    ClosePath,
    Rect { x: f64, y: f64, w: f64, h: f64 },
    Arc { cx: f64, cy: f64, r: f64, start: f64, end: f64 },
    Ellipse { cx: f64, cy: f64, rx: f64, ry: f64, start: f64, end: f64 },
    FillPath,
    StrokePath,
    FillRect { x: f64, y: f64, w: f64, h: f64 },
    FillText { text: String, x: f64, y: f64 },
    DrawImage { src: String, x: f64, y: f64, w: f64, h: f64 },
}

/// Records draw calls instead of rasterizing them.
#[derive(Clone, Debug, Default)]
pub struct CommandRecorder {
    pub width: f64,
    pub height: f64,
    pub commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    pub fn new(width: f64, height: f64) -> Self {
        CommandRecorder { width, height, commands: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.commands).unwrap_or_else(|_| "[]".to_string())
    }
}

impl Surface for CommandRecorder {
    fn width(&self) -> f64 { self.width }
    fn height(&self) -> f64 { self.height }

    fn save(&mut self) { self.commands.push(DrawCommand::Save); }
    fn restore(&mut self) { self.commands.push(DrawCommand::Restore); }
    fn reset_transform(&mut self) { self.commands.push(DrawCommand::ResetTransform); }
    fn translate(&mut self, x: f64, y: f64) { self.commands.push(DrawCommand::Translate { x, y }); }
    fn rotate(&mut self, angle: f64) { self.commands.push(DrawCommand::Rotate { angle }); }
    fn scale(&mut self, sx: f64, sy: f64) { self.commands.push(DrawCommand::Scale { sx, sy }); }
    fn clear(&mut self) { self.commands.push(DrawCommand::Clear); }

    fn set_global_alpha(&mut self, alpha: f64) { self.commands.push(DrawCommand::GlobalAlpha { alpha }); }
    fn set_composite(&mut self, mode: CompositeOp) { self.commands.push(DrawCommand::Composite { mode }); }
    fn set_fill(&mut self, paint: &Paint) { self.commands.push(DrawCommand::Fill { paint: paint.clone() }); }
    fn set_stroke(&mut self, paint: &Paint) { self.commands.push(DrawCommand::Stroke { paint: paint.clone() }); }
    fn set_line_width(&mut self, width: f64) { self.commands.push(DrawCommand::LineWidth { width }); }
    fn set_line_dash(&mut self, dash: &[f64]) { self.commands.push(DrawCommand::LineDash { dash: dash.to_vec() }); }
    fn set_round_caps(&mut self) { self.commands.push(DrawCommand::RoundCaps); }
    fn set_font(&mut self, font: &str) { self.commands.push(DrawCommand::Font { font: font.to_string() }); }
    fn set_shadow(&mut self, color: &str, blur: f64) {
        self.commands.push(DrawCommand::Shadow { color: color.to_string(), blur });
    }

    fn begin_path(&mut self) { self.commands.push(DrawCommand::BeginPath); }
    fn move_to(&mut self, x: f64, y: f64) { self.commands.push(DrawCommand::MoveTo { x, y }); }
    fn line_to(&mut self, x: f64, y: f64) { self.commands.push(DrawCommand::LineTo { x, y }); }
    fn quadratic_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.commands.push(DrawCommand::QuadraticTo { cx, cy, x, y });
    }
    fn close_path(&mut self) { self.commands.push(DrawCommand::ClosePath); }
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64) { self.commands.push(DrawCommand::Rect { x, y, w, h }); }
    fn arc(&mut self, cx: f64, cy: f64, r: f64, start: f64, end: f64) {
        self.commands.push(DrawCommand::Arc { cx, cy, r, start, end });
    }
    fn ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, start: f64, end: f64) {
        self.commands.push(DrawCommand::Ellipse { cx, cy, rx, ry, start, end });
    }
    fn fill(&mut self) { self.commands.push(DrawCommand::FillPath); }
    fn stroke(&mut self) { self.commands.push(DrawCommand::StrokePath); }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) { self.commands.push(DrawCommand::FillRect { x, y, w, h }); }
    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.commands.push(DrawCommand::FillText { text: text.to_string(), x, y });
    }
    fn draw_image(&mut self, src: &str, x: f64, y: f64, w: f64, h: f64) {
        self.commands.push(DrawCommand::DrawImage { src: src.to_string(), x, y, w, h });
    }
}
