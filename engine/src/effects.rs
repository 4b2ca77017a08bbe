use kurbo::Point;
use serde::{Deserialize, Serialize};

use crate::objects::{GroupData, ParticleData, SceneObject, Shape, Style};
use crate::types::{EffectKind, EffectSize, Intensity, Wind};

/// Vertical span particles wrap over before re-entering above the canvas.
const WRAP_SPAN: f64 = 1200.0;
const WRAP_LEAD: f64 = 200.0;

pub const FIRE_COLOR: &str = "#ff4500";
pub const RAIN_COLOR: &str = "#4a90e2";
pub const SNOW_COLOR: &str = "#ffffff";

fn default_speed() -> f64 { 50.0 }

/// Generation parameters stored on an effect group so the animation can be
/// resumed from a saved project.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EffectParams {
    pub effect_type: EffectKind,
    #[serde(default)]
    pub intensity: Intensity,
    #[serde(default = "default_speed")]
    pub speed: f64,
    #[serde(default)]
    pub size: EffectSize,
    #[serde(default)]
    pub wind: Wind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub splash: bool,
    #[serde(default)]
    pub seed: u64,
}

impl EffectParams {
    pub fn new(effect_type: EffectKind) -> Self {
        EffectParams {
            effect_type,
            intensity: Intensity::default(),
            speed: default_speed(),
            size: EffectSize::default(),
            wind: Wind::default(),
            color: None,
            splash: false,
            seed: 0,
        }
    }

    /// Milliseconds between animation steps.
    pub fn interval_ms(&self) -> f64 {
        (150.0 - self.speed).max(50.0)
    }

    pub fn particle_count(&self) -> usize {
        (self.effect_type.base_count() * self.intensity.multiplier()).floor() as usize
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum ParticleKind {
    Flame,
    Raindrop,
    Snowflake,
}

impl ParticleKind {
    /// Height as a multiple of the particle size.
    pub fn aspect(self) -> f64 {
        match self {
            ParticleKind::Raindrop => 3.0,
            ParticleKind::Flame => 2.5,
            ParticleKind::Snowflake => 1.0,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ParticleDescriptor {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub color: String,
    #[serde(rename = "type")]
    pub kind: ParticleKind,
}

/// SplitMix64 stream.
#[derive(Clone, Copy, Debug)]
pub struct Rng64 {
    state: u64,
}

impl Rng64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Stream for one particle lane. The same (seed, index) pair yields the
    /// same draws on every frame.
    pub fn for_particle(seed: u64, index: usize) -> Self {
        Self::new(seed ^ (index as u64).wrapping_mul(0xD6E8_FEB8_6659_FD93))
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    pub fn next_f64_01(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) * (1.0 / ((1u64 << 53) as f64))
    }
}

fn wrapped_y(frame: f64, fall_speed: f64, index: usize, spacing: f64) -> f64 {
    (frame * fall_speed + index as f64 * spacing) % WRAP_SPAN - WRAP_LEAD
}

/// Particle layout for `frame_index`. Pure: identical arguments give
/// identical output.
pub fn generate_particles(params: &EffectParams, frame_index: u64, canvas_width: f64, fire_anchor: Point) -> Vec<ParticleDescriptor> {
    let count = params.particle_count();
    let frame = frame_index as f64;
    let mut particles = Vec::with_capacity(count);

    for i in 0..count {
        let mut rng = Rng64::for_particle(params.seed, i);
        let particle = match params.effect_type {
            EffectKind::Fire => {
                let flame_size = match params.size {
                    EffectSize::Small => 80.0,
                    EffectSize::Medium => 100.0,
                    EffectSize::Large => 150.0,
                };
                ParticleDescriptor {
                    x: fire_anchor.x,
                    y: fire_anchor.y,
                    size: flame_size,
                    color: FIRE_COLOR.to_string(),
                    kind: ParticleKind::Flame,
                }
            }
            EffectKind::Rain => {
                let rain_speed = 5.0 + params.speed / 15.0;
                let wind_offset = params.wind.sign() * frame * 2.0;
                let drop_size = match params.size {
                    EffectSize::Small => 3.0,
                    EffectSize::Medium => 5.0,
                    EffectSize::Large => 8.0,
                };
                ParticleDescriptor {
                    x: rng.next_f64_01() * canvas_width + wind_offset + (frame * 0.1).sin() * 10.0,
                    y: wrapped_y(frame, rain_speed, i, 15.0),
                    size: drop_size + rng.next_f64_01() * 2.0,
                    color: params.color.clone().unwrap_or_else(|| RAIN_COLOR.to_string()),
                    kind: ParticleKind::Raindrop,
                }
            }
            EffectKind::Snow => {
                let snow_speed = 2.0 + params.speed / 25.0;
                let drift = params.wind.sign() * frame * 1.5;
                let flake_size = match params.size {
                    EffectSize::Small => 5.0,
                    EffectSize::Medium => 8.0,
                    EffectSize::Large => 12.0,
                };
                ParticleDescriptor {
                    x: rng.next_f64_01() * canvas_width + drift + (frame * 0.05 + i as f64).sin() * 30.0,
                    y: wrapped_y(frame, snow_speed, i, 12.0),
                    size: flake_size + rng.next_f64_01() * 3.0,
                    color: params.color.clone().unwrap_or_else(|| SNOW_COLOR.to_string()),
                    kind: ParticleKind::Snowflake,
                }
            }
        };
        particles.push(particle);
    }
    particles
}

fn particle_shape(desc: &ParticleDescriptor, glow: bool) -> Shape {
    let data = ParticleData {
        width: Some(desc.size),
        height: Some(desc.size * desc.kind.aspect()),
        has_glow: glow && desc.kind == ParticleKind::Flame,
        style: Style {
            color: Some(desc.color.clone()),
            fill_color: Some(desc.color.clone()),
            line_width: None,
        },
    };
    match desc.kind {
        ParticleKind::Flame => Shape::Flame(data),
        ParticleKind::Raindrop => Shape::Raindrop(data),
        ParticleKind::Snowflake => Shape::Snowflake(data),
    }
}

/// Builds an effect group seeded with particles at frame 0. `next_id`
/// hands out ids, the group's first.
pub fn build_effect_group(
    params: EffectParams,
    canvas_width: f64,
    fire_anchor: Point,
    next_id: &mut dyn FnMut() -> u32,
) -> SceneObject {
    let group_id = next_id();
    let glow = params.intensity == Intensity::Heavy;
    let objects = generate_particles(&params, 0, canvas_width, fire_anchor)
        .iter()
        .map(|desc| SceneObject::new(next_id(), desc.x, desc.y, particle_shape(desc, glow)))
        .collect();

    let mut group = SceneObject::new(
        group_id,
        0.0,
        0.0,
        Shape::Group(GroupData { objects, expanded: true, effect: None }),
    );
    group.name = Some(format!("{} Effect", params.effect_type.label()));
    if let Shape::Group(g) = &mut group.shape {
        g.effect = Some(params);
    }
    group
}

/// Copies regenerated particle state onto an effect group's existing
/// children, keeping their ids and order. Returns true if anything moved.
pub fn apply_particles(group: &mut SceneObject, particles: &[ParticleDescriptor]) -> bool {
    let Some(children) = group.children_mut() else {
        return false;
    };
    let mut changed = false;
    for (child, desc) in children.iter_mut().zip(particles) {
        if child.x != desc.x || child.y != desc.y {
            changed = true;
        }
        child.x = desc.x;
        child.y = desc.y;
        if let Shape::Raindrop(d) | Shape::Snowflake(d) | Shape::Flame(d) = &mut child.shape {
            d.style.color = Some(desc.color.clone());
            d.style.fill_color = Some(desc.color.clone());
            d.width = Some(desc.size);
            d.height = Some(desc.size * desc.kind.aspect());
        }
    }
    changed
}
