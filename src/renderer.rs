use glam::{Mat3, Vec2, Vec4};

pub const EFFECT_IMAGE: u32 = 0;
pub const EFFECT_CIRCLE: u32 = 1;
pub const EFFECT_RECT: u32 = 4;
pub const EFFECT_RING: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub image: u32,
    pub effect: u32,
    pub transform: Mat3,
    pub params: Option<Vec4>,
    pub params2: Option<Vec4>,
}

/// Draw submission surface supplied by the host. Commands are batched until `flush`,
/// which the host calls once per render frame after every entity has drawn.
pub trait Renderer {
    fn draw_primitive(&mut self, command: DrawCommand);

    fn flush(&mut self);

    fn circle(&mut self, pos: Vec2, radius: f32, color: Vec4, width: Option<f32>, size: Option<f32>) {
        let transform = Mat3::from_scale_angle_translation(Vec2::splat(radius), 0.0, pos);
        self.draw_primitive(DrawCommand {
            image: 0,
            effect: EFFECT_CIRCLE,
            transform,
            params: Some(Vec4::new(size.unwrap_or(0.5), width.unwrap_or(100.0), 0.0, 0.0)),
            params2: Some(color),
        });
    }

    fn sprite(&mut self, image: u32, transform: Mat3, color: Option<Vec4>) {
        self.draw_primitive(DrawCommand {
            image,
            effect: EFFECT_IMAGE,
            transform,
            params: Some(color.unwrap_or(Vec4::ONE)),
            params2: None,
        });
    }

    /// Axis-aligned rectangle spanning `min` to `max`.
    fn rect(&mut self, min: Vec2, max: Vec2, color: Vec4) {
        let transform = Mat3::from_scale_angle_translation(max - min, 0.0, min);
        self.draw_primitive(DrawCommand { image: 0, effect: EFFECT_RECT, transform, params: Some(color), params2: None });
    }
}

/// Headless renderer that keeps the commands of the frame in progress and of the last
/// flushed frame.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pending: Vec<DrawCommand>,
    last_frame: Vec<DrawCommand>,
    frames: usize,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[DrawCommand] {
        &self.pending
    }

    pub fn last_frame(&self) -> &[DrawCommand] {
        &self.last_frame
    }

    pub fn frames_flushed(&self) -> usize {
        self.frames
    }
}

impl Renderer for RecordingRenderer {
    fn draw_primitive(&mut self, command: DrawCommand) {
        self.pending.push(command);
    }

    fn flush(&mut self) {
        self.last_frame = std::mem::take(&mut self.pending);
        self.frames += 1;
    }
}

/// Health bar across the top edge of the play field.
pub fn draw_health_bar(renderer: &mut dyn Renderer, hp: f32, max_hp: f32) {
    let fraction = if max_hp > 0.0 { (hp / max_hp).clamp(0.0, 1.0) } else { 0.0 };
    renderer.rect(Vec2::new(-1.0, 1.0), Vec2::new(-1.0 + 2.0 * fraction, 0.95), Vec4::new(0.5, 0.8, 1.0, 1.0));
}
