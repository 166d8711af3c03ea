use super::{BoxedEntity, Entity, Game};
use crate::animation::{ease, Easing};
use crate::renderer::{DrawCommand, EFFECT_RECT};
use crate::text::{TextFragment, TextTicket};
use anyhow::Result;
use glam::{Mat3, Vec2, Vec4};
use std::cell::Cell;
use std::rc::Rc;

type GameFn = Box<dyn FnMut(&mut Game)>;
type GameOnceFn = Box<dyn FnOnce(&mut Game)>;

// ---------- Timer ----------
/// Dies on the first tick where more than `duration` seconds have passed since init.
pub struct Timer {
    duration: f32,
    start: f32,
    on_complete: Option<GameOnceFn>,
    dead: bool,
}

pub fn timer(duration: f32) -> Timer {
    Timer { duration, start: 0.0, on_complete: None, dead: false }
}

impl Timer {
    /// Runs `f` on the tick the timer expires, before the scheduler sees it dead.
    pub fn on_complete(mut self, f: impl FnOnce(&mut Game) + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }
}

impl Entity for Timer {
    fn init(&mut self, game: &mut Game) -> Result<()> {
        self.start = game.t();
        Ok(())
    }

    fn iter(&mut self, game: &mut Game) -> Result<()> {
        if game.t() > self.start + self.duration {
            if let Some(f) = self.on_complete.take() {
                f(game);
            }
            self.dead = true;
        }
        Ok(())
    }

    fn is_dead(&self) -> bool {
        self.dead
    }
}

// ---------- Interval ----------
/// Calls `on_each(i)` for `i` in `0..count`, each at least `delay` after the previous call.
/// Late ticks delay every later call; missed calls are never caught up.
pub struct Interval {
    delay: f32,
    count: usize,
    fired: usize,
    last: f32,
    on_each: Box<dyn FnMut(&mut Game, usize)>,
    dead: bool,
}

pub fn interval(delay: f32, count: usize, on_each: impl FnMut(&mut Game, usize) + 'static) -> Interval {
    Interval { delay, count, fired: 0, last: 0.0, on_each: Box::new(on_each), dead: false }
}

impl Entity for Interval {
    fn init(&mut self, game: &mut Game) -> Result<()> {
        self.last = game.t();
        Ok(())
    }

    fn iter(&mut self, game: &mut Game) -> Result<()> {
        if self.fired >= self.count {
            self.dead = true;
            return Ok(());
        }
        if game.t() > self.last + self.delay {
            (self.on_each)(game, self.fired);
            self.last = game.t();
            self.fired += 1;
            if self.fired == self.count {
                self.dead = true;
            }
        }
        Ok(())
    }

    fn is_dead(&self) -> bool {
        self.dead
    }
}

// ---------- Single capability adapters ----------
/// Draw-only entity. Never dies by itself.
pub struct DrawOnly {
    draw: GameFn,
    layer: i32,
}

pub fn draw_only(draw: impl FnMut(&mut Game) + 'static, layer: Option<i32>) -> DrawOnly {
    DrawOnly { draw: Box::new(draw), layer: layer.unwrap_or(0) }
}

impl Entity for DrawOnly {
    fn iter(&mut self, _game: &mut Game) -> Result<()> {
        Ok(())
    }

    fn draw(&mut self, game: &mut Game) -> Result<()> {
        (self.draw)(game);
        Ok(())
    }

    fn is_dead(&self) -> bool {
        false
    }

    fn draw_layer(&self) -> i32 {
        self.layer
    }
}

/// Iter-only entity. Never dies by itself.
pub struct IterOnly {
    iter: GameFn,
}

pub fn iter_only(iter: impl FnMut(&mut Game) + 'static) -> IterOnly {
    IterOnly { iter: Box::new(iter) }
}

impl Entity for IterOnly {
    fn iter(&mut self, game: &mut Game) -> Result<()> {
        (self.iter)(game);
        Ok(())
    }

    fn is_dead(&self) -> bool {
        false
    }
}

/// Draws once on the next draw pass at `layer`, then dies on the following tick.
pub struct DrawWithLayer {
    layer: i32,
    draw: Option<GameOnceFn>,
    dead: bool,
}

pub fn draw_with_layer(layer: i32, draw: impl FnOnce(&mut Game) + 'static) -> DrawWithLayer {
    DrawWithLayer { layer, draw: Some(Box::new(draw)), dead: false }
}

impl Entity for DrawWithLayer {
    fn iter(&mut self, _game: &mut Game) -> Result<()> {
        if self.draw.is_none() {
            self.dead = true;
        }
        Ok(())
    }

    fn draw(&mut self, game: &mut Game) -> Result<()> {
        if let Some(draw) = self.draw.take() {
            draw(game);
        }
        Ok(())
    }

    fn is_dead(&self) -> bool {
        self.dead
    }

    fn draw_layer(&self) -> i32 {
        self.layer
    }
}

// ---------- Text ----------
/// Presents dialogue on the text surface and dies once the surface reports it finished.
pub struct TextEntity {
    fragments: Vec<TextFragment>,
    ticket: Option<TextTicket>,
    on_done: Option<GameOnceFn>,
    dead: bool,
}

pub fn text(fragments: Vec<TextFragment>) -> TextEntity {
    TextEntity { fragments, ticket: None, on_done: None, dead: false }
}

impl TextEntity {
    pub fn on_done(mut self, f: impl FnOnce(&mut Game) + 'static) -> Self {
        self.on_done = Some(Box::new(f));
        self
    }
}

impl Entity for TextEntity {
    fn init(&mut self, game: &mut Game) -> Result<()> {
        let fragments = std::mem::take(&mut self.fragments);
        self.ticket = Some(game.text().present(fragments));
        Ok(())
    }

    fn iter(&mut self, game: &mut Game) -> Result<()> {
        let Some(ticket) = self.ticket else {
            return Ok(());
        };
        if game.text().is_complete(ticket) {
            self.dead = true;
            game.text().clear();
            if let Some(f) = self.on_done.take() {
                f(game);
            }
        }
        Ok(())
    }

    fn is_dead(&self) -> bool {
        self.dead
    }
}

// ---------- Attack switch ----------
/// Shared "stop attacking" flag. Attack entities hold a clone and never own their creator.
#[derive(Debug, Clone, Default)]
pub struct AttackSwitch(Rc<Cell<bool>>);

impl AttackSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.set(true);
    }

    pub fn resume(&self) {
        self.0.set(false);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.get()
    }
}

/// Forwards to `entity` until it dies or the switch is thrown.
pub struct AttackTied {
    switch: AttackSwitch,
    entity: BoxedEntity,
    dead: bool,
}

pub fn attack_tied<E: Entity + 'static>(switch: AttackSwitch, entity: E) -> AttackTied {
    AttackTied { switch, entity: Box::new(entity), dead: false }
}

impl Entity for AttackTied {
    fn init(&mut self, game: &mut Game) -> Result<()> {
        self.entity.init(game)
    }

    fn iter(&mut self, game: &mut Game) -> Result<()> {
        if !self.switch.is_stopped() {
            self.entity.iter(game)?;
        }
        if self.entity.is_dead() || self.switch.is_stopped() {
            self.dead = true;
        }
        Ok(())
    }

    fn draw(&mut self, game: &mut Game) -> Result<()> {
        self.entity.draw(game)
    }

    fn is_dead(&self) -> bool {
        self.dead
    }

    fn draw_layer(&self) -> i32 {
        self.entity.draw_layer()
    }
}

// ---------- Line indicator ----------
/// Thin line from `start` to `end` whose width shrinks to zero over `lifetime`.
pub struct LineIndicator {
    pub start: Vec2,
    pub end: Vec2,
    pub lifetime: f32,
    pub width: f32,
    start_time: f32,
    dead: bool,
}

impl LineIndicator {
    pub const DEFAULT_WIDTH: f32 = 0.005;

    pub fn new(start: Vec2, end: Vec2, lifetime: f32, width: Option<f32>) -> Self {
        Self { start, end, lifetime, width: width.unwrap_or(Self::DEFAULT_WIDTH), start_time: 0.0, dead: false }
    }

    fn transform(&self, t: f32) -> Mat3 {
        let delta = self.end - self.start;
        let width = ease(Easing::Linear, t, self.start_time, self.start_time + self.lifetime, self.width, 0.0);
        Mat3::from_translation(self.start)
            * Mat3::from_angle(delta.y.atan2(delta.x))
            * Mat3::from_scale(Vec2::new(delta.length() * 0.5, width))
            * Mat3::from_translation(Vec2::X)
    }
}

impl Entity for LineIndicator {
    fn init(&mut self, game: &mut Game) -> Result<()> {
        self.start_time = game.t();
        Ok(())
    }

    fn iter(&mut self, game: &mut Game) -> Result<()> {
        if game.t() > self.start_time + self.lifetime {
            self.dead = true;
        }
        Ok(())
    }

    fn draw(&mut self, game: &mut Game) -> Result<()> {
        let transform = self.transform(game.t());
        game.renderer().draw_primitive(DrawCommand {
            image: 0,
            effect: EFFECT_RECT,
            transform,
            params: Some(Vec4::new(0.4, 0.7, 1.0, 0.15)),
            params2: None,
        });
        Ok(())
    }

    fn is_dead(&self) -> bool {
        self.dead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_indicator_spans_start_to_end() {
        let line = LineIndicator::new(Vec2::ZERO, Vec2::new(2.0, 0.0), 1.0, None);
        let transform = line.transform(0.0);
        assert!((transform.transform_point2(Vec2::new(-1.0, 0.0)) - Vec2::ZERO).length() < 1e-6);
        assert!((transform.transform_point2(Vec2::new(1.0, 0.0)) - Vec2::new(2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn line_indicator_width_reaches_zero() {
        let line = LineIndicator::new(Vec2::ZERO, Vec2::new(0.0, 1.0), 1.0, Some(0.1));
        let transform = line.transform(1.0);
        let side = transform.transform_vector2(Vec2::Y);
        assert!(side.length() < 1e-6);
    }

    #[test]
    fn attack_switch_is_shared_between_clones() {
        let switch = AttackSwitch::new();
        let held = switch.clone();
        switch.stop();
        assert!(held.is_stopped());
        held.resume();
        assert!(!switch.is_stopped());
    }
}
