//! Reference boss encounter built only from the scheduler primitives.
//!
//! The warden cycles through intro dialogue, an attack loop of FABRIK tendril volleys,
//! a short pause after each player death, and a defeat sequence. State the attack scripts
//! need to touch lives in [`WardenBody`], shared through an `Rc` instead of captured
//! mutable locals.

use std::cell::Cell;
use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;

use anyhow::Result;
use glam::{Mat3, Vec2, Vec4};
use serde::{Deserialize, Serialize};

use crate::animation::{key, Easing, Keyframes};
use crate::ecs::{
    all_done, attack_tied, draw_only, interval, multi_timer, repeat, text, timer, AllDone, AttackSwitch, BoxedEntity,
    Coroutine, Entity, Game, LineIndicator, OneTime, Steps,
};
use crate::fabrik::{self, FabrikPoint};
use crate::math::{point_to, polar, wrap_angle};
use crate::player::{is_player_attacking, kill_player, PlayerController};
use crate::renderer::draw_health_bar;
use crate::text::TextFragment;

const WARDEN_SIZE: f32 = 0.2;
const TENDRIL_SPEED: f32 = 4.2;
const TENDRIL_HIT_RADIUS: f32 = 0.04;
const TENDRIL_SPRITE: u32 = 3;
const BODY_SPRITE: u32 = 2;
const TELEPORT_DURATION: f32 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EncounterParams {
    #[serde(default = "EncounterParams::default_max_hp")]
    pub max_hp: i32,
    #[serde(default = "EncounterParams::default_volley_size")]
    pub volley_size: usize,
    #[serde(default = "EncounterParams::default_volley_spacing")]
    pub volley_spacing: f32,
    #[serde(default = "EncounterParams::default_rest")]
    pub rest: f32,
    #[serde(default = "EncounterParams::default_tendril_segments")]
    pub tendril_segments: usize,
    #[serde(default = "EncounterParams::default_segment_length")]
    pub segment_length: f32,
}

impl EncounterParams {
    const fn default_max_hp() -> i32 {
        12
    }

    const fn default_volley_size() -> usize {
        6
    }

    const fn default_volley_spacing() -> f32 {
        0.05
    }

    const fn default_rest() -> f32 {
        1.5
    }

    const fn default_tendril_segments() -> usize {
        30
    }

    const fn default_segment_length() -> f32 {
        0.1
    }
}

impl Default for EncounterParams {
    fn default() -> Self {
        Self {
            max_hp: Self::default_max_hp(),
            volley_size: Self::default_volley_size(),
            volley_spacing: Self::default_volley_spacing(),
            rest: Self::default_rest(),
            tendril_segments: Self::default_tendril_segments(),
            segment_length: Self::default_segment_length(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WardenPhase {
    Intro,
    Fight,
    PlayerDown,
    Defeat,
}

impl WardenPhase {
    pub fn label(self) -> &'static str {
        match self {
            WardenPhase::Intro => "intro",
            WardenPhase::Fight => "fight",
            WardenPhase::PlayerDown => "player_down",
            WardenPhase::Defeat => "defeat",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Movement {
    Idle,
    Teleport { start: f32 },
}

/// Boss state shared with the scripts and tendrils the boss spawns.
pub struct WardenBody {
    pos: Cell<Vec2>,
    hp: Cell<i32>,
    phase: Cell<WardenPhase>,
    movement: Cell<Movement>,
    request: Cell<Option<WardenPhase>>,
    finished: Cell<bool>,
}

/// Read-only view of a warden for hosts and tests.
#[derive(Clone)]
pub struct WardenHandle(Rc<WardenBody>);

impl WardenHandle {
    pub fn hp(&self) -> i32 {
        self.0.hp.get()
    }

    pub fn phase(&self) -> WardenPhase {
        self.0.phase.get()
    }

    pub fn pos(&self) -> Vec2 {
        self.0.pos.get()
    }

    pub fn is_finished(&self) -> bool {
        self.0.finished.get()
    }
}

pub struct Warden {
    params: EncounterParams,
    body: Rc<WardenBody>,
    phase: OneTime<WardenPhase>,
    attack: Option<Coroutine>,
    switch: AttackSwitch,
    standard_positions: [Vec2; 4],
    next_pos_index: usize,
    defeated: bool,
    dead: bool,
}

impl Warden {
    pub fn new(params: EncounterParams) -> (Self, WardenHandle) {
        let body = Rc::new(WardenBody {
            pos: Cell::new(Vec2::new(0.0, 0.5)),
            hp: Cell::new(params.max_hp),
            phase: Cell::new(WardenPhase::Intro),
            movement: Cell::new(Movement::Idle),
            request: Cell::new(None),
            finished: Cell::new(false),
        });
        let handle = WardenHandle(Rc::clone(&body));
        let warden = Self {
            params,
            body,
            phase: OneTime::new(WardenPhase::Intro),
            attack: None,
            switch: AttackSwitch::new(),
            standard_positions: [
                Vec2::new(0.0, 0.5),
                Vec2::new(-0.5, 0.0),
                Vec2::new(0.5, 0.0),
                Vec2::new(0.0, -0.5),
            ],
            next_pos_index: 0,
            defeated: false,
            dead: false,
        };
        (warden, handle)
    }

    fn enter_phase(&mut self, phase: WardenPhase, game: &mut Game) {
        tracing::debug!(phase = phase.label(), "warden entering phase");
        self.body.phase.set(phase);
        self.next_pos_index = 0;
        match phase {
            WardenPhase::Intro => {
                let body = Rc::clone(&self.body);
                game.add_entity(multi_timer(move |_| {
                    Steps::new()
                        .wait(timer(2.0))
                        .wait(text(vec![
                            TextFragment::code("self:~$ A foreign object has entered the killsphere."),
                            TextFragment::code("self:~$ It is to be taken apart and catalogued."),
                        ]))
                        .run(move |_| body.request.set(Some(WardenPhase::Fight)))
                }));
            }
            WardenPhase::Fight => {
                self.body.hp.set(self.params.max_hp);
                self.body.pos.set(self.standard_positions[0]);
                self.body.movement.set(Movement::Idle);
                self.switch.resume();
                self.attack = Some(Coroutine::new(attack_loop(
                    Rc::clone(&self.body),
                    self.switch.clone(),
                    self.params.clone(),
                )));
            }
            WardenPhase::PlayerDown => {
                self.stop_attacking(game);
                let body = Rc::clone(&self.body);
                game.add_entity(multi_timer(move |_| {
                    Steps::new().wait(timer(1.0)).run(move |_| body.request.set(Some(WardenPhase::Fight)))
                }));
            }
            WardenPhase::Defeat => {
                self.stop_attacking(game);
                let body = Rc::clone(&self.body);
                game.add_entity(multi_timer(move |_| {
                    Steps::new()
                        .wait(timer(2.0))
                        .wait(text(vec![
                            TextFragment::code("self:~$ Error: reduction to basal components failed."),
                            TextFragment::code("self:~$ Process ended with exit code -1."),
                        ]))
                        .run(move |_| body.finished.set(true))
                }));
            }
        }
    }

    fn stop_attacking(&mut self, game: &mut Game) {
        self.switch.stop();
        if let Some(attack) = &mut self.attack {
            attack.abort(game);
        }
        self.attack = None;
    }

    fn teleport_to_next_position(&mut self, game: &mut Game) {
        let next = if self.body.hp.get() <= 0 {
            Vec2::ZERO
        } else {
            self.standard_positions[self.next_pos_index]
        };
        self.next_pos_index = (self.next_pos_index + 1) % self.standard_positions.len();
        let body = Rc::clone(&self.body);
        game.add_entity(multi_timer(move |game| {
            body.movement.set(Movement::Teleport { start: game.t() });
            let arrive = Rc::clone(&body);
            Steps::new()
                .wait(timer(TELEPORT_DURATION * 0.5))
                .run(move |_| arrive.pos.set(next))
                .wait(timer(TELEPORT_DURATION * 0.5))
                .run(move |_| body.movement.set(Movement::Idle))
        }));
    }

    fn body_scale(&self, t: f32) -> f32 {
        match self.body.movement.get() {
            Movement::Idle => WARDEN_SIZE,
            Movement::Teleport { start } => {
                let frames = vec![
                    key(start, WARDEN_SIZE),
                    key(start + TELEPORT_DURATION * 0.1, 0.0),
                    key(start + TELEPORT_DURATION * 0.9, 0.0),
                    key(start + TELEPORT_DURATION, WARDEN_SIZE).with_easing(Easing::Linear),
                ];
                Keyframes::new(frames).map(|track| track.sample(t)).unwrap_or(WARDEN_SIZE)
            }
        }
    }
}

impl Entity for Warden {
    fn init(&mut self, game: &mut Game) -> Result<()> {
        if let Some(id) = game.current_id() {
            let body = Rc::clone(&self.body);
            game.on_player_dead(id, move |_| body.request.set(Some(WardenPhase::PlayerDown)));
        }
        Ok(())
    }

    fn iter(&mut self, game: &mut Game) -> Result<()> {
        if let Some(next) = self.body.request.take() {
            if !self.defeated {
                self.phase.set(next);
            }
        }
        if self.phase.fire() {
            let phase = *self.phase.data();
            self.enter_phase(phase, game);
        }

        if *self.phase.data() == WardenPhase::Fight {
            if let Some(attack) = &mut self.attack {
                attack.poll(game)?;
            }

            let in_reach = game.player.pos.distance(self.body.pos.get())
                < game.config.player.attack_radius + WARDEN_SIZE;
            let teleporting = matches!(self.body.movement.get(), Movement::Teleport { .. });
            if is_player_attacking(game) && in_reach && !teleporting {
                self.body.hp.set(self.body.hp.get() - 1);
                game.play_sound("warden-hurt.wav", Some(0.3), Some(0.3));
                self.teleport_to_next_position(game);
            }
        }

        if self.body.hp.get() <= 0 && !self.defeated {
            self.defeated = true;
            self.phase.set(WardenPhase::Defeat);
        }
        if self.body.finished.get() {
            self.dead = true;
        }
        Ok(())
    }

    fn draw(&mut self, game: &mut Game) -> Result<()> {
        let scale = self.body_scale(game.t());
        let transform = Mat3::from_scale_angle_translation(Vec2::splat(scale), 0.0, self.body.pos.get());
        let hp = self.body.hp.get().max(0) as f32;
        let renderer = game.renderer();
        renderer.sprite(BODY_SPRITE, transform, None);
        draw_health_bar(renderer, hp, self.params.max_hp as f32);
        Ok(())
    }

    fn is_dead(&self) -> bool {
        self.dead
    }

    fn draw_layer(&self) -> i32 {
        1
    }
}

/// Volley of tendrils, a rest, repeat.
fn attack_loop(body: Rc<WardenBody>, switch: AttackSwitch, params: EncounterParams) -> impl crate::ecs::Script {
    repeat(move || {
        let body = Rc::clone(&body);
        let switch = switch.clone();
        let params = params.clone();
        let rest = params.rest;
        Steps::new()
            .wait_for(move |_| {
                interval(params.volley_spacing, params.volley_size, move |game, i| {
                    let anchor = body.pos.get();
                    let tendril = Tendril::new(Rc::clone(&body), anchor, game.player.pos, i, &params, game.t());
                    game.add_entity(attack_tied(switch.clone(), tendril));
                    game.play_sound("tendril.wav", Some(0.75 + i as f32 * 0.3), None);
                })
            })
            .wait(timer(rest))
    })
}

// ---------- Tendril ----------
/// FABRIK chain anchored on the warden that whips out sideways, locks onto the player and
/// is harmful until it retracts.
pub struct Tendril {
    body: Rc<WardenBody>,
    points: Vec<FabrikPoint>,
    target: Vec2,
    vel: Vec2,
    initial_vel: Vec2,
    lock_at: f32,
    retract_at: f32,
    delete_at: f32,
    locked: bool,
    dead: bool,
}

impl Tendril {
    fn new(body: Rc<WardenBody>, anchor: Vec2, aim: Vec2, index: usize, params: &EncounterParams, t: f32) -> Self {
        let heading = if aim == anchor { -FRAC_PI_2 } else { point_to(anchor, aim) };
        let toward = polar(heading, TENDRIL_SPEED);
        let side = if index % 2 == 1 { FRAC_PI_2 } else { -FRAC_PI_2 };
        let initial_vel = polar(wrap_angle(heading + side), TENDRIL_SPEED * 1.5);
        Self {
            body,
            points: fabrik::chain(anchor, params.tendril_segments, params.segment_length),
            target: anchor,
            vel: toward,
            initial_vel,
            lock_at: t + 0.15,
            retract_at: t + 0.7,
            delete_at: t + 2.0,
            locked: false,
            dead: false,
        }
    }
}

impl Entity for Tendril {
    fn iter(&mut self, game: &mut Game) -> Result<()> {
        let t = game.t();
        let dt = game.dt();
        if t > self.delete_at {
            self.dead = true;
            return Ok(());
        }

        if let Some(first) = self.points.first_mut() {
            first.pos = self.body.pos.get();
        }
        fabrik::solve(&mut self.points, self.target, game.config.fabrik_iterations);

        if t > self.lock_at {
            if !self.locked {
                self.locked = true;
                self.vel = (game.player.pos - self.target).try_normalize().unwrap_or(self.vel.normalize_or_zero())
                    * TENDRIL_SPEED;
                game.add_entity(LineIndicator::new(self.target, self.target + self.vel * 0.5, 0.3, None));
            }
            self.target += self.vel * dt;
        } else {
            self.target += self.initial_vel * dt;
        }

        if t < self.retract_at {
            let player = game.player.pos;
            if self.points.iter().any(|p| p.pos.distance(player) < TENDRIL_HIT_RADIUS) {
                kill_player(game);
            }
        }
        Ok(())
    }

    fn draw(&mut self, game: &mut Game) -> Result<()> {
        let renderer = game.renderer();
        for segment in fabrik::chain_segments(&self.points) {
            let transform = segment.transform() * Mat3::from_scale(Vec2::new(0.06, 0.02));
            renderer.sprite(TENDRIL_SPRITE, transform, Some(Vec4::new(0.7, 0.9, 1.0, 1.0)));
        }
        Ok(())
    }

    fn is_dead(&self) -> bool {
        self.dead
    }
}

// ---------- Scene ----------
/// Full encounter: the warden decides when the scene ends, the player controller and the
/// backdrop are torn down with it.
pub fn encounter(params: EncounterParams) -> (AllDone, WardenHandle) {
    let (warden, handle) = Warden::new(params);
    let backdrop = draw_only(
        |game| game.renderer().rect(Vec2::splat(-1.0), Vec2::splat(1.0), Vec4::new(0.02, 0.02, 0.05, 1.0)),
        Some(-10),
    );
    let primary: Vec<BoxedEntity> = vec![Box::new(warden)];
    let secondary: Vec<BoxedEntity> = vec![Box::new(PlayerController::new(2)), Box::new(backdrop)];
    (all_done(primary, secondary), handle)
}
