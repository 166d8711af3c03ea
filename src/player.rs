use anyhow::Result;
use glam::{Vec2, Vec4};
use rand::Rng;

use crate::animation::{key, sample_keyframes};
use crate::ecs::{Entity, Game};
use crate::input::InputAction;
use crate::renderer::{DrawCommand, EFFECT_RING};

const PLAYER_COLOR: Vec4 = Vec4::new(1.0, 0.7, 0.7, 1.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeathParticle {
    pub pos: Vec2,
    pub vel: Vec2,
}

/// Player sub-state. Only the player controller mutates it; the scheduler only reads
/// `just_died` to raise the player-death broadcast.
#[derive(Debug, Clone, Default)]
pub struct PlayerState {
    pub pos: Vec2,
    pub vel: Vec2,
    pub attack_cooldown: f32,
    pub death_animation_timer: f32,
    pub death_particles: Vec<DeathParticle>,
    pub just_died: bool,
    dying: bool,
}

impl PlayerState {
    pub fn is_dying(&self) -> bool {
        self.dying
    }
}

/// One simulation step of player movement, attack cooldown and death recovery.
pub fn run_player_iter(game: &mut Game) {
    let dt = game.dt();
    let cfg = game.config.player.clone();
    let attack_down = game.input.is_action_down(InputAction::Attack);
    let steer = Vec2::new(
        axis(game.input.is_action_down(InputAction::MoveRight), game.input.is_action_down(InputAction::MoveLeft)),
        axis(game.input.is_action_down(InputAction::MoveUp), game.input.is_action_down(InputAction::MoveDown)),
    );
    let player = &mut game.player;

    if player.death_animation_timer <= 0.0 && player.dying {
        player.pos = Vec2::ZERO;
        player.vel = Vec2::ZERO;
        player.death_particles.clear();
        player.dying = false;
    }
    player.death_animation_timer -= dt;

    if player.attack_cooldown > 0.0 {
        player.attack_cooldown -= dt;
    }
    player.pos += player.vel * dt;

    // movement is direct, not momentum based
    player.vel = steer * (cfg.accel / 60.0);
    if attack_down && player.attack_cooldown <= 0.0 {
        player.attack_cooldown = cfg.attack_interval;
        player.vel = -player.vel;
    }

    for i in 0..2 {
        if player.pos[i] > cfg.bounds {
            player.vel[i] = -player.vel[i].abs();
        }
        if player.pos[i] < -cfg.bounds {
            player.vel[i] = player.vel[i].abs();
        }
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    (positive as i32 - negative as i32) as f32
}

/// The attack is active for the first instant of each cooldown window.
pub fn is_player_attacking(game: &Game) -> bool {
    game.player.attack_cooldown >= game.config.player.attack_interval
}

/// Starts the death animation and raises the player-death broadcast for this tick.
/// Ignored while a death animation is already playing.
pub fn kill_player(game: &mut Game) {
    if game.player.death_animation_timer > 0.0 {
        return;
    }
    let cfg = game.config.player.clone();
    let origin = game.player.pos;
    let particles: Vec<DeathParticle> = (0..cfg.death_particles)
        .map(|_| {
            let rng = game.rng();
            DeathParticle { pos: origin, vel: Vec2::new(rng.gen_range(-0.1..0.1), rng.gen_range(-0.1..0.1)) }
        })
        .collect();

    let player = &mut game.player;
    player.just_died = true;
    player.dying = true;
    player.death_animation_timer = cfg.death_animation_length;
    player.death_particles.extend(particles);

    game.play_sound("click.wav", Some(1.0), Some(4.0));
    game.play_sound("player-death.wav", Some(0.25), Some(1.0));
    tracing::debug!(pos = ?origin, "player died");
}

pub fn draw_player(game: &mut Game) {
    let cfg = game.config.player.clone();
    let t = game.t();
    let attacking = is_player_attacking(game);

    if game.player.death_animation_timer > 0.0 {
        let factor = 1.0 - game.player.death_animation_timer / cfg.death_animation_length;
        let flash = [key(0.0, 0.0), key(0.8, 0.0), key(1.0, std::f32::consts::SQRT_2)];
        let shadow = [key(0.0, 0.0), key(0.8, 0.0), key(1.0, std::f32::consts::SQRT_2 + 0.5)];
        for (color, frames) in [(Vec4::new(1.0, 0.6, 0.6, 0.1), flash), (Vec4::new(0.0, 0.0, 0.0, 1.0), shadow)] {
            let radius = sample_keyframes(&frames, factor).unwrap_or(0.0);
            game.renderer().draw_primitive(DrawCommand {
                image: 0,
                effect: EFFECT_RING,
                transform: glam::Mat3::IDENTITY,
                params: Some(color),
                params2: Some(Vec4::new(radius, 0.01, 0.0, 0.0)),
            });
        }

        let pull = game.player.death_animation_timer < cfg.death_animation_length / 2.0;
        let mut particles = std::mem::take(&mut game.player.death_particles);
        for particle in particles.iter_mut() {
            particle.pos += particle.vel;
            particle.vel *= 0.8;
            if pull {
                particle.vel -= particle.pos / 30.0;
            }
            game.renderer().circle(particle.pos, 0.005, PLAYER_COLOR, None, None);
        }
        game.player.death_particles = particles;
        return;
    }

    let pos = game.player.pos;
    let size = (t * 10.0 * std::f32::consts::TAU).sin() * 0.005 + 0.02;
    let renderer = game.renderer();
    renderer.circle(pos, size, PLAYER_COLOR, None, None);
    if attacking {
        renderer.circle(pos, cfg.attack_radius, PLAYER_COLOR, Some(0.1), Some(0.99));
    } else {
        renderer.circle(pos, cfg.attack_radius, Vec4::new(1.0, 0.7, 0.7, 0.3), Some(0.01), Some(0.99));
    }
}

/// Entity that runs the player controller every tick and draws the player on `layer`.
pub struct PlayerController {
    layer: i32,
}

impl PlayerController {
    pub fn new(layer: i32) -> Self {
        Self { layer }
    }
}

impl Entity for PlayerController {
    fn iter(&mut self, game: &mut Game) -> Result<()> {
        run_player_iter(game);
        Ok(())
    }

    fn draw(&mut self, game: &mut Game) -> Result<()> {
        draw_player(game);
        Ok(())
    }

    fn is_dead(&self) -> bool {
        false
    }

    fn draw_layer(&self) -> i32 {
        self.layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn killing_twice_during_animation_raises_one_death() {
        let mut game = Game::headless().with_seed(7);
        kill_player(&mut game);
        assert!(game.player.just_died);
        assert_eq!(game.player.death_particles.len(), game.config.player.death_particles);
        game.player.just_died = false;
        kill_player(&mut game);
        assert!(!game.player.just_died, "second kill during the animation is ignored");
    }

    #[test]
    fn attack_opens_cooldown_window() {
        let mut game = Game::headless();
        game.input.set_key("space", true);
        game.time_mut().set_manual(0.01);
        game.iter_entities();
        run_player_iter(&mut game);
        assert!(is_player_attacking(&game));
        run_player_iter(&mut game);
        assert!(!is_player_attacking(&game), "attack is only active on the first step of the window");
    }

    #[test]
    fn player_resets_after_death_animation() {
        let mut game = Game::headless().with_seed(1);
        game.player.pos = Vec2::new(0.5, 0.5);
        kill_player(&mut game);
        game.player.death_animation_timer = 0.0;
        run_player_iter(&mut game);
        assert_eq!(game.player.pos, Vec2::ZERO);
        assert!(game.player.death_particles.is_empty());
        assert!(!game.player.is_dying());
    }
}
