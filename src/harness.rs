//! Headless, deterministic encounter runner used for golden-output checks.

use std::cell::Cell;
use std::fs::File;
use std::path::Path;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::ecs::Game;
use crate::encounter::{encounter, EncounterParams};
use crate::events::GameEvent;
use crate::renderer::{DrawCommand, Renderer};
use crate::text::QueuedTextSurface;
use crate::time::Time;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessFixture {
    #[serde(default = "default_steps")]
    pub steps: usize,
    #[serde(default = "default_dt")]
    pub dt: f32,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_sample_every")]
    pub sample_every: usize,
    #[serde(default)]
    pub encounter: EncounterParams,
    #[serde(default)]
    pub keys: Vec<FixtureKey>,
}

/// Key press or release applied before the given step runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixtureKey {
    pub step: usize,
    pub key: String,
    #[serde(default = "default_down")]
    pub down: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessOutput {
    pub steps: usize,
    pub dt: f32,
    pub seed: u64,
    pub results: Vec<StepResult>,
    pub summary: HarnessSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepResult {
    pub step: usize,
    pub t: f32,
    pub live_entities: usize,
    pub boss_hp: i32,
    pub phase: String,
    /// Events raised since the previous sample.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub events: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HarnessSummary {
    pub final_hp: i32,
    pub final_phase: String,
    pub scene_finished: bool,
    pub player_deaths: usize,
    pub sounds_played: usize,
    pub entities_failed: usize,
    pub frames_drawn: usize,
    pub draw_commands: usize,
}

fn default_steps() -> usize {
    600
}

fn default_dt() -> f32 {
    1.0 / 60.0
}

fn default_sample_every() -> usize {
    30
}

fn default_down() -> bool {
    true
}

/// Renderer that only counts what it is handed.
#[derive(Clone, Default)]
struct FrameTally {
    commands: Rc<Cell<usize>>,
    frames: Rc<Cell<usize>>,
}

impl Renderer for FrameTally {
    fn draw_primitive(&mut self, _command: DrawCommand) {
        self.commands.set(self.commands.get() + 1);
    }

    fn flush(&mut self) {
        self.frames.set(self.frames.get() + 1);
    }
}

pub fn run_fixture(fixture: &HarnessFixture) -> Result<HarnessOutput> {
    run_fixture_with_config(fixture, GameConfig::default())
}

pub fn run_fixture_with_config(fixture: &HarnessFixture, config: GameConfig) -> Result<HarnessOutput> {
    if !(fixture.dt > 0.0) {
        bail!("fixture dt must be positive, got {}", fixture.dt);
    }
    if fixture.sample_every == 0 {
        bail!("fixture sample_every must be at least 1");
    }

    let tally = FrameTally::default();
    let time = Time::manual(config.max_frame_delta);
    let mut game = Game::new(config, time)
        .with_seed(fixture.seed)
        .with_renderer(Box::new(tally.clone()))
        .with_text(Box::new(QueuedTextSurface::auto_advancing()));

    let (scene, warden) = encounter(fixture.encounter.clone());
    let scene_id = game.add_entity(scene);

    let mut summary = HarnessSummary::default();
    let mut pending_events = Vec::new();
    let mut results = Vec::with_capacity(fixture.steps / fixture.sample_every + 1);

    for step in 0..fixture.steps {
        for key in fixture.keys.iter().filter(|key| key.step == step) {
            game.input.set_key(&key.key, key.down);
        }

        game.time_mut().advance_manual(fixture.dt);
        game.run_frame();

        for event in game.drain_events() {
            match &event {
                GameEvent::PlayerDied => summary.player_deaths += 1,
                GameEvent::SoundPlayed { .. } => summary.sounds_played += 1,
                GameEvent::EntityFailed { .. } => summary.entities_failed += 1,
                _ => {}
            }
            // spawn and kill churn would drown out everything else
            if !matches!(event, GameEvent::EntitySpawned { .. } | GameEvent::EntityKilled { .. }) {
                pending_events.push(event.to_string());
            }
        }

        if step % fixture.sample_every == 0 || step + 1 == fixture.steps {
            results.push(StepResult {
                step,
                t: game.t(),
                live_entities: game.live_ids().count(),
                boss_hp: warden.hp(),
                phase: warden.phase().label().to_string(),
                events: std::mem::take(&mut pending_events),
            });
        }
    }

    summary.final_hp = warden.hp();
    summary.final_phase = warden.phase().label().to_string();
    summary.scene_finished = game.is_dead(scene_id);
    summary.frames_drawn = tally.frames.get();
    summary.draw_commands = tally.commands.get();
    tracing::info!(
        steps = fixture.steps,
        final_hp = summary.final_hp,
        phase = %summary.final_phase,
        deaths = summary.player_deaths,
        "harness run complete"
    );

    Ok(HarnessOutput { steps: fixture.steps, dt: fixture.dt, seed: fixture.seed, results, summary })
}

pub fn load_fixture<P: AsRef<Path>>(path: P) -> Result<HarnessFixture> {
    let file = File::open(path.as_ref()).with_context(|| format!("opening fixture '{}'", path.as_ref().display()))?;
    serde_json::from_reader(file).with_context(|| "parsing fixture JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fixture_uses_defaults() {
        let fixture: HarnessFixture = serde_json::from_str("{}").expect("parse fixture");
        assert_eq!(fixture.steps, 600);
        assert_eq!(fixture.sample_every, 30);
        assert_eq!(fixture.encounter, EncounterParams::default());
        assert!(fixture.keys.is_empty());
    }

    #[test]
    fn rejects_non_positive_dt() {
        let fixture = HarnessFixture {
            steps: 1,
            dt: 0.0,
            seed: 0,
            sample_every: 1,
            encounter: EncounterParams::default(),
            keys: Vec::new(),
        };
        let err = run_fixture(&fixture).unwrap_err();
        assert!(err.to_string().contains("dt must be positive"));
    }

    #[test]
    fn samples_first_and_last_step() {
        let fixture = HarnessFixture {
            steps: 10,
            dt: 1.0 / 60.0,
            seed: 1,
            sample_every: 4,
            encounter: EncounterParams::default(),
            keys: Vec::new(),
        };
        let output = run_fixture(&fixture).expect("run fixture");
        let steps: Vec<usize> = output.results.iter().map(|r| r.step).collect();
        assert_eq!(steps, [0, 4, 8, 9]);
        assert_eq!(output.summary.frames_drawn, 10);
        assert_eq!(output.results[0].phase, "intro");
    }
}
