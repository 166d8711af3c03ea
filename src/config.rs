use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "PlayerConfig::default_accel")]
    pub accel: f32,
    #[serde(default = "PlayerConfig::default_attack_interval")]
    pub attack_interval: f32,
    #[serde(default = "PlayerConfig::default_attack_radius")]
    pub attack_radius: f32,
    #[serde(default = "PlayerConfig::default_death_animation_length")]
    pub death_animation_length: f32,
    #[serde(default = "PlayerConfig::default_bounds")]
    pub bounds: f32,
    #[serde(default = "PlayerConfig::default_death_particles")]
    pub death_particles: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    #[serde(default = "GameConfig::default_max_frame_delta")]
    pub max_frame_delta: f32,
    #[serde(default = "GameConfig::default_fabrik_iterations")]
    pub fabrik_iterations: usize,
    #[serde(default = "GameConfig::default_audio_log_capacity")]
    pub audio_log_capacity: usize,
    #[serde(default)]
    pub player: PlayerConfig,
}

#[derive(Debug, Clone, Default)]
pub struct GameConfigOverrides {
    pub max_frame_delta: Option<f32>,
    pub fabrik_iterations: Option<usize>,
}

impl PlayerConfig {
    const fn default_accel() -> f32 {
        60.0
    }

    const fn default_attack_interval() -> f32 {
        0.33333
    }

    const fn default_attack_radius() -> f32 {
        0.2
    }

    const fn default_death_animation_length() -> f32 {
        1.8
    }

    const fn default_bounds() -> f32 {
        1.0
    }

    const fn default_death_particles() -> usize {
        100
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            accel: Self::default_accel(),
            attack_interval: Self::default_attack_interval(),
            attack_radius: Self::default_attack_radius(),
            death_animation_length: Self::default_death_animation_length(),
            bounds: Self::default_bounds(),
            death_particles: Self::default_death_particles(),
        }
    }
}

impl GameConfig {
    fn default_max_frame_delta() -> f32 {
        1.0 / 25.0
    }

    const fn default_fabrik_iterations() -> usize {
        10
    }

    const fn default_audio_log_capacity() -> usize {
        64
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!("Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &GameConfigOverrides) {
        if let Some(max_frame_delta) = overrides.max_frame_delta {
            self.max_frame_delta = max_frame_delta;
        }
        if let Some(iterations) = overrides.fabrik_iterations {
            self.fabrik_iterations = iterations;
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_frame_delta: Self::default_max_frame_delta(),
            fabrik_iterations: Self::default_fabrik_iterations(),
            audio_log_capacity: Self::default_audio_log_capacity(),
            player: PlayerConfig::default(),
        }
    }
}

impl GameConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.max_frame_delta.is_none() && self.fabrik_iterations.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.max_frame_delta.is_some() {
            fields.push("max_frame_delta");
        }
        if self.fabrik_iterations.is_some() {
            fields.push("fabrik_iterations");
        }
        fields
    }
}
