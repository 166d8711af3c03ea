use std::io::Write;

use phase_engine::config::{GameConfig, GameConfigOverrides};
use phase_engine::input::{InputAction, InputState};
use tempfile::NamedTempFile;

#[test]
fn partial_config_keeps_defaults_for_missing_fields() {
    let mut temp = NamedTempFile::new().expect("temp config");
    write!(temp, r#"{{"fabrik_iterations":4,"player":{{"attack_radius":0.3}}}}"#).expect("write config");

    let config = GameConfig::load(temp.path()).expect("load config");
    assert_eq!(config.fabrik_iterations, 4);
    assert_eq!(config.player.attack_radius, 0.3);
    assert_eq!(config.player.death_particles, 100);
    assert!((config.max_frame_delta - 1.0 / 25.0).abs() < 1e-6);
}

#[test]
fn broken_config_falls_back_to_defaults() {
    let mut temp = NamedTempFile::new().expect("temp config");
    write!(temp, "{{ not json").expect("write config");
    assert!(GameConfig::load(temp.path()).is_err());

    let config = GameConfig::load_or_default(temp.path());
    assert_eq!(config.fabrik_iterations, 10);

    let missing = GameConfig::load_or_default("does/not/exist.json");
    assert_eq!(missing.audio_log_capacity, 64);
}

#[test]
fn overrides_only_touch_the_given_fields() {
    let mut config = GameConfig::default();
    let overrides = GameConfigOverrides { max_frame_delta: None, fabrik_iterations: Some(2) };
    assert!(!overrides.is_empty());
    assert_eq!(overrides.applied_fields(), ["fabrik_iterations"]);
    config.apply_overrides(&overrides);
    assert_eq!(config.fabrik_iterations, 2);
    assert!((config.max_frame_delta - 1.0 / 25.0).abs() < 1e-6);
    assert!(GameConfigOverrides::default().is_empty());
}

#[test]
fn remapped_attack_replaces_the_default_key() {
    let mut temp = NamedTempFile::new().expect("temp input config");
    write!(temp, r#"{{"bindings":{{"attack":["K"],"warp":["w"]}}}}"#).expect("write remap config");

    let mut input = InputState::from_config(temp.path());
    input.set_key("space", true);
    assert!(!input.is_action_down(InputAction::Attack), "default key no longer attacks");
    input.set_key("k", true);
    assert!(input.is_action_down(InputAction::Attack), "remapped key attacks");
    input.set_key("ArrowLeft", true);
    assert!(input.is_action_down(InputAction::MoveLeft), "untouched actions keep defaults");
}
