use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Key-state snapshot owned by the host and read by the player controller.
///
/// Keys are host key names, compared case-insensitively (`"ArrowUp"`, `"w"`, `" "`).
#[derive(Debug, Clone, Default)]
pub struct InputState {
    bindings: InputBindings,
    keys_down: HashSet<String>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(path: impl AsRef<Path>) -> Self {
        Self::with_bindings(InputBindings::load_or_default(path))
    }

    pub fn with_bindings(bindings: InputBindings) -> Self {
        Self { bindings, keys_down: HashSet::new() }
    }

    pub fn set_key(&mut self, key: &str, down: bool) {
        let key = normalize_key(key);
        if down {
            self.keys_down.insert(key);
        } else {
            self.keys_down.remove(&key);
        }
    }

    pub fn release_all(&mut self) {
        self.keys_down.clear();
    }

    pub fn is_key_down(&self, key: &str) -> bool {
        self.keys_down.contains(&normalize_key(key))
    }

    pub fn is_action_down(&self, action: InputAction) -> bool {
        self.bindings.keys_for(action).iter().any(|key| self.keys_down.contains(key))
    }
}

fn normalize_key(raw: &str) -> String {
    if raw == " " {
        return String::from("space");
    }
    match raw.trim().to_lowercase().as_str() {
        "spacebar" => String::from("space"),
        "up" => String::from("arrowup"),
        "down" => String::from("arrowdown"),
        "left" => String::from("arrowleft"),
        "right" => String::from("arrowright"),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Attack,
}

impl InputAction {
    fn from_str(value: &str) -> Option<Self> {
        match value {
            "move_up" => Some(Self::MoveUp),
            "move_down" => Some(Self::MoveDown),
            "move_left" => Some(Self::MoveLeft),
            "move_right" => Some(Self::MoveRight),
            "attack" => Some(Self::Attack),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InputBindings {
    action_to_keys: HashMap<InputAction, Vec<String>>,
}

impl InputBindings {
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<InputConfigFile>(&contents) {
                Ok(config) => Self::with_overrides(config.into_overrides(&path.display().to_string())),
                Err(err) => {
                    tracing::warn!(
                        "[input] Failed to parse {}: {err}. Falling back to default bindings.",
                        path.display()
                    );
                    Self::default()
                }
            },
            Err(err) => {
                tracing::warn!(
                    "[input] Failed to read {}: {err}. Falling back to default bindings.",
                    path.display()
                );
                Self::default()
            }
        }
    }

    fn with_overrides(overrides: HashMap<InputAction, Vec<String>>) -> Self {
        let mut action_to_keys = Self::default_action_map();
        for (action, keys) in overrides {
            if keys.is_empty() {
                continue;
            }
            action_to_keys.insert(action, keys);
        }
        Self { action_to_keys }
    }

    fn default_action_map() -> HashMap<InputAction, Vec<String>> {
        use InputAction::*;
        let mut map = HashMap::new();
        map.insert(MoveUp, vec![String::from("arrowup")]);
        map.insert(MoveDown, vec![String::from("arrowdown")]);
        map.insert(MoveLeft, vec![String::from("arrowleft")]);
        map.insert(MoveRight, vec![String::from("arrowright")]);
        map.insert(Attack, vec![String::from("space")]);
        map
    }

    pub fn keys_for(&self, action: InputAction) -> &[String] {
        self.action_to_keys.get(&action).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for InputBindings {
    fn default() -> Self {
        Self { action_to_keys: Self::default_action_map() }
    }
}

#[derive(Debug, Deserialize)]
struct InputConfigFile {
    #[serde(default)]
    bindings: HashMap<String, Vec<String>>,
}

impl InputConfigFile {
    fn into_overrides(self, origin: &str) -> HashMap<InputAction, Vec<String>> {
        let mut overrides = HashMap::new();
        for (action_name, keys) in self.bindings {
            let action_key = action_name.trim().to_lowercase();
            let Some(action) = InputAction::from_str(&action_key) else {
                tracing::warn!("[input] {origin}: unknown action '{action_name}', ignoring.");
                continue;
            };
            let parsed: Vec<String> =
                keys.iter().map(|key| normalize_key(key)).filter(|key| !key.is_empty()).collect();
            if parsed.is_empty() {
                tracing::warn!("[input] {origin}: action '{action_name}' has no valid keys, keeping defaults.");
                continue;
            }
            overrides.insert(action, parsed);
        }
        overrides
    }
}
