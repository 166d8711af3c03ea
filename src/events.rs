use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ecs::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEvent {
    EntitySpawned { entity: EntityId },
    EntityKilled { entity: EntityId },
    EntityFailed { entity: EntityId, message: String },
    PlayerDied,
    SoundPlayed { sound: String },
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::EntitySpawned { entity } => write!(f, "EntitySpawned entity={entity}"),
            GameEvent::EntityKilled { entity } => write!(f, "EntityKilled entity={entity}"),
            GameEvent::EntityFailed { entity, message } => {
                write!(f, "EntityFailed entity={entity} message={message}")
            }
            GameEvent::PlayerDied => write!(f, "PlayerDied"),
            GameEvent::SoundPlayed { sound } => write!(f, "SoundPlayed sound={sound}"),
        }
    }
}

#[derive(Default)]
pub struct EventBus {
    events: Vec<GameEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<GameEvent> {
        self.events.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
