//! Frame-driven entity scheduler and coroutine sequencing for small 2D action games.

pub mod animation;
pub mod audio;
pub mod cli;
pub mod config;
pub mod ecs;
pub mod encounter;
pub mod events;
pub mod fabrik;
pub mod harness;
pub mod input;
pub mod math;
pub mod player;
pub mod renderer;
pub mod text;
pub mod time;

pub use ecs::{BoxedEntity, Entity, EntityId, Game};
