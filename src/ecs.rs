pub mod game;
pub mod one_time;
pub mod primitives;
pub mod sequencer;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use game::{Game, KillHandler, PlayerDeadHandler};
pub use one_time::OneTime;
pub use primitives::{
    attack_tied, draw_only, draw_with_layer, interval, iter_only, text, timer, AttackSwitch, AttackTied, DrawOnly,
    DrawWithLayer, Interval, IterOnly, LineIndicator, TextEntity, Timer,
};
pub use sequencer::{
    all_done, direct_multi_timer, multi_timer, repeat, script_fn, sequence, AllDone, Coroutine, MultiTimer, Script,
    Sequence, Steps,
};

/// Identity handed out by [`Game::add_entity`]. Ids are never reused within a session, so an
/// id that is no longer live always reads as dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn to_bits(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unit of simulated and drawable behaviour driven by [`Game`].
///
/// `init` runs once when the entity is registered, `iter` once per simulation tick and
/// `draw` once per render frame while the entity is alive. An entity ends its own life by
/// reporting `is_dead`; the scheduler sweeps it at the end of that tick. Errors returned
/// from any of the three hooks are logged by the scheduler and kill the entity.
pub trait Entity {
    fn init(&mut self, _game: &mut Game) -> Result<()> {
        Ok(())
    }

    fn iter(&mut self, game: &mut Game) -> Result<()>;

    fn draw(&mut self, _game: &mut Game) -> Result<()> {
        Ok(())
    }

    fn is_dead(&self) -> bool;

    /// Back-to-front ordering key for the draw pass.
    fn draw_layer(&self) -> i32 {
        0
    }
}

pub type BoxedEntity = Box<dyn Entity>;

impl<E: Entity + ?Sized> Entity for Box<E> {
    fn init(&mut self, game: &mut Game) -> Result<()> {
        (**self).init(game)
    }

    fn iter(&mut self, game: &mut Game) -> Result<()> {
        (**self).iter(game)
    }

    fn draw(&mut self, game: &mut Game) -> Result<()> {
        (**self).draw(game)
    }

    fn is_dead(&self) -> bool {
        (**self).is_dead()
    }

    fn draw_layer(&self) -> i32 {
        (**self).draw_layer()
    }
}
