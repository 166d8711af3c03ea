use super::{BoxedEntity, Entity, EntityId, Game};
use anyhow::Result;
use std::collections::VecDeque;

// ---------- Scripts ----------
/// A resumable linear procedure. Each `resume` runs the script up to its next suspension
/// point and returns the entity to wait on, or `None` once the script has finished.
pub trait Script {
    fn resume(&mut self, game: &mut Game) -> Result<Option<BoxedEntity>>;
}

pub type BoxedScript = Box<dyn Script>;

impl<S: Script + ?Sized> Script for Box<S> {
    fn resume(&mut self, game: &mut Game) -> Result<Option<BoxedEntity>> {
        (**self).resume(game)
    }
}

type Step = Box<dyn FnOnce(&mut Game) -> Result<Option<BoxedEntity>>>;

/// Ordered continuation list built step by step:
///
/// ```
/// # use phase_engine::ecs::{timer, Steps};
/// let script = Steps::new()
///     .wait(timer(2.0))
///     .run(|game| game.play_sound("hit.wav", None, None))
///     .wait(timer(2.0));
/// # let _ = script;
/// ```
///
/// Steps that do not yield an entity run back to back within the same resume.
#[derive(Default)]
pub struct Steps {
    steps: VecDeque<Step>,
}

impl Steps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Generic step: run `f`, optionally suspending on the entity it returns.
    pub fn then(mut self, f: impl FnOnce(&mut Game) -> Result<Option<BoxedEntity>> + 'static) -> Self {
        self.steps.push_back(Box::new(f));
        self
    }

    pub fn wait<E: Entity + 'static>(self, entity: E) -> Self {
        self.then(move |_| Ok(Some(Box::new(entity) as BoxedEntity)))
    }

    /// Builds the entity to wait on when the step is reached rather than up front.
    pub fn wait_for<E: Entity + 'static>(self, f: impl FnOnce(&mut Game) -> E + 'static) -> Self {
        self.then(move |game| Ok(Some(Box::new(f(game)) as BoxedEntity)))
    }

    pub fn run(self, f: impl FnOnce(&mut Game) + 'static) -> Self {
        self.then(move |game| {
            f(game);
            Ok(None)
        })
    }

    pub fn try_run(self, f: impl FnOnce(&mut Game) -> Result<()> + 'static) -> Self {
        self.then(move |game| f(game).map(|_| None))
    }
}

impl Script for Steps {
    fn resume(&mut self, game: &mut Game) -> Result<Option<BoxedEntity>> {
        while let Some(step) = self.steps.pop_front() {
            if let Some(entity) = step(game)? {
                return Ok(Some(entity));
            }
        }
        Ok(None)
    }
}

/// Script driven by a closure that keeps its own state; returning `None` finishes it.
pub struct FnScript<F> {
    f: F,
}

pub fn script_fn<F>(f: F) -> FnScript<F>
where
    F: FnMut(&mut Game) -> Option<BoxedEntity>,
{
    FnScript { f }
}

impl<F> Script for FnScript<F>
where
    F: FnMut(&mut Game) -> Option<BoxedEntity>,
{
    fn resume(&mut self, game: &mut Game) -> Result<Option<BoxedEntity>> {
        Ok((self.f)(game))
    }
}

/// Rebuilds and replays a step list forever. A fresh list that yields nothing ends the loop.
pub struct Repeat<F> {
    factory: F,
    current: Steps,
}

pub fn repeat<F>(mut factory: F) -> Repeat<F>
where
    F: FnMut() -> Steps,
{
    let current = factory();
    Repeat { factory, current }
}

impl<F> Script for Repeat<F>
where
    F: FnMut() -> Steps,
{
    fn resume(&mut self, game: &mut Game) -> Result<Option<BoxedEntity>> {
        let mut rebuilt = false;
        loop {
            if let Some(entity) = self.current.resume(game)? {
                return Ok(Some(entity));
            }
            if rebuilt {
                tracing::warn!("repeated script yielded nothing, stopping");
                return Ok(None);
            }
            self.current = (self.factory)();
            rebuilt = true;
        }
    }
}

// ---------- Coroutine ----------
/// Drives a script one step at a time, resuming only once the entity it is waiting on has
/// died. Each yielded entity is registered with the game.
///
/// Usable on its own inside an owning entity's `iter`, or through [`MultiTimer`].
pub struct Coroutine {
    script: BoxedScript,
    current: Option<EntityId>,
    finished: bool,
}

impl Coroutine {
    pub fn new<S: Script + 'static>(script: S) -> Self {
        Self { script: Box::new(script), current: None, finished: false }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Entity the script is currently suspended on.
    pub fn waiting_on(&self) -> Option<EntityId> {
        self.current
    }

    /// Advances at most one step. Returns true once the script has finished.
    pub fn poll(&mut self, game: &mut Game) -> Result<bool> {
        if self.finished {
            return Ok(true);
        }
        if let Some(id) = self.current {
            if game.is_alive(id) {
                return Ok(false);
            }
        }
        match self.script.resume(game) {
            Ok(Some(entity)) => {
                self.current = Some(game.add_boxed(entity));
                Ok(false)
            }
            Ok(None) => {
                self.finished = true;
                self.current = None;
                Ok(true)
            }
            Err(err) => {
                self.finished = true;
                self.current = None;
                Err(err)
            }
        }
    }

    /// Stops the script and kills whatever it is waiting on.
    pub fn abort(&mut self, game: &mut Game) {
        if let Some(id) = self.current.take() {
            game.kill(id);
        }
        self.finished = true;
    }
}

type ScriptFactory = Box<dyn FnOnce(&mut Game) -> BoxedScript>;

/// Entity wrapper around a [`Coroutine`]; dies when the script finishes.
pub struct MultiTimer {
    factory: Option<ScriptFactory>,
    coroutine: Option<Coroutine>,
    dead: bool,
}

/// The script is built from `f` when the entity is initialised, not before.
pub fn multi_timer<S, F>(f: F) -> MultiTimer
where
    S: Script + 'static,
    F: FnOnce(&mut Game) -> S + 'static,
{
    let factory: ScriptFactory = Box::new(move |game: &mut Game| Box::new(f(game)) as BoxedScript);
    MultiTimer { factory: Some(factory), coroutine: None, dead: false }
}

/// Wraps a script that has already been built.
pub fn direct_multi_timer<S: Script + 'static>(script: S) -> MultiTimer {
    MultiTimer { factory: None, coroutine: Some(Coroutine::new(script)), dead: false }
}

impl MultiTimer {
    fn ensure_started(&mut self, game: &mut Game) {
        if let Some(factory) = self.factory.take() {
            self.coroutine = Some(Coroutine::new(factory(game)));
        }
    }

    pub fn abort(&mut self, game: &mut Game) {
        if let Some(coroutine) = &mut self.coroutine {
            coroutine.abort(game);
        }
        self.dead = true;
    }
}

impl Entity for MultiTimer {
    fn init(&mut self, game: &mut Game) -> Result<()> {
        self.ensure_started(game);
        Ok(())
    }

    fn iter(&mut self, game: &mut Game) -> Result<()> {
        // embedded timers may be iterated without an explicit init
        self.ensure_started(game);
        let Some(coroutine) = &mut self.coroutine else {
            self.dead = true;
            return Ok(());
        };
        let polled = coroutine.poll(game);
        if !matches!(polled, Ok(false)) {
            self.dead = true;
        }
        polled.map(|_| ())
    }

    fn is_dead(&self) -> bool {
        self.dead
    }
}

// ---------- Sequence ----------
/// Runs owned entities one after another. Only the active entity is iterated and drawn;
/// the first is initialised with the sequence, each later one when it becomes active.
pub struct Sequence {
    entities: Vec<BoxedEntity>,
    index: usize,
    dead: bool,
}

pub fn sequence(entities: Vec<BoxedEntity>) -> Sequence {
    Sequence { entities, index: 0, dead: false }
}

impl Sequence {
    pub fn active_index(&self) -> usize {
        self.index
    }
}

impl Entity for Sequence {
    fn init(&mut self, game: &mut Game) -> Result<()> {
        match self.entities.first_mut() {
            Some(first) => first.init(game),
            None => Ok(()),
        }
    }

    fn iter(&mut self, game: &mut Game) -> Result<()> {
        let last = self.entities.len().saturating_sub(1);
        let Some(current) = self.entities.get_mut(self.index) else {
            self.dead = true;
            return Ok(());
        };
        if !current.is_dead() {
            current.iter(game)
        } else if self.index == last {
            self.dead = true;
            Ok(())
        } else {
            self.index += 1;
            self.entities[self.index].init(game)
        }
    }

    fn draw(&mut self, game: &mut Game) -> Result<()> {
        match self.entities.get_mut(self.index) {
            Some(current) => current.draw(game),
            None => Ok(()),
        }
    }

    fn is_dead(&self) -> bool {
        self.dead
    }
}

// ---------- All done ----------
/// Registers both groups on init. Once every `primary` entity is dead, kills whatever is
/// left of `secondary` and dies.
pub struct AllDone {
    pending: Option<(Vec<BoxedEntity>, Vec<BoxedEntity>)>,
    primary: Vec<EntityId>,
    secondary: Vec<EntityId>,
    dead: bool,
}

pub fn all_done(primary: Vec<BoxedEntity>, secondary: Vec<BoxedEntity>) -> AllDone {
    AllDone { pending: Some((primary, secondary)), primary: Vec::new(), secondary: Vec::new(), dead: false }
}

impl AllDone {
    pub fn primary_ids(&self) -> &[EntityId] {
        &self.primary
    }

    pub fn secondary_ids(&self) -> &[EntityId] {
        &self.secondary
    }
}

impl Entity for AllDone {
    fn init(&mut self, game: &mut Game) -> Result<()> {
        if let Some((primary, secondary)) = self.pending.take() {
            self.primary = primary.into_iter().map(|entity| game.add_boxed(entity)).collect();
            self.secondary = secondary.into_iter().map(|entity| game.add_boxed(entity)).collect();
        }
        Ok(())
    }

    fn iter(&mut self, game: &mut Game) -> Result<()> {
        if self.primary.iter().all(|&id| game.is_dead(id)) {
            self.dead = true;
            for &id in &self.secondary {
                game.kill(id);
            }
        }
        Ok(())
    }

    fn is_dead(&self) -> bool {
        self.dead
    }
}
