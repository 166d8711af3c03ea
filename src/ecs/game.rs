use super::{BoxedEntity, Entity, EntityId};
use crate::audio::{AudioLog, AudioSink};
use crate::config::GameConfig;
use crate::ecs::sequencer::{direct_multi_timer, Script};
use crate::events::{EventBus, GameEvent};
use crate::input::InputState;
use crate::player::PlayerState;
use crate::renderer::{RecordingRenderer, Renderer};
use crate::text::{QueuedTextSurface, TextSurface};
use crate::time::Time;
use anyhow::Error;
use rand::rngs::StdRng;
use rand::SeedableRng;
use smallvec::SmallVec;
use std::collections::HashMap;

pub type KillHandler = Box<dyn FnOnce(&mut Game)>;
pub type PlayerDeadHandler = Box<dyn FnMut(&mut Game)>;

// ---------- Live set ----------
struct Slot {
    id: EntityId,
    /// `None` while the entity is being dispatched.
    entity: Option<BoxedEntity>,
    killed: bool,
}

impl Slot {
    fn is_dead(&self) -> bool {
        self.killed || self.entity.as_ref().map_or(false, |entity| entity.is_dead())
    }
}

#[derive(Clone, Copy)]
enum Phase {
    Init,
    Iter,
    Draw,
}

impl Phase {
    fn label(self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::Iter => "iter",
            Phase::Draw => "draw",
        }
    }
}

// ---------- Game ----------
/// Session state and scheduler.
///
/// Entities registered while a tick's `iter` pass is running are first visited on the next
/// tick; the pass walks the live set as it stood when the pass began. Entities already dead
/// when their turn comes are skipped.
pub struct Game {
    pub config: GameConfig,
    pub player: PlayerState,
    pub input: InputState,
    time: Time,
    renderer: Box<dyn Renderer>,
    audio: Box<dyn AudioSink>,
    text: Box<dyn TextSurface>,
    events: EventBus,
    rng: StdRng,
    slots: Vec<Slot>,
    next_id: u64,
    current: Option<EntityId>,
    kill_handlers: HashMap<EntityId, SmallVec<[KillHandler; 2]>>,
    player_dead_handlers: Vec<(EntityId, PlayerDeadHandler)>,
}

impl Game {
    /// A session with headless collaborators; swap them with the `with_*` builders.
    pub fn new(config: GameConfig, time: Time) -> Self {
        let audio = AudioLog::new(config.audio_log_capacity);
        Self {
            config,
            player: PlayerState::default(),
            input: InputState::new(),
            time,
            renderer: Box::new(RecordingRenderer::new()),
            audio: Box::new(audio),
            text: Box::new(QueuedTextSurface::new()),
            events: EventBus::default(),
            rng: StdRng::from_entropy(),
            slots: Vec::new(),
            next_id: 0,
            current: None,
            kill_handlers: HashMap::new(),
            player_dead_handlers: Vec::new(),
        }
    }

    /// Default config on a manual clock.
    pub fn headless() -> Self {
        let config = GameConfig::default();
        let time = Time::manual(config.max_frame_delta);
        Self::new(config, time)
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_audio(mut self, audio: Box<dyn AudioSink>) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_text(mut self, text: Box<dyn TextSurface>) -> Self {
        self.text = text;
        self
    }

    pub fn with_input(mut self, input: InputState) -> Self {
        self.input = input;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // ---------- Accessors ----------
    pub fn t(&self) -> f32 {
        self.time.t()
    }

    pub fn dt(&self) -> f32 {
        self.time.dt()
    }

    pub fn time_mut(&mut self) -> &mut Time {
        &mut self.time
    }

    pub fn renderer(&mut self) -> &mut dyn Renderer {
        self.renderer.as_mut()
    }

    pub fn text(&mut self) -> &mut dyn TextSurface {
        self.text.as_mut()
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }

    pub fn play_sound(&mut self, id: &str, pitch: Option<f32>, gain: Option<f32>) {
        self.audio.play_sound(id, pitch, gain);
        self.events.push(GameEvent::SoundPlayed { sound: id.to_string() });
    }

    /// Id of the entity whose `init`, `iter` or `draw` is currently running.
    pub fn current_id(&self) -> Option<EntityId> {
        self.current
    }

    pub fn entity_count(&self) -> usize {
        self.slots.len()
    }

    pub fn live_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots.iter().filter(|slot| !slot.is_dead()).map(|slot| slot.id)
    }

    // ---------- Registration ----------
    /// Registers `entity`, running its `init` before returning its id.
    pub fn add_entity<E: Entity + 'static>(&mut self, entity: E) -> EntityId {
        self.add_boxed(Box::new(entity))
    }

    pub fn add_boxed(&mut self, mut entity: BoxedEntity) -> EntityId {
        let id = EntityId::from_raw(self.next_id);
        self.next_id += 1;
        // slot first so ids stay sorted even when init registers more entities
        self.slots.push(Slot { id, entity: None, killed: false });
        self.events.push(GameEvent::EntitySpawned { entity: id });
        tracing::trace!(entity = %id, "entity registered");

        let previous = self.current.replace(id);
        let result = entity.init(self);
        self.current = previous;

        if let Some(index) = self.index_of(id) {
            self.slots[index].entity = Some(entity);
        }
        if let Err(err) = result {
            self.fail(id, Phase::Init, err);
        }
        id
    }

    /// Wraps `script` in a coroutine entity and registers it.
    pub fn generator<S: Script + 'static>(&mut self, script: S) -> EntityId {
        self.add_entity(direct_multi_timer(script))
    }

    fn index_of(&self, id: EntityId) -> Option<usize> {
        self.slots.binary_search_by_key(&id, |slot| slot.id).ok()
    }

    /// True once the entity reports itself dead, was killed, or has been swept.
    pub fn is_dead(&self, id: EntityId) -> bool {
        self.index_of(id).map_or(true, |index| self.slots[index].is_dead())
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        !self.is_dead(id)
    }

    /// Marks a live entity dead; it is swept at the end of the current tick. Returns false if
    /// the entity was already gone.
    pub fn kill(&mut self, id: EntityId) -> bool {
        match self.index_of(id) {
            Some(index) if !self.slots[index].is_dead() => {
                self.slots[index].killed = true;
                true
            }
            _ => false,
        }
    }

    // ---------- Handlers ----------
    /// Runs `handler` once, right after `id` is swept. Handlers for one entity fire in
    /// registration order. Registering on an entity that is already gone does nothing.
    pub fn on_kill(&mut self, id: EntityId, handler: impl FnOnce(&mut Game) + 'static) {
        if self.index_of(id).is_none() {
            tracing::debug!(entity = %id, "on_kill for an entity that is no longer live, dropping handler");
            return;
        }
        self.kill_handlers.entry(id).or_default().push(Box::new(handler));
    }

    /// Runs `handler` on every player death until `owner` is swept.
    pub fn on_player_dead(&mut self, owner: EntityId, handler: impl FnMut(&mut Game) + 'static) {
        if self.index_of(owner).is_none() {
            tracing::debug!(entity = %owner, "on_player_dead for an entity that is no longer live, dropping handler");
            return;
        }
        self.player_dead_handlers.push((owner, Box::new(handler)));
    }

    // ---------- Tick ----------
    pub fn iter_entities(&mut self) {
        self.time.tick();

        let count = self.slots.len();
        for index in 0..count {
            // slots only grow during the pass
            let slot = &mut self.slots[index];
            if slot.is_dead() {
                continue;
            }
            let id = slot.id;
            let Some(mut entity) = slot.entity.take() else {
                continue;
            };
            let previous = self.current.replace(id);
            let result = entity.iter(self);
            self.current = previous;
            self.slots[index].entity = Some(entity);
            if let Err(err) = result {
                self.fail(id, Phase::Iter, err);
            }
        }

        if self.player.just_died {
            self.broadcast_player_dead();
            self.player.just_died = false;
        }

        self.sweep();
    }

    /// Moves a manual clock forward by `step` and runs one tick.
    pub fn step(&mut self, step: f32) {
        self.time.advance_manual(step);
        self.iter_entities();
    }

    fn broadcast_player_dead(&mut self) {
        self.events.push(GameEvent::PlayerDied);
        let mut handlers = std::mem::take(&mut self.player_dead_handlers);
        for (_, handler) in handlers.iter_mut() {
            handler(self);
        }
        // keep handlers registered while broadcasting, after the existing ones
        handlers.append(&mut self.player_dead_handlers);
        self.player_dead_handlers = handlers;
    }

    fn sweep(&mut self) {
        let mut dead = Vec::new();
        self.slots.retain(|slot| {
            if slot.is_dead() {
                dead.push(slot.id);
                false
            } else {
                true
            }
        });

        for id in dead {
            self.player_dead_handlers.retain(|(owner, _)| *owner != id);
            self.events.push(GameEvent::EntityKilled { entity: id });
            if let Some(handlers) = self.kill_handlers.remove(&id) {
                for handler in handlers {
                    handler(self);
                }
            }
        }
    }

    fn fail(&mut self, id: EntityId, phase: Phase, err: Error) {
        tracing::error!(entity = %id, phase = phase.label(), "entity failed: {err:#}");
        self.events.push(GameEvent::EntityFailed { entity: id, message: format!("{err:#}") });
        if let Some(index) = self.index_of(id) {
            self.slots[index].killed = true;
        }
    }

    // ---------- Frame ----------
    /// Draws every live entity in ascending layer order; equal layers keep registration order.
    pub fn draw_entities(&mut self) {
        let mut order: Vec<(i32, EntityId)> = self
            .slots
            .iter()
            .filter(|slot| !slot.is_dead())
            .filter_map(|slot| slot.entity.as_ref().map(|entity| (entity.draw_layer(), slot.id)))
            .collect();
        order.sort_by_key(|&(layer, _)| layer);

        for (_, id) in order {
            let Some(index) = self.index_of(id) else {
                continue;
            };
            if self.slots[index].is_dead() {
                continue;
            }
            let Some(mut entity) = self.slots[index].entity.take() else {
                continue;
            };
            let previous = self.current.replace(id);
            let result = entity.draw(self);
            self.current = previous;
            if let Some(index) = self.index_of(id) {
                self.slots[index].entity = Some(entity);
            }
            if let Err(err) = result {
                self.fail(id, Phase::Draw, err);
            }
        }
    }

    pub fn flush_frame(&mut self) {
        self.renderer.flush();
    }

    /// One host frame: tick, draw, flush.
    pub fn run_frame(&mut self) {
        self.iter_entities();
        self.draw_entities();
        self.flush_frame();
    }
}
