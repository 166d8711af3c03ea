use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::{anyhow, Result};
use phase_engine::ecs::{draw_only, iter_only, timer, Entity, EntityId, Game};
use phase_engine::events::GameEvent;

const DT: f32 = 1.0 / 60.0;

type Log = Rc<RefCell<Vec<String>>>;

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

struct Failing {
    in_init: bool,
}

impl Entity for Failing {
    fn init(&mut self, _game: &mut Game) -> Result<()> {
        if self.in_init {
            return Err(anyhow!("init exploded"));
        }
        Ok(())
    }

    fn iter(&mut self, _game: &mut Game) -> Result<()> {
        Err(anyhow!("iter exploded"))
    }

    fn is_dead(&self) -> bool {
        false
    }
}

#[test]
fn kill_handlers_fire_once_in_registration_order() {
    let mut game = Game::headless();
    let fired = log();
    let id = game.add_entity(timer(0.1));
    for tag in ["first", "second"] {
        let fired = Rc::clone(&fired);
        game.on_kill(id, move |_| fired.borrow_mut().push(tag.to_string()));
    }

    game.step(0.05);
    assert!(fired.borrow().is_empty(), "timer still running");
    game.step(0.1);
    assert_eq!(*fired.borrow(), ["first", "second"]);

    let late = Rc::clone(&fired);
    game.on_kill(id, move |_| late.borrow_mut().push("late".to_string()));
    game.step(0.1);
    game.step(0.1);
    assert_eq!(fired.borrow().len(), 2, "handler registered after death never fires");
}

#[test]
fn kill_marks_dead_until_the_sweep() {
    let mut game = Game::headless();
    let id = game.add_entity(iter_only(|_| {}));
    assert!(game.is_alive(id));
    assert!(game.kill(id));
    assert!(game.is_dead(id));
    assert!(!game.kill(id), "second kill is a no-op");
    assert_eq!(game.entity_count(), 1);
    game.step(DT);
    assert_eq!(game.entity_count(), 0);
    assert!(game.is_dead(id));
}

#[test]
fn player_death_reaches_live_owners_only() {
    let mut game = Game::headless();
    let heard = Rc::new(Cell::new(0));
    let owner = game.add_entity(iter_only(|_| {}));
    let counter = Rc::clone(&heard);
    game.on_player_dead(owner, move |_| counter.set(counter.get() + 1));

    game.player.just_died = true;
    game.step(DT);
    assert_eq!(heard.get(), 1);
    assert!(!game.player.just_died, "flag is consumed by the broadcast");

    game.step(DT);
    assert_eq!(heard.get(), 1, "no broadcast without a new death");

    game.kill(owner);
    game.step(DT);
    game.player.just_died = true;
    game.step(DT);
    assert_eq!(heard.get(), 1, "handler is dropped with its owner");
    assert_eq!(game.drain_events().iter().filter(|event| **event == GameEvent::PlayerDied).count(), 2);
}

#[test]
fn entities_added_mid_tick_wait_for_the_next_tick() {
    let mut game = Game::headless();
    let visits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&visits);
    let mut spawned = false;
    game.add_entity(iter_only(move |game| {
        if !spawned {
            spawned = true;
            let counter = Rc::clone(&counter);
            game.add_entity(iter_only(move |_| counter.set(counter.get() + 1)));
        }
    }));

    game.step(DT);
    assert_eq!(visits.get(), 0);
    assert_eq!(game.entity_count(), 2);
    game.step(DT);
    assert_eq!(visits.get(), 1);
}

#[test]
fn entity_killed_earlier_in_the_tick_is_skipped() {
    let mut game = Game::headless();
    let target: Rc<Cell<Option<EntityId>>> = Rc::new(Cell::new(None));
    let aim = Rc::clone(&target);
    game.add_entity(iter_only(move |game| {
        if let Some(id) = aim.get() {
            game.kill(id);
        }
    }));
    let visits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&visits);
    let victim = game.add_entity(iter_only(move |_| counter.set(counter.get() + 1)));
    target.set(Some(victim));

    game.step(DT);
    assert_eq!(visits.get(), 0);
    assert!(game.is_dead(victim));
}

#[test]
fn failing_entities_are_logged_and_killed() {
    let mut game = Game::headless();
    let survivor = game.add_entity(iter_only(|_| {}));
    let broken_init = game.add_entity(Failing { in_init: true });
    assert!(game.is_dead(broken_init));

    let broken_iter = game.add_entity(Failing { in_init: false });
    assert!(game.is_alive(broken_iter));
    game.step(DT);
    assert!(game.is_dead(broken_iter));
    assert!(game.is_alive(survivor), "one failure does not stop the loop");

    let failures: Vec<String> = game
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            GameEvent::EntityFailed { message, .. } => Some(message),
            _ => None,
        })
        .collect();
    assert_eq!(failures, ["init exploded", "iter exploded"]);
    assert_eq!(game.entity_count(), 1);
}

#[test]
fn draw_pass_is_ordered_by_layer_and_keeps_registration_order() {
    let mut game = Game::headless();
    let drawn = log();
    let mut ids = Vec::new();
    for (tag, layer) in [("top", 2), ("back-a", -1), ("middle", 0), ("back-b", -1)] {
        let drawn = Rc::clone(&drawn);
        ids.push(game.add_entity(draw_only(move |_| drawn.borrow_mut().push(tag.to_string()), Some(layer))));
    }

    game.draw_entities();
    assert_eq!(*drawn.borrow(), ["back-a", "back-b", "middle", "top"]);
    assert_eq!(game.live_ids().collect::<Vec<_>>(), ids, "draw sorting leaves the live set untouched");
}

#[test]
fn run_frame_ticks_draws_and_flushes() {
    let mut game = Game::headless();
    let frames = Rc::new(Cell::new(0));
    let counter = Rc::clone(&frames);
    game.add_entity(draw_only(move |_| counter.set(counter.get() + 1), None));
    game.time_mut().advance_manual(DT);
    game.run_frame();
    game.time_mut().advance_manual(DT);
    game.run_frame();
    assert_eq!(frames.get(), 2);
    assert!((game.t() - 2.0 * DT).abs() < 1e-6);
}

#[test]
fn dt_is_clamped_to_the_configured_maximum() {
    let mut game = Game::headless();
    game.step(1.0);
    assert!((game.dt() - game.config.max_frame_delta).abs() < 1e-6);
    assert!((game.t() - 1.0).abs() < 1e-6);
}
