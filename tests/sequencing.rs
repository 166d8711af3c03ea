use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::Result;
use phase_engine::ecs::{
    all_done, attack_tied, iter_only, multi_timer, repeat, script_fn, sequence, timer, AttackSwitch, BoxedEntity,
    Coroutine, Entity, Game, Steps, Timer,
};

const DT: f32 = 1.0 / 60.0;

type Log = Rc<RefCell<Vec<String>>>;

fn run_until(game: &mut Game, t: f32) {
    while game.t() < t {
        game.step(DT);
    }
}

/// Timer that reports its init and draw calls.
struct Tagged {
    tag: &'static str,
    timer: Timer,
    log: Log,
}

impl Tagged {
    fn new(tag: &'static str, duration: f32, log: &Log) -> Self {
        Self { tag, timer: timer(duration), log: Rc::clone(log) }
    }
}

impl Entity for Tagged {
    fn init(&mut self, game: &mut Game) -> Result<()> {
        self.log.borrow_mut().push(format!("{} init", self.tag));
        self.timer.init(game)
    }

    fn iter(&mut self, game: &mut Game) -> Result<()> {
        self.timer.iter(game)
    }

    fn draw(&mut self, _game: &mut Game) -> Result<()> {
        self.log.borrow_mut().push(format!("{} draw", self.tag));
        Ok(())
    }

    fn is_dead(&self) -> bool {
        self.timer.is_dead()
    }
}

#[test]
fn scripted_boss_loses_hp_after_two_seconds() {
    let mut game = Game::headless();
    let hp = Rc::new(Cell::new(10));
    let script_hp = Rc::clone(&hp);
    let boss = game.generator(
        Steps::new().wait(timer(2.0)).run(move |_| script_hp.set(script_hp.get() - 1)).wait(timer(2.0)),
    );

    let mut max_sub_entities = 0;
    while game.t() < 1.9 {
        game.step(DT);
        max_sub_entities = max_sub_entities.max(game.entity_count() - 1);
    }
    assert_eq!(hp.get(), 10, "unchanged at t=1.9");

    while game.t() < 2.1 {
        game.step(DT);
        max_sub_entities = max_sub_entities.max(game.entity_count().saturating_sub(1));
    }
    assert_eq!(hp.get(), 9, "decremented exactly once by t=2.1");

    while game.is_alive(boss) {
        game.step(DT);
        max_sub_entities = max_sub_entities.max(game.entity_count().saturating_sub(1));
    }
    assert_eq!(hp.get(), 9);
    assert!(max_sub_entities <= 1, "at most one timer alive at a time, saw {max_sub_entities}");
    assert!(game.t() > 4.0);
}

#[test]
fn sequence_routes_draws_and_inits_lazily() {
    let mut game = Game::headless();
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let steps: Vec<BoxedEntity> = vec![Box::new(Tagged::new("a", 1.0, &log)), Box::new(Tagged::new("b", 1.0, &log))];
    let id = game.add_entity(sequence(steps));
    assert_eq!(*log.borrow(), ["a init"]);

    run_until(&mut game, 0.5);
    game.draw_entities();
    assert_eq!(log.borrow().last().map(String::as_str), Some("a draw"));
    assert!(!log.borrow().iter().any(|entry| entry == "b init"));

    run_until(&mut game, 1.5);
    game.draw_entities();
    assert_eq!(log.borrow().last().map(String::as_str), Some("b draw"));
    assert!(log.borrow().iter().any(|entry| entry == "b init"));

    run_until(&mut game, 1.95);
    assert!(game.is_alive(id));
    run_until(&mut game, 2.2);
    assert!(game.is_dead(id), "sequence lasts about two seconds");
}

#[test]
fn all_done_tears_down_background_entities() {
    let mut game = Game::headless();
    let ticks = Rc::new(Cell::new(0));
    let counter = Rc::clone(&ticks);
    let primary: Vec<BoxedEntity> = vec![Box::new(timer(1.0))];
    let secondary: Vec<BoxedEntity> = vec![Box::new(iter_only(move |_| counter.set(counter.get() + 1)))];
    let wrapper = game.add_entity(all_done(primary, secondary));
    assert_eq!(game.entity_count(), 3);

    run_until(&mut game, 1.1);
    assert!(game.is_dead(wrapper));
    assert_eq!(game.entity_count(), 0);

    let frozen = ticks.get();
    run_until(&mut game, 1.5);
    assert_eq!(ticks.get(), frozen, "background entity is no longer iterated");
}

#[test]
fn all_done_ignores_secondaries_that_already_ended() {
    let mut game = Game::headless();
    let primary: Vec<BoxedEntity> = vec![Box::new(timer(1.0))];
    let secondary: Vec<BoxedEntity> = vec![Box::new(timer(0.2))];
    let wrapper = game.add_entity(all_done(primary, secondary));
    run_until(&mut game, 0.5);
    assert_eq!(game.entity_count(), 2);
    run_until(&mut game, 1.1);
    assert!(game.is_dead(wrapper));
    assert_eq!(game.entity_count(), 0);
}

#[test]
fn repeat_rebuilds_the_loop_body() {
    let mut game = Game::headless();
    let rounds = Rc::new(Cell::new(0));
    let counter = Rc::clone(&rounds);
    game.generator(repeat(move || {
        let counter = Rc::clone(&counter);
        Steps::new().run(move |_| counter.set(counter.get() + 1)).wait(timer(0.25))
    }));
    run_until(&mut game, 1.0);
    assert!(rounds.get() >= 3, "loop ran {} times", rounds.get());
}

#[test]
fn script_fn_finishes_when_it_yields_nothing() {
    let mut game = Game::headless();
    let mut remaining = 2;
    let id = game.generator(script_fn(move |_| {
        if remaining == 0 {
            return None;
        }
        remaining -= 1;
        Some(Box::new(timer(0.1)) as BoxedEntity)
    }));
    run_until(&mut game, 0.1);
    assert!(game.is_alive(id));
    run_until(&mut game, 0.5);
    assert!(game.is_dead(id));
}

#[test]
fn multi_timer_builds_its_script_on_init() {
    let mut game = Game::headless();
    let built_at = Rc::new(Cell::new(-1.0));
    let stamp = Rc::clone(&built_at);
    game.step(0.5);
    game.add_entity(multi_timer(move |game| {
        stamp.set(game.t());
        Steps::new().wait(timer(0.1))
    }));
    assert!((built_at.get() - 0.5).abs() < 1e-6);
}

#[test]
fn embedded_coroutine_is_polled_by_its_owner() {
    let mut game = Game::headless();
    let done = Rc::new(Cell::new(false));
    let flag = Rc::clone(&done);
    let mut coroutine = Coroutine::new(Steps::new().wait(timer(0.2)).run(move |_| flag.set(true)));
    assert!(!coroutine.poll(&mut game).expect("poll"));
    let waiting = coroutine.waiting_on().expect("suspended on the timer");
    run_until(&mut game, 0.3);
    assert!(game.is_dead(waiting));
    assert!(coroutine.poll(&mut game).expect("poll"));
    assert!(done.get());
    assert!(coroutine.is_finished());
}

#[test]
fn aborting_a_coroutine_kills_what_it_waits_on() {
    let mut game = Game::headless();
    let mut coroutine = Coroutine::new(Steps::new().wait(timer(5.0)));
    coroutine.poll(&mut game).expect("poll");
    let waiting = coroutine.waiting_on().expect("suspended on the timer");
    coroutine.abort(&mut game);
    assert!(game.is_dead(waiting));
    assert!(coroutine.is_finished());
}

#[test]
fn attack_switch_stops_tied_entities() {
    let mut game = Game::headless();
    let switch = AttackSwitch::new();
    let ticks = Rc::new(Cell::new(0));
    let counter = Rc::clone(&ticks);
    let id = game.add_entity(attack_tied(switch.clone(), iter_only(move |_| counter.set(counter.get() + 1))));
    game.step(DT);
    assert_eq!(ticks.get(), 1);
    switch.stop();
    game.step(DT);
    assert_eq!(ticks.get(), 1);
    assert!(game.is_dead(id));
}
