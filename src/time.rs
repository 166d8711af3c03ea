use std::time::Instant;

enum Source {
    Wall { start: Instant },
    Manual { now: f32 },
}

/// Simulation clock. `t` is seconds since the session started, `dt` the clamped step
/// between the last two ticks.
pub struct Time {
    source: Source,
    max_delta: f32,
    t: f32,
    dt: f32,
}

impl Time {
    pub fn wall(max_delta: f32) -> Self {
        Self { source: Source::Wall { start: Instant::now() }, max_delta, t: 0.0, dt: 0.0 }
    }

    pub fn manual(max_delta: f32) -> Self {
        Self { source: Source::Manual { now: 0.0 }, max_delta, t: 0.0, dt: 0.0 }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self.source, Source::Manual { .. })
    }

    /// Moves a manual clock to `now`. Has no effect on a wall clock.
    pub fn set_manual(&mut self, now: f32) {
        if let Source::Manual { now: current } = &mut self.source {
            *current = now;
        }
    }

    pub fn advance_manual(&mut self, step: f32) {
        if let Source::Manual { now } = &mut self.source {
            *now += step;
        }
    }

    pub fn tick(&mut self) {
        let now = match &self.source {
            Source::Wall { start } => start.elapsed().as_secs_f32(),
            Source::Manual { now } => *now,
        };
        let last = self.t;
        self.t = now.max(last);
        self.dt = (self.t - last).min(self.max_delta);
    }

    pub fn t(&self) -> f32 {
        self.t
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn max_delta(&self) -> f32 {
        self.max_delta
    }
}
