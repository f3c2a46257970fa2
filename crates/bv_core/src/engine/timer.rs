/// timer.rs
/// Frame-rate independent timers
///
/// The match ticks once per rendered frame with a variable `dt`. Anything that
/// must fire on a fixed cadence (countdown steps, highlight blinking) runs on
/// an accumulator so a long frame catches up on every missed step instead of
/// skipping them.

/// Clamp a frame delta to something the engine can consume.
/// Negative and non-finite deltas become zero.
pub fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 {
        dt
    } else {
        0.0
    }
}

/// Decrement a timer, flooring at zero.
pub fn tick_down(timer: &mut f32, dt: f32) {
    *timer = (*timer - dt).max(0.0);
}

/// One-shot timer that never goes below zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageTimer {
    remaining: f32,
}

impl StageTimer {
    pub fn new(secs: f32) -> Self {
        Self { remaining: secs.max(0.0) }
    }

    pub fn set(&mut self, secs: f32) {
        self.remaining = secs.max(0.0);
    }

    /// Advance and report whether the timer is (now or already) expired.
    pub fn tick(&mut self, dt: f32) -> bool {
        tick_down(&mut self.remaining, dt);
        self.expired()
    }

    pub fn expired(&self) -> bool {
        self.remaining <= 0.0
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }
}

/// Repeating accumulator. Time goes in through `elapse`, whole periods come
/// out one at a time through `take_step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepTimer {
    period: f32,
    until_next: f32,
}

impl StepTimer {
    pub fn new(period: f32) -> Self {
        Self { period, until_next: period }
    }

    pub fn reset(&mut self) {
        self.until_next = self.period;
    }

    pub fn elapse(&mut self, dt: f32) {
        self.until_next -= dt;
    }

    pub fn take_step(&mut self) -> bool {
        if self.until_next <= 0.0 {
            self.until_next += self.period;
            true
        } else {
            false
        }
    }

    /// Discard any backlog; the next step is a full period away.
    pub fn discard_backlog(&mut self) {
        if self.until_next <= 0.0 {
            self.until_next = self.period;
        }
    }

    pub fn until_next(&self) -> f32 {
        self.until_next
    }
}
