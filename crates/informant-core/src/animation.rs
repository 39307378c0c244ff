//! Press-feedback timing: one `f32` moved by a delayed linear tween, read
//! against a per-thread clock that tests can drive by hand.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use web_time::{Duration, Instant};

thread_local! {
    // Animations tick on the UI thread, so the clock is per-thread too.
    static CLOCK: RefCell<Option<Rc<dyn Clock>>> = RefCell::new(None);
}

fn now() -> Instant {
    CLOCK
        .with(|c| c.borrow().as_ref().map(|c| c.now()))
        .unwrap_or_else(Instant::now)
}

pub trait Clock: 'static {
    fn now(&self) -> Instant;
}

/// Installs the animation clock for the calling thread, replacing any
/// previous one. Without one, animations read the system clock.
pub fn set_clock(clock: Rc<dyn Clock>) {
    CLOCK.with(|c| *c.borrow_mut() = Some(clock));
}

/// Manually advanced clock.
pub struct TestClock {
    t: Cell<Instant>,
}

impl TestClock {
    pub fn new(t: Instant) -> Rc<Self> {
        Rc::new(Self { t: Cell::new(t) })
    }

    pub fn advance(&self, by: Duration) {
        self.t.set(self.t.get() + by);
    }
}

impl Clock for TestClock {
    fn now(&self) -> Instant {
        self.t.get()
    }
}

/// Hold for `delay`, then move linearly over `duration`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationSpec {
    pub duration: Duration,
    pub delay: Duration,
}

impl AnimationSpec {
    pub fn linear(duration: Duration) -> Self {
        Self {
            duration,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fraction of the run done `elapsed` after it started; `None` once over.
    fn progress(&self, elapsed: Duration) -> Option<f32> {
        let Some(run) = elapsed.checked_sub(self.delay) else {
            return Some(0.0);
        };
        if run >= self.duration {
            return None;
        }
        Some(run.as_secs_f32() / self.duration.as_secs_f32())
    }
}

/// A scalar easing towards its target on every [`AnimatedValue::update`].
#[derive(Clone, Debug)]
pub struct AnimatedValue {
    value: f32,
    from: f32,
    to: f32,
    spec: AnimationSpec,
    started: Option<Instant>,
}

impl AnimatedValue {
    pub fn new(initial: f32, spec: AnimationSpec) -> Self {
        Self {
            value: initial,
            from: initial,
            to: initial,
            spec,
            started: None,
        }
    }

    /// Restarts the run from wherever the value is now.
    pub fn set_target(&mut self, to: f32) {
        self.from = self.value;
        self.to = to;
        self.started = Some(now());
    }

    /// Advances against the clock; `true` while still running.
    pub fn update(&mut self) -> bool {
        let Some(start) = self.started else {
            return false;
        };
        match self.spec.progress(now().saturating_duration_since(start)) {
            Some(t) => {
                self.value = self.from + (self.to - self.from) * t;
                true
            }
            None => {
                self.value = self.to;
                self.started = None;
                false
            }
        }
    }

    pub fn get(&self) -> f32 {
        self.value
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn is_animating(&self) -> bool {
        self.started.is_some()
    }
}
