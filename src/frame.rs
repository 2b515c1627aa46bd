//! Frame loop plumbing: clock, lifetime token and scheduling.
//!
//! The scene renders continuously while it is alive. Each frame asks the
//! [`FrameScheduler`] for the next one, but only after checking the scene's
//! [`Lifetime`]; destroying the scene cancels the lifetime first, so the
//! chain of frames ends on the next tick instead of relying on the host to
//! drop the scene.

use std::{cell::Cell, rc::Rc, sync::Arc};

use instant::{Duration, Instant};
use winit::window::Window;

/// Monotonic frame clock.
#[derive(Debug)]
pub struct Clock {
    start: Instant,
    last_tick: Instant,
}

impl Clock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_tick: now,
        }
    }

    /// Time since the previous tick; advances the clock.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick);
        self.last_tick = now;
        delta
    }

    /// Time since the clock was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellation token shared between a scene and whoever drives its frames.
///
/// Clones observe the same state. Once cancelled it stays cancelled.
#[derive(Clone, Debug, Default)]
pub struct Lifetime {
    cancelled: Rc<Cell<bool>>,
}

impl Lifetime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_alive(&self) -> bool {
        !self.cancelled.get()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }
}

/// Asks the host for one more frame on its next display refresh.
pub trait FrameScheduler {
    fn request_frame(&self);
}

/// Schedules frames through winit redraw requests, which map to
/// `requestAnimationFrame` on the web.
#[derive(Debug)]
pub struct WindowScheduler {
    window: Arc<Window>,
}

impl WindowScheduler {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }
}

impl FrameScheduler for WindowScheduler {
    fn request_frame(&self) {
        self.window.request_redraw();
    }
}
