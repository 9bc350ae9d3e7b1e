//! Frame-driven progress animation.
//!
//! [`ProgressAnimator`] interpolates a progress value over time. It owns no
//! clock: the caller drives it with [`ProgressAnimator::tick`] from its frame
//! loop and passes the frame time in. Each tick reports the interpolated
//! value through the `on_update` callback; the final tick also fires
//! `on_complete`.
//!
//! [`RouteFollower`] builds on it to move a marker along a [`RouteGeometry`]
//! from one [`TrackFrame`] to the next.
//!
//! [`RouteGeometry`]: crate::geometry::RouteGeometry
//! [`TrackFrame`]: crate::session::TrackFrame

pub mod follower;

pub use follower::{AnimatedMarker, RouteFollower};

use std::fmt;
use std::time::{Duration, Instant};

/// Below this difference an animation completes immediately.
pub const MIN_ANIMATED_DELTA: f64 = 0.001;

type UpdateFn = Box<dyn FnMut(f64)>;
type CompleteFn = Box<dyn FnOnce()>;

struct Animation {
    start: f64,
    target: f64,
    duration: Duration,
    started_at: Instant,
    on_update: UpdateFn,
    on_complete: CompleteFn,
}

impl Animation {
    fn value_at(&self, now: Instant) -> (f64, bool) {
        let elapsed = now.saturating_duration_since(self.started_at);
        let fraction = (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0);
        let finished = elapsed >= self.duration;
        if finished {
            (self.target, true)
        } else {
            (self.start + (self.target - self.start) * fraction, false)
        }
    }
}

/// A cancellable linear interpolator driven by caller frame ticks.
#[derive(Default)]
pub struct ProgressAnimator {
    current: Option<Animation>,
}

impl fmt::Debug for ProgressAnimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("ProgressAnimator");
        if let Some(animation) = &self.current {
            debug
                .field("start", &animation.start)
                .field("target", &animation.target)
                .field("duration", &animation.duration);
        }
        debug.field("running", &self.is_running()).finish()
    }
}

impl ProgressAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an animation is in flight.
    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    /// Value the animation is heading to, while running.
    pub fn target(&self) -> Option<f64> {
        self.current.as_ref().map(|animation| animation.target)
    }

    /// Start animating from `start` to `target` over `duration`.
    ///
    /// Any in-flight animation is cancelled first, without completing. A
    /// zero duration or a change of at most [`MIN_ANIMATED_DELTA`] calls
    /// `on_update(target)` and then `on_complete()` before returning.
    pub fn animate<U, C>(
        &mut self,
        start: f64,
        target: f64,
        duration: Duration,
        now: Instant,
        mut on_update: U,
        on_complete: C,
    ) where
        U: FnMut(f64) + 'static,
        C: FnOnce() + 'static,
    {
        self.cancel();

        if duration.is_zero() || (target - start).abs() <= MIN_ANIMATED_DELTA {
            on_update(target);
            on_complete();
            return;
        }

        self.current = Some(Animation {
            start,
            target,
            duration,
            started_at: now,
            on_update: Box::new(on_update),
            on_complete: Box::new(on_complete),
        });
    }

    /// Advance to frame time `now`.
    ///
    /// Returns `true` while the animation still has frames to run. Ticking
    /// an idle animator does nothing and returns `false`.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(animation) = self.current.as_mut() else {
            return false;
        };

        let (value, finished) = animation.value_at(now);
        (animation.on_update)(value);

        if !finished {
            return true;
        }

        if let Some(animation) = self.current.take() {
            (animation.on_complete)();
        }
        false
    }

    /// Stop the in-flight animation. Completion is not fired. Safe to call
    /// when idle.
    pub fn cancel(&mut self) {
        self.current = None;
    }
}
