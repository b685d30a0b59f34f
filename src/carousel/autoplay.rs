//! Automatic carousel advance.

use std::time::Duration;
use web_time::Instant;

/// A cancellable periodic deadline.
///
/// Nothing runs in the background: the host polls
/// [`CarouselController::tick`](super::CarouselController::tick) from its
/// frame loop or interval callback, and the controller asks this timer
/// whether the next advance is due.
#[derive(Debug, Clone)]
pub struct AutoAdvance {
    /// Delay between advances.
    interval: Duration,

    /// When the next advance is due. `None` while cancelled.
    deadline: Option<Instant>,
}

impl AutoAdvance {
    /// Create a stopped timer.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Schedule the next advance one interval after `now`.
    ///
    /// Also used to push the deadline back after manual navigation.
    pub fn restart(&mut self, now: Instant) {
        self.deadline = Some(now + self.interval);
        log::trace!("🖼️ Autoplay scheduled in {:?}", self.interval);
    }

    /// Stop the timer until the next restart.
    pub fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            log::trace!("🖼️ Autoplay cancelled");
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.deadline.is_some()
    }

    /// Check whether the deadline has passed.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Time left until the next advance, if scheduled.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}
