//! crates/quran_reader_core/src/debouncer.rs
//!
//! Arbitrates between the two writers of the visible list position: the reader's
//! own scrolling and the programmatic scrolls issued after a jump. While a
//! programmatic scroll (plus its settle window) is running, observed positions
//! are not fed back into the cursor.
//!
//! Time is passed in explicitly so the coordinator stays a plain state machine.

use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_SETTLE: Duration = Duration::from_millis(800);

/// Longest a programmatic scroll animation may take before it is treated as
/// finished, for hosts that never report the end of one.
pub const MAX_ANIMATION: Duration = Duration::from_secs(2);

/// What the host should do with a programmatic scroll request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollCommand {
    /// Animate the list to this index.
    Animate(usize),
    /// The target is already on screen; nothing to do.
    AlreadyVisible,
    /// Empty list or out-of-bounds target.
    Ignore,
}

#[derive(Debug, Clone)]
pub struct ScrollCoordinator {
    settle: Duration,
    /// First and last visible index, inclusive.
    visible: Option<(usize, usize)>,
    last_top: Option<usize>,
    jumping: bool,
    /// `None` while the animation is still running.
    settle_deadline: Option<Instant>,
    /// Clears the flag if the end of the animation is never reported.
    fallback_deadline: Option<Instant>,
}

impl Default for ScrollCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE)
    }
}

impl ScrollCoordinator {
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            visible: None,
            last_top: None,
            jumping: false,
            settle_deadline: None,
            fallback_deadline: None,
        }
    }

    /// Feeds the visible range. Returns the new top index when it is an organic
    /// move the cursor should adopt.
    pub fn observe_viewport(&mut self, first: usize, last: usize, now: Instant) -> Option<usize> {
        self.visible = Some((first.min(last), first.max(last)));
        if self.last_top == Some(first) {
            return None;
        }
        self.last_top = Some(first);
        if self.is_jumping(now) {
            debug!("Dropping organic scroll to {} during a programmatic scroll", first);
            return None;
        }
        Some(first)
    }

    pub fn request_scroll(&mut self, target: usize, len: usize, now: Instant) -> ScrollCommand {
        if len == 0 || target >= len {
            return ScrollCommand::Ignore;
        }
        if self
            .visible
            .is_some_and(|(first, last)| (first..=last).contains(&target))
        {
            return ScrollCommand::AlreadyVisible;
        }
        // A jump issued inside another settle window restarts it.
        let _ = self.is_jumping(now);
        self.jumping = true;
        self.settle_deadline = None;
        self.fallback_deadline = Some(now + MAX_ANIMATION + self.settle);
        ScrollCommand::Animate(target)
    }

    /// The host reports the end of the animated scroll; the settle window opens.
    pub fn animation_finished(&mut self, now: Instant) {
        if self.jumping {
            self.settle_deadline = Some(now + self.settle);
            self.fallback_deadline = None;
        }
    }

    pub fn is_jumping(&mut self, now: Instant) -> bool {
        let expired = self
            .settle_deadline
            .or(self.fallback_deadline)
            .is_some_and(|deadline| now >= deadline);
        if expired {
            if self.settle_deadline.is_none() {
                debug!("No end of animation reported, clearing the jump flag");
            }
            self.jumping = false;
            self.settle_deadline = None;
            self.fallback_deadline = None;
        }
        self.jumping
    }

    /// When the current settle window closes, if one is open.
    pub fn settle_deadline(&self) -> Option<Instant> {
        self.settle_deadline
    }

    /// Forgets the viewport, as after the list content was replaced.
    pub fn reset(&mut self) {
        self.visible = None;
        self.last_top = None;
        self.jumping = false;
        self.settle_deadline = None;
        self.fallback_deadline = None;
    }
}
