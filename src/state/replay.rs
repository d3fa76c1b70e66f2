//! Replay scheduler.
//!
//! Reveals a conversation's messages one at a time, spaced by the real time
//! that passed between them, compressed by a speed multiplier and clamped to
//! a perceptible range.
//!
//! # States
//!
//! - `Idle`: nothing revealed
//! - `Playing`: a reveal timer is pending
//! - `Paused`: stopped part-way, no timer
//! - `Finished`: everything revealed, no timer
//!
//! At most one reveal timer exists at any time. Every transition cancels the
//! pending timer before it optionally arms a new one, so reveals can never be
//! duplicated or reordered.
//!
//! # Timing
//!
//! The first reveal from an empty view happens on the next poll after `play`.
//! Each later reveal waits `clamp(gap / speed, min_delay, max_delay)`, where
//! `gap` is the real time between the last revealed message and the next one.
//! If either of the two messages has a substituted timestamp the gap is
//! meaningless and `fallback_delay` is used instead.

use crate::model::{Message, SequenceNumber};
use crate::normalize::{is_chronological, sort_chronologically};
use crate::state::timer::{Millis, TimerSlot};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, trace};

pub const DEFAULT_MIN_DELAY_MS: Millis = 80;
pub const DEFAULT_MAX_DELAY_MS: Millis = 2_000;
pub const DEFAULT_FALLBACK_DELAY_MS: Millis = 1_000;
pub const DEFAULT_SPEED: f64 = 1.0;

// ===== ReplayConfig =====

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayConfig {
    /// Perceptibility floor for a reveal delay.
    pub min_delay_ms: Millis,
    /// Ceiling so long silences do not stall playback.
    pub max_delay_ms: Millis,
    /// Delay used when the real gap is unknown.
    pub fallback_delay_ms: Millis,
    /// Initial speed multiplier.
    pub default_speed: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: DEFAULT_MIN_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            fallback_delay_ms: DEFAULT_FALLBACK_DELAY_MS,
            default_speed: DEFAULT_SPEED,
        }
    }
}

// ===== ReplayPhase / ReplayEvent =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayPhase {
    Idle,
    Playing,
    Paused,
    Finished,
}

/// Observable outcome of a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayEvent {
    /// One more message became visible.
    Revealed {
        /// Position of the message in the replay sequence.
        index: usize,
        sequence: SequenceNumber,
        /// Deadline the reveal was scheduled for.
        at: Millis,
    },
    /// The last message was revealed.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("speed multiplier must be a positive finite number (got {0})")]
pub struct InvalidSpeed(pub f64);

// ===== ReplayScheduler =====

#[derive(Debug, Clone)]
pub struct ReplayScheduler {
    messages: Vec<Arc<Message>>,
    revealed: usize,
    phase: ReplayPhase,
    speed: f64,
    timer: TimerSlot,
    config: ReplayConfig,
}

impl ReplayScheduler {
    pub fn new(messages: Vec<Arc<Message>>, config: ReplayConfig) -> Self {
        let mut scheduler = Self {
            messages: Vec::new(),
            revealed: 0,
            phase: ReplayPhase::Idle,
            speed: sanitize_speed(config.default_speed),
            timer: TimerSlot::new(),
            config,
        };
        scheduler.load(messages);
        scheduler
    }

    /// Replace the message set, e.g. after a conversation or date filter
    /// change. Returns to `Idle`.
    pub fn load(&mut self, mut messages: Vec<Arc<Message>>) {
        if !is_chronological(&messages) {
            sort_chronologically(&mut messages);
        }
        self.messages = messages;
        self.reset();
    }

    // ----- Accessors -----

    pub fn phase(&self) -> ReplayPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == ReplayPhase::Playing
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed
    }

    pub fn total(&self) -> usize {
        self.messages.len()
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Messages revealed so far.
    pub fn visible(&self) -> &[Arc<Message>] {
        &self.messages[..self.revealed]
    }

    /// When the pending reveal is due, if one is pending.
    pub fn next_deadline(&self) -> Option<Millis> {
        self.timer.deadline()
    }

    pub fn has_pending_reveal(&self) -> bool {
        self.timer.is_pending()
    }

    // ----- Transitions -----

    /// Start or resume playback. No-op when `Playing` or `Finished`.
    pub fn play(&mut self, now: Millis) {
        match self.phase {
            ReplayPhase::Playing | ReplayPhase::Finished => {}
            ReplayPhase::Idle | ReplayPhase::Paused => {
                self.timer.cancel();
                if self.revealed >= self.total() {
                    self.enter(ReplayPhase::Finished);
                } else {
                    self.enter(ReplayPhase::Playing);
                    self.schedule_next(now);
                }
            }
        }
    }

    /// Stop playback, keeping revealed messages. Only affects `Playing`.
    pub fn pause(&mut self) {
        if self.phase == ReplayPhase::Playing {
            self.timer.cancel();
            self.enter(ReplayPhase::Paused);
        }
    }

    /// Jump to `target` revealed messages and pause there.
    pub fn seek(&mut self, target: usize) {
        self.timer.cancel();
        self.revealed = target.min(self.total());
        self.enter(ReplayPhase::Paused);
    }

    /// Change the speed multiplier.
    ///
    /// An already-pending reveal keeps its deadline; the new speed applies
    /// from the next scheduled reveal.
    pub fn set_speed(&mut self, multiplier: f64) -> Result<(), InvalidSpeed> {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(InvalidSpeed(multiplier));
        }
        self.speed = multiplier;
        debug!(speed = multiplier, "Replay speed changed");
        Ok(())
    }

    /// Back to `Idle` with nothing revealed.
    pub fn reset(&mut self) {
        self.timer.cancel();
        self.revealed = 0;
        self.enter(ReplayPhase::Idle);
    }

    /// Fire every reveal due at or before `now`.
    ///
    /// Follow-up reveals are scheduled from the deadline that fired, not from
    /// `now`, so late polling catches up without drifting.
    pub fn poll(&mut self, now: Millis) -> Vec<ReplayEvent> {
        let mut events = Vec::new();
        while let Some(fired) = self.timer.fire_if_due(now) {
            let index = self.revealed;
            self.revealed += 1;
            trace!(index, at = fired.due_at, "Replay reveal");
            events.push(ReplayEvent::Revealed {
                index,
                sequence: self.messages[index].sequence(),
                at: fired.due_at,
            });

            if self.revealed >= self.total() {
                self.enter(ReplayPhase::Finished);
                events.push(ReplayEvent::Finished);
                break;
            }
            self.schedule_next(fired.due_at);
        }
        events
    }

    /// Delay before revealing the message at `index`.
    pub fn delay_before(&self, index: usize) -> Millis {
        let Some(prev) = index.checked_sub(1).and_then(|i| self.messages.get(i)) else {
            return 0;
        };
        let Some(next) = self.messages.get(index) else {
            return self.config.fallback_delay_ms;
        };
        if prev.has_fallback_time() || next.has_fallback_time() {
            return self.config.fallback_delay_ms;
        }

        let gap = next.time().get().saturating_sub(prev.time().get()).max(0) as f64;
        let scaled = (gap / self.speed).round() as Millis;
        scaled.clamp(
            self.config.min_delay_ms,
            self.config.max_delay_ms.max(self.config.min_delay_ms),
        )
    }

    fn schedule_next(&mut self, from: Millis) {
        let delay = self.delay_before(self.revealed);
        self.timer.arm(from, delay);
    }

    fn enter(&mut self, phase: ReplayPhase) {
        if self.phase != phase {
            debug!(from = ?self.phase, to = ?phase, revealed = self.revealed, "Replay transition");
        }
        self.phase = phase;
    }
}

fn sanitize_speed(speed: f64) -> f64 {
    if speed.is_finite() && speed > 0.0 {
        speed
    } else {
        DEFAULT_SPEED
    }
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
