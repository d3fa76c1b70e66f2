//! Jump coordinator.
//!
//! Resolves navigation targets (sequence number, calendar day, search hit)
//! to timeline item offsets and drives the list renderer. Also owns the
//! one-shot settle delay used on initial display, before the renderer has
//! finished its first layout.

use crate::model::{NavigationError, SequenceNumber};
use crate::state::search::SearchHit;
use crate::state::timer::{Millis, TimerSlot};
use crate::timeline::{ItemIndex, Timeline, TimelineIndex};
use crate::view::{ScrollAlign, VirtualListRenderer};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// Default wait before the initial scroll.
pub const DEFAULT_SETTLE_DELAY_MS: Millis = 100;

// ===== JumpTarget =====

/// Something the user or an external collaborator wants to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JumpTarget {
    /// A message by its sequence number.
    Sequence(SequenceNumber),
    /// The first separator of a calendar day.
    Day(NaiveDate),
    /// The message behind a search hit.
    Hit(SequenceNumber),
}

impl From<&SearchHit> for JumpTarget {
    fn from(hit: &SearchHit) -> Self {
        Self::Hit(hit.sequence())
    }
}

impl JumpTarget {
    /// Item offset for this target, if the index knows it.
    pub fn resolve(&self, index: &TimelineIndex) -> Option<ItemIndex> {
        match self {
            Self::Sequence(seq) | Self::Hit(seq) => index.item_for_sequence(*seq),
            Self::Day(day) => index.item_for_day(*day),
        }
    }

    /// Alignment used when no explicit one is requested.
    ///
    /// Days start at the top; single messages are centred with context.
    pub fn default_align(&self) -> ScrollAlign {
        match self {
            Self::Day(_) => ScrollAlign::Start,
            Self::Sequence(_) | Self::Hit(_) => ScrollAlign::Center,
        }
    }
}

// ===== JumpCoordinator =====

/// Scroll waiting for the settle delay to elapse.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DeferredScroll {
    /// Deep link supplied with the initial display.
    Target(JumpTarget),
    /// No deep link: show the newest item.
    LastItem,
}

#[derive(Debug, Clone)]
pub struct JumpCoordinator {
    settle: TimerSlot,
    deferred: Option<DeferredScroll>,
    settle_delay_ms: Millis,
}

impl Default for JumpCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_DELAY_MS)
    }
}

impl JumpCoordinator {
    pub fn new(settle_delay_ms: Millis) -> Self {
        Self {
            settle: TimerSlot::new(),
            deferred: None,
            settle_delay_ms,
        }
    }

    /// Resolve `target` and scroll the renderer to it.
    ///
    /// An explicit jump supersedes a pending initial scroll. When the target
    /// is absent the renderer is not touched.
    pub fn jump<R: VirtualListRenderer + ?Sized>(
        &mut self,
        target: JumpTarget,
        align: ScrollAlign,
        index: &TimelineIndex,
        renderer: &mut R,
    ) -> Result<ItemIndex, NavigationError> {
        let Some(item) = target.resolve(index) else {
            debug!(?target, "Jump target not in timeline");
            return Err(NavigationError::TargetUnavailable { target });
        };
        self.cancel_settle();
        debug!(?target, item, ?align, "Jumping");
        renderer.scroll_to_index(item, align);
        Ok(item)
    }

    /// Schedule the initial scroll after the settle delay.
    ///
    /// With a deep link the target is centred; without one the last item is
    /// brought to the bottom of the viewport.
    pub fn on_initial_display(&mut self, now: Millis, deep_link: Option<JumpTarget>) {
        self.deferred = Some(match deep_link {
            Some(target) => DeferredScroll::Target(target),
            None => DeferredScroll::LastItem,
        });
        self.settle.arm(now, self.settle_delay_ms);
    }

    /// Fire the settle delay if due.
    ///
    /// Returns the item scrolled to. A deep link that is not in the timeline
    /// is reported and the view falls back to showing nothing special.
    pub fn poll<R: VirtualListRenderer + ?Sized>(
        &mut self,
        now: Millis,
        timeline: &Timeline,
        renderer: &mut R,
    ) -> Option<Result<ItemIndex, NavigationError>> {
        self.settle.fire_if_due(now)?;
        let deferred = self.deferred.take()?;

        let outcome = match deferred {
            DeferredScroll::Target(target) => match target.resolve(timeline.index()) {
                Some(item) => {
                    renderer.scroll_to_index(item, ScrollAlign::Center);
                    Ok(item)
                }
                None => {
                    warn!(?target, "Deep link target not in timeline");
                    Err(NavigationError::TargetUnavailable { target })
                }
            },
            DeferredScroll::LastItem => match timeline.last_index() {
                Some(item) => {
                    renderer.scroll_to_index(item, ScrollAlign::End);
                    Ok(item)
                }
                None => return None,
            },
        };
        Some(outcome)
    }

    /// Cancel pending deferred work. Called when the owning view goes away.
    pub fn teardown(&mut self) {
        self.cancel_settle();
    }

    pub fn has_pending_settle(&self) -> bool {
        self.settle.is_pending()
    }

    pub fn settle_deadline(&self) -> Option<Millis> {
        self.settle.deadline()
    }

    fn cancel_settle(&mut self) {
        if self.settle.cancel().is_some() {
            debug!("Settle delay cancelled");
        }
        self.deferred = None;
    }
}

#[cfg(test)]
#[path = "jump_tests.rs"]
mod tests;
