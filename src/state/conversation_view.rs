//! One conversation's view-model.
//!
//! Composes the subsystems over a single loaded message set: the timeline,
//! keyword search, the jump coordinator and the replay scheduler. Loading a
//! conversation is always a full reload; nothing is merged incrementally.

use crate::model::{ConversationId, Message, NavigationError, SequenceNumber};
use crate::normalize::{normalize_batch, NormalizeContext, RawRecord};
use crate::source::TimeRange;
use crate::state::jump::{JumpCoordinator, JumpTarget, DEFAULT_SETTLE_DELAY_MS};
use crate::state::replay::{ReplayConfig, ReplayEvent, ReplayScheduler};
use crate::state::search::{SearchConfig, SearchState};
use crate::state::timer::Millis;
use crate::timeline::{
    build_timeline, ItemIndex, RelativeLabeler, SeparatorLabeler, Timeline, TimelineContext,
    DEFAULT_GROUP_GAP_MS,
};
use crate::view::{ScrollAlign, VirtualListRenderer};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::sync::Arc;
use tracing::info;

/// Tunables for every subsystem of a view.
#[derive(Debug, Clone, Copy)]
pub struct ViewSettings {
    /// Offset defining calendar days and reading zone-less timestamps.
    pub offset: FixedOffset,
    pub group_gap_ms: u64,
    pub search: SearchConfig,
    pub replay: ReplayConfig,
    pub settle_delay_ms: Millis,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
            group_gap_ms: DEFAULT_GROUP_GAP_MS,
            search: SearchConfig::default(),
            replay: ReplayConfig::default(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }
}

/// What a poll of the view produced.
#[derive(Debug, Default, PartialEq)]
pub struct ViewEvents {
    /// Outcome of the settle-delayed initial scroll, if it fired.
    pub scrolled: Option<Result<ItemIndex, NavigationError>>,
    pub replay: Vec<ReplayEvent>,
}

pub struct ConversationView {
    settings: ViewSettings,
    labeler: Box<dyn SeparatorLabeler>,
    conversation: Option<ConversationId>,
    /// Everything the source returned, before the date filter.
    loaded: Vec<Arc<Message>>,
    /// Messages passing the date filter, in timeline order.
    messages: Vec<Arc<Message>>,
    filter: Option<TimeRange>,
    label_now: DateTime<FixedOffset>,
    timeline: Timeline,
    search: SearchState,
    jump: JumpCoordinator,
    replay: ReplayScheduler,
}

impl std::fmt::Debug for ConversationView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationView")
            .field("conversation", &self.conversation)
            .field("messages", &self.messages.len())
            .field("items", &self.timeline.len())
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl ConversationView {
    pub fn new(settings: ViewSettings) -> Self {
        Self::with_labeler(settings, Box::new(RelativeLabeler))
    }

    /// View using a custom separator label formatter.
    pub fn with_labeler(settings: ViewSettings, labeler: Box<dyn SeparatorLabeler>) -> Self {
        Self {
            labeler,
            conversation: None,
            loaded: Vec::new(),
            messages: Vec::new(),
            filter: None,
            label_now: Utc::now().with_timezone(&settings.offset),
            timeline: Timeline::default(),
            search: SearchState::new(),
            jump: JumpCoordinator::new(settings.settle_delay_ms),
            replay: ReplayScheduler::new(Vec::new(), settings.replay),
            settings,
        }
    }

    // ----- Accessors -----

    pub fn conversation(&self) -> Option<&ConversationId> {
        self.conversation.as_ref()
    }

    /// Messages currently in view, after the date filter.
    pub fn messages(&self) -> &[Arc<Message>] {
        &self.messages
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    /// Mutable search state for panel and hit navigation.
    pub fn search_mut(&mut self) -> &mut SearchState {
        &mut self.search
    }

    pub fn replay(&self) -> &ReplayScheduler {
        &self.replay
    }

    pub fn replay_mut(&mut self) -> &mut ReplayScheduler {
        &mut self.replay
    }

    pub fn jump_coordinator(&self) -> &JumpCoordinator {
        &self.jump
    }

    pub fn date_filter(&self) -> Option<&TimeRange> {
        self.filter.as_ref()
    }

    // ----- Loading -----

    /// Replace the view's content with `records` of `conversation`.
    ///
    /// Cancels the previous replay timer and settle delay before anything
    /// else. `label_now` is the reference instant for separator labels.
    pub fn load(
        &mut self,
        conversation: ConversationId,
        records: &[RawRecord],
        range: Option<TimeRange>,
        label_now: DateTime<FixedOffset>,
    ) {
        self.teardown();

        let ctx = NormalizeContext::new(conversation.clone(), self.settings.offset);
        self.loaded = normalize_batch(records, &ctx)
            .into_iter()
            .map(Arc::new)
            .collect();
        info!(
            conversation = %conversation,
            messages = self.loaded.len(),
            "Conversation loaded"
        );
        self.conversation = Some(conversation);
        self.filter = range;
        self.label_now = label_now;
        self.apply_filter();
    }

    /// Narrow or widen the visible range. Replay restarts from the beginning.
    pub fn set_date_filter(&mut self, range: Option<TimeRange>) {
        self.replay.reset();
        self.filter = range;
        self.apply_filter();
    }

    fn apply_filter(&mut self) {
        self.messages = match &self.filter {
            Some(range) => self
                .loaded
                .iter()
                .filter(|m| range.admits(m))
                .cloned()
                .collect(),
            None => self.loaded.clone(),
        };
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let ctx = TimelineContext::new(self.settings.offset, self.label_now)
            .with_group_gap_ms(self.settings.group_gap_ms);
        self.timeline = build_timeline(&self.messages, &ctx, self.labeler.as_ref());
        self.search.refresh(&self.messages, &self.settings.search);
        self.replay.load(self.messages.clone());
    }

    /// Cancel every pending deferred action. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        self.jump.teardown();
        self.replay.reset();
    }

    // ----- Search -----

    /// Run a keyword search over the visible messages.
    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search
            .set_query(query, &self.messages, &self.settings.search);
    }

    // ----- Navigation -----

    /// Arm the initial scroll. Call once the renderer has the item list.
    pub fn display(&mut self, now: Millis, deep_link: Option<JumpTarget>) {
        self.jump.on_initial_display(now, deep_link);
    }

    pub fn jump<R: VirtualListRenderer + ?Sized>(
        &mut self,
        target: JumpTarget,
        align: ScrollAlign,
        renderer: &mut R,
    ) -> Result<ItemIndex, NavigationError> {
        self.jump
            .jump(target, align, self.timeline.index(), renderer)
    }

    /// Entry point for the external full-text search service.
    pub fn jump_to_sequence<R: VirtualListRenderer + ?Sized>(
        &mut self,
        sequence: SequenceNumber,
        renderer: &mut R,
    ) -> Result<ItemIndex, NavigationError> {
        self.jump(JumpTarget::Sequence(sequence), ScrollAlign::Center, renderer)
    }

    /// Jump to the selected search hit, if any.
    pub fn jump_to_current_hit<R: VirtualListRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
    ) -> Option<Result<ItemIndex, NavigationError>> {
        let target = JumpTarget::from(self.search.current_hit()?);
        Some(self.jump(target, ScrollAlign::Center, renderer))
    }

    // ----- Time -----

    /// Fire all deferred work due at `now`.
    pub fn poll<R: VirtualListRenderer + ?Sized>(
        &mut self,
        now: Millis,
        renderer: &mut R,
    ) -> ViewEvents {
        ViewEvents {
            scrolled: self.jump.poll(now, &self.timeline, renderer),
            replay: self.replay.poll(now),
        }
    }

    /// Earliest pending deadline across subsystems.
    pub fn next_deadline(&self) -> Option<Millis> {
        [self.jump.settle_deadline(), self.replay.next_deadline()]
            .into_iter()
            .flatten()
            .min()
    }
}

#[cfg(test)]
#[path = "conversation_view_tests.rs"]
mod tests;
