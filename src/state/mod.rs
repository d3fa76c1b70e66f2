//! View-model state machines (pure).
//!
//! Everything here is driven by explicit inputs: message sets, queries and a
//! caller-supplied millisecond clock. Nothing reads the wall clock or sleeps.

pub mod conversation_view;
pub mod jump;
pub mod replay;
pub mod search;
pub mod timer;

pub use conversation_view::{ConversationView, ViewEvents, ViewSettings};
pub use jump::{JumpCoordinator, JumpTarget};
pub use replay::{InvalidSpeed, ReplayConfig, ReplayEvent, ReplayPhase, ReplayScheduler};
pub use search::{search_messages, SearchConfig, SearchHit, SearchQuery, SearchState};
pub use timer::{Millis, TimerSlot};
