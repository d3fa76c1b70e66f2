//! chatline: timeline engine for personal chat-archive viewers.
//!
//! Turns a conversation's raw exported messages into a navigable, searchable
//! and replayable view-model for a virtualized list renderer.
//!
//! Follows a Pure Core / Impure Shell split: `normalize`, `timeline` and
//! `state` are pure and driven by explicit inputs; `source`, `logging` and
//! `view::cli` perform I/O.

pub mod config;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod source;
pub mod state;
pub mod timeline;
pub mod view;

#[cfg(test)]
mod test_harness;
