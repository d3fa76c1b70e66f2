//! Plain-text list renderer.
//!
//! Renders a viewport of timeline items as lines of text. Used by the CLI and
//! by snapshot tests; real hosts plug in their own [`VirtualListRenderer`].

use crate::model::{Message, MessageKind};
use crate::timeline::{ItemIndex, Timeline, TimelineItem};
use crate::view::{ScrollAlign, VirtualListRenderer};
use unicode_width::UnicodeWidthStr;

/// Fixed-height viewport over a timeline.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    height: usize,
    item_count: usize,
    top: usize,
}

impl TextRenderer {
    pub fn new(height: usize) -> Self {
        Self {
            height: height.max(1),
            item_count: 0,
            top: 0,
        }
    }

    /// Adopt a new item list. Keeps the current position when still valid.
    pub fn set_item_count(&mut self, item_count: usize) {
        self.item_count = item_count;
        self.top = self.top.min(self.max_top());
    }

    /// First visible item.
    pub fn top(&self) -> usize {
        self.top
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn max_top(&self) -> usize {
        self.item_count.saturating_sub(self.height)
    }

    /// Render the visible window, one line per item.
    pub fn render(&self, timeline: &Timeline) -> String {
        if timeline.is_empty() {
            return "(no messages)".to_string();
        }
        timeline
            .items()
            .iter()
            .skip(self.top)
            .take(self.height)
            .map(render_item)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Render every item regardless of viewport.
    pub fn render_all(timeline: &Timeline) -> String {
        if timeline.is_empty() {
            return "(no messages)".to_string();
        }
        timeline
            .items()
            .iter()
            .map(render_item)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl VirtualListRenderer for TextRenderer {
    fn scroll_to_index(&mut self, index: ItemIndex, align: ScrollAlign) {
        let index = index.min(self.item_count.saturating_sub(1));
        let top = match align {
            ScrollAlign::Start => index,
            ScrollAlign::Center => index.saturating_sub(self.height / 2),
            ScrollAlign::End => (index + 1).saturating_sub(self.height),
        };
        self.top = top.min(self.max_top());
    }
}

fn render_item(item: &TimelineItem) -> String {
    match item {
        TimelineItem::DateSeparator { label, .. } => {
            let rule = "─".repeat(12usize.saturating_sub(label.width() / 2).max(2));
            format!("{rule} {label} {rule}")
        }
        TimelineItem::MessageRow {
            message,
            show_sender_name: true,
            ..
        } => message_line(message),
        TimelineItem::MessageRow { message, .. } => {
            format!("{}   {}", direction_marker(message), body_text(message))
        }
    }
}

/// A message on one line with its sender, as shown at the start of a run.
pub fn message_line(message: &Message) -> String {
    format!(
        "{} {}: {}",
        direction_marker(message),
        message.sender_name(),
        body_text(message)
    )
}

fn direction_marker(message: &Message) -> &'static str {
    if message.is_outgoing() {
        ">"
    } else {
        " "
    }
}

/// One-line stand-in for a message body. Only text is shown verbatim.
fn body_text(message: &Message) -> String {
    let placeholder = match message.kind() {
        MessageKind::Text => return message.text().replace('\n', " "),
        MessageKind::Image => "[image]",
        MessageKind::Voice => "[voice]",
        MessageKind::ContactCard => "[contact card]",
        MessageKind::Video => "[video]",
        MessageKind::Sticker => "[sticker]",
        MessageKind::Location => "[location]",
        MessageKind::Rich => "[link]",
        MessageKind::Call => "[call]",
        MessageKind::System => return format!("* {} *", message.text()),
        MessageKind::Gap => "[history not loaded]",
        MessageKind::EmptyRange => "[no messages in range]",
        MessageKind::Unknown(_) => "[unsupported message]",
    };
    if message.text().is_empty() {
        placeholder.to_string()
    } else {
        format!("{placeholder} {}", message.text().replace('\n', " "))
    }
}
