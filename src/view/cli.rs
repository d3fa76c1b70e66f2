//! Command-line shell (impure).
//!
//! Loads one conversation from an export file, prints its timeline, and
//! optionally searches, jumps and replays it in real time. All decisions are
//! made by [`ConversationView`]; this module only does I/O and sleeping.

use crate::model::{AppError, ConversationId, SequenceNumber};
use crate::source::{FileSource, MessageSource, TimeRange};
use crate::state::jump::JumpTarget;
use crate::state::replay::ReplayEvent;
use crate::state::timer::Millis;
use crate::state::{ConversationView, ViewSettings};
use crate::view::text::{message_line, TextRenderer};
use chrono::Utc;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Conversation id used when neither the caller nor the export names one.
pub const FALLBACK_CONVERSATION: &str = "archive";

/// Viewport height used when printing around a jump target.
pub const JUMP_WINDOW_HEIGHT: usize = 11;

/// What the shell should do, parsed from the command line.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub file: PathBuf,
    pub conversation: Option<String>,
    pub range: Option<TimeRange>,
    pub search: Option<String>,
    pub jump_seq: Option<i64>,
    pub replay: bool,
}

/// Run the shell against `options`, writing to `out`.
///
/// # Errors
///
/// Returns `AppError` when the export cannot be loaded, the conversation id
/// is empty, or writing to `out` fails. Navigation misses are printed, not
/// returned.
pub fn run<W: Write>(
    options: &RunOptions,
    settings: ViewSettings,
    out: &mut W,
) -> Result<(), AppError> {
    let source = FileSource::open(&options.file, settings.offset)?;
    let conversation = pick_conversation(options, &source)?;
    let records = source.fetch(&conversation, options.range.as_ref())?;

    let mut view = ConversationView::new(settings);
    let label_now = Utc::now().with_timezone(&settings.offset);
    view.load(conversation.clone(), &records, options.range, label_now);
    info!(
        conversation = %conversation,
        items = view.timeline().len(),
        "Timeline ready"
    );

    writeln!(out, "# {conversation} ({} messages)", view.messages().len())?;
    if let Some(seq) = view.timeline().duplicate_sequences().first() {
        writeln!(
            out,
            "# warning: {} duplicate sequence numbers (first: {seq})",
            view.timeline().duplicate_sequences().len()
        )?;
    }

    match options.jump_seq {
        Some(seq) => print_around(&mut view, SequenceNumber::new(seq), out)?,
        None => writeln!(out, "{}", TextRenderer::render_all(view.timeline()))?,
    }

    if let Some(query) = &options.search {
        view.set_search_query(query.as_str());
        print_hits(&view, query, out)?;
    }

    if options.replay {
        replay(&mut view, out)?;
    }

    view.teardown();
    Ok(())
}

fn pick_conversation(
    options: &RunOptions,
    source: &FileSource,
) -> Result<ConversationId, AppError> {
    if let Some(id) = &options.conversation {
        return Ok(ConversationId::new(id.as_str())?);
    }
    let found = source.conversations();
    if found.len() > 1 {
        warn!(count = found.len(), "Export holds several conversations, using the first");
    }
    let id = found
        .into_iter()
        .next()
        .unwrap_or_else(|| FALLBACK_CONVERSATION.to_string());
    Ok(ConversationId::new(id)?)
}

/// Print a window centred on `seq` using the settle-delayed deep link path.
fn print_around<W: Write>(
    view: &mut ConversationView,
    seq: SequenceNumber,
    out: &mut W,
) -> Result<(), AppError> {
    let mut renderer = TextRenderer::new(JUMP_WINDOW_HEIGHT);
    renderer.set_item_count(view.timeline().len());

    view.display(0, Some(JumpTarget::Sequence(seq)));
    let due = view.jump_coordinator().settle_deadline().unwrap_or(0);
    match view.poll(due, &mut renderer).scrolled {
        Some(Ok(_)) => writeln!(out, "{}", renderer.render(view.timeline()))?,
        Some(Err(e)) => writeln!(out, "# {e}")?,
        None => writeln!(out, "# nothing to show")?,
    }
    Ok(())
}

fn print_hits<W: Write>(view: &ConversationView, query: &str, out: &mut W) -> Result<(), AppError> {
    let hits = view.search().hits();
    writeln!(out, "# {} hits for {query:?}", hits.len())?;
    for hit in hits {
        writeln!(
            out,
            "  #{:<8} {}: {}",
            hit.sequence().get(),
            hit.message().sender_name(),
            hit.snippet()
        )?;
    }
    Ok(())
}

/// Replay in real time, sleeping until each reveal deadline.
fn replay<W: Write>(view: &mut ConversationView, out: &mut W) -> Result<(), AppError> {
    writeln!(
        out,
        "# replay at {}x ({} messages)",
        view.replay().speed(),
        view.replay().total()
    )?;

    let start = Instant::now();
    let elapsed = || start.elapsed().as_millis() as Millis;
    view.replay_mut().play(elapsed());

    loop {
        for event in view.replay_mut().poll(elapsed()) {
            match event {
                ReplayEvent::Revealed { index, .. } => {
                    if let Some(message) = view.replay().visible().get(index) {
                        writeln!(out, "{}", message_line(message))?;
                        out.flush()?;
                    }
                }
                ReplayEvent::Finished => {
                    writeln!(out, "# replay finished")?;
                    return Ok(());
                }
            }
        }
        let Some(deadline) = view.replay().next_deadline() else {
            // nothing was pending, so there was nothing to reveal
            writeln!(out, "# replay finished")?;
            return Ok(());
        };
        let wait = deadline.saturating_sub(elapsed());
        std::thread::sleep(Duration::from_millis(wait));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_export(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("chatline_cli_{}_{name}", std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    const EXPORT: &str = r#"[
        {"seq": 1, "time": 1709812800, "talker": "friend", "sender": "alice", "senderName": "Alice", "content": "lunch today?"},
        {"seq": 2, "time": 1709812830, "talker": "friend", "sender": "bob", "senderName": "Bob", "content": "yes, lunch at noon"},
        {"seq": 3, "time": 1709812840, "talker": "other", "sender": "carol", "content": "unrelated"}
    ]"#;

    fn run_to_string(options: &RunOptions) -> String {
        let mut out = Vec::new();
        run(options, ViewSettings::default(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn prints_first_conversation_timeline() {
        let file = write_export("timeline.json", EXPORT);
        let output = run_to_string(&RunOptions {
            file: file.clone(),
            ..RunOptions::default()
        });
        let _ = fs::remove_file(file);

        assert!(output.starts_with("# friend (2 messages)"));
        assert!(output.contains("Alice: lunch today?"));
        assert!(!output.contains("unrelated"));
    }

    #[test]
    fn prints_search_hits() {
        let file = write_export("search.json", EXPORT);
        let output = run_to_string(&RunOptions {
            file: file.clone(),
            search: Some("LUNCH".to_string()),
            ..RunOptions::default()
        });
        let _ = fs::remove_file(file);

        assert!(output.contains("# 2 hits for \"LUNCH\""));
    }

    #[test]
    fn missing_jump_target_is_reported_not_fatal() {
        let file = write_export("jump.json", EXPORT);
        let output = run_to_string(&RunOptions {
            file: file.clone(),
            jump_seq: Some(99),
            ..RunOptions::default()
        });
        let _ = fs::remove_file(file);

        assert!(output.contains("navigation unavailable"));
    }

    #[test]
    fn replay_reveals_every_message() {
        let file = write_export("replay.json", EXPORT);
        let output = run_to_string(&RunOptions {
            file: file.clone(),
            conversation: Some("other".to_string()),
            replay: true,
            ..RunOptions::default()
        });
        let _ = fs::remove_file(file);

        assert!(output.contains("# replay at 1x (1 messages)"));
        assert!(output.contains("unrelated"));
        assert!(output.trim_end().ends_with("# replay finished"));
    }

    #[test]
    fn missing_file_is_source_error() {
        let mut out = Vec::new();
        let result = run(
            &RunOptions {
                file: PathBuf::from("/nonexistent/chatline/export.json"),
                ..RunOptions::default()
            },
            ViewSettings::default(),
            &mut out,
        );
        assert!(matches!(result, Err(AppError::Source(_))));
    }

    #[test]
    fn empty_conversation_flag_is_rejected() {
        let file = write_export("empty_id.json", EXPORT);
        let mut out = Vec::new();
        let result = run(
            &RunOptions {
                file: file.clone(),
                conversation: Some("  ".to_string()),
                ..RunOptions::default()
            },
            ViewSettings::default(),
            &mut out,
        );
        let _ = fs::remove_file(file);

        assert!(matches!(result, Err(AppError::Conversation(_))));
    }
}
