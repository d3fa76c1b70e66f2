//! Archive export files.
//!
//! An export is either a single JSON array of records or a JSONL stream with
//! one record per line. The file is read once on construction; records of
//! several conversations may be mixed in one file.

use crate::model::error::SourceError;
use crate::model::ConversationId;
use crate::normalize::RawRecord;
use crate::source::{select_records, MessageSource, TimeRange};
use chrono::FixedOffset;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Read-once export file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    records: Vec<RawRecord>,
    offset: FixedOffset,
}

impl FileSource {
    /// Load every record from `path`.
    ///
    /// `offset` interprets zone-less timestamps when filtering by range.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::FileNotFound` if the file does not exist,
    /// `SourceError::Io` if it cannot be read and
    /// `SourceError::InvalidDocument` if it starts like a JSON array but is
    /// not one.
    pub fn open(path: impl AsRef<Path>, offset: FixedOffset) -> Result<Self, SourceError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SourceError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let io_err = |source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = BufReader::new(File::open(path).map_err(io_err)?);
        let records = if starts_with_array(&mut reader).map_err(io_err)? {
            let mut text = String::new();
            reader.read_to_string(&mut text).map_err(io_err)?;
            parse_array(&text).map_err(|reason| SourceError::InvalidDocument {
                path: path.to_path_buf(),
                reason,
            })?
        } else {
            parse_lines(reader).map_err(io_err)?
        };

        debug!(path = %path.display(), records = records.len(), "Export loaded");
        Ok(Self {
            path: path.to_path_buf(),
            records,
            offset,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record in the file, unfiltered.
    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    /// Distinct talker ids in first-seen order.
    pub fn conversations(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for talker in self.records.iter().filter_map(|r| r.talker.as_ref()) {
            if !seen.contains(talker) {
                seen.push(talker.clone());
            }
        }
        seen
    }
}

impl MessageSource for FileSource {
    fn fetch(
        &self,
        conversation: &ConversationId,
        range: Option<&TimeRange>,
    ) -> Result<Vec<RawRecord>, SourceError> {
        Ok(select_records(
            &self.records,
            conversation,
            range,
            self.offset,
        ))
    }
}

/// Peek past leading whitespace for `[`.
fn starts_with_array<R: BufRead>(reader: &mut R) -> std::io::Result<bool> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(false);
        }
        let skip = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
        if skip < buf.len() {
            let first = buf[skip];
            reader.consume(skip);
            return Ok(first == b'[');
        }
        let len = buf.len();
        reader.consume(len);
    }
}

fn parse_array(text: &str) -> Result<Vec<RawRecord>, String> {
    let values: Vec<Value> = serde_json::from_str(text).map_err(|e| e.to_string())?;
    Ok(values.into_iter().map(RawRecord::from_json_value).collect())
}

/// One record per non-blank line. Lines that are not JSON become records
/// flagged as non-objects so they still surface as messages.
fn parse_lines<R: BufRead>(reader: R) -> std::io::Result<Vec<RawRecord>> {
    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = match serde_json::from_str::<Value>(line) {
            Ok(value) => RawRecord::from_json_value(value),
            Err(e) => {
                warn!(line = line_no + 1, error = %e, "Unparseable export line");
                RawRecord::from_json_value(Value::Null)
            }
        };
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_harness::{conversation, utc};
    use std::fs;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("chatline_{}_{name}", std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn open_returns_file_not_found_for_missing_file() {
        let missing = std::env::temp_dir().join("chatline_nonexistent_export_12345.json");
        let result = FileSource::open(&missing, utc());
        assert!(
            matches!(result, Err(SourceError::FileNotFound { ref path }) if *path == missing),
            "got: {result:?}"
        );
    }

    #[test]
    fn reads_json_array() {
        let path = write_temp(
            "array.json",
            r#"  [{"seq":1,"time":100,"talker":"friend","content":"hi"},
                 {"seq":2,"time":200,"talker":"other","content":"yo"}]"#,
        );
        let source = FileSource::open(&path, utc()).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(source.records().len(), 2);
        assert_eq!(source.conversations(), vec!["friend", "other"]);
        let records = source.fetch(&conversation(), None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content.as_deref(), Some("hi"));
    }

    #[test]
    fn reads_jsonl_and_keeps_bad_lines() {
        let path = write_temp(
            "lines.jsonl",
            "{\"seq\":1,\"time\":100,\"content\":\"a\"}\n\nnot json\n{\"seq\":2,\"time\":200}\n",
        );
        let source = FileSource::open(&path, utc()).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(source.records().len(), 3);
        assert!(source.records()[1].not_an_object);
    }

    #[test]
    fn malformed_array_is_invalid_document() {
        let path = write_temp("broken.json", "[{\"seq\":1},");
        let result = FileSource::open(&path, utc());
        let _ = fs::remove_file(&path);

        assert!(matches!(result, Err(SourceError::InvalidDocument { .. })));
    }

    #[test]
    fn empty_file_has_no_records() {
        let path = write_temp("empty.jsonl", "");
        let source = FileSource::open(&path, utc()).unwrap();
        let _ = fs::remove_file(&path);

        assert!(source.records().is_empty());
    }
}
