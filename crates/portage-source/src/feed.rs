// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Uniform read interface over the normalized message list.
//!
//! Small exports stay in memory. Exports whose file size exceeds the
//! configured threshold are staged to a JSON-lines spill file in
//! normalized ascending order, and the delivery loop streams records
//! from disk instead of holding the whole list in its working set.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use portage_core::{ExportMessage, PortageError};
use tracing::{debug, info};

/// The normalized, ascending message sequence the engine delivers from.
pub enum MessageFeed {
    /// Whole list resident in memory.
    Memory(Vec<ExportMessage>),
    /// List staged to a JSON-lines spill file.
    Spilled { path: PathBuf, len: usize },
}

impl MessageFeed {
    /// Number of migratable messages.
    pub fn len(&self) -> usize {
        match self {
            MessageFeed::Memory(v) => v.len(),
            MessageFeed::Spilled { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate `(index, message)` pairs starting at `start` (the resume
    /// index). For a spilled feed the preceding lines are skipped without
    /// being deserialized.
    pub fn iter_from(&self, start: usize) -> Result<FeedIter<'_>, PortageError> {
        match self {
            MessageFeed::Memory(v) => Ok(FeedIter {
                inner: FeedIterInner::Memory(v[start.min(v.len())..].iter()),
                next_index: start,
            }),
            MessageFeed::Spilled { path, .. } => {
                let file = std::fs::File::open(path).map_err(|e| PortageError::Export {
                    message: format!("cannot open spill file {}", path.display()),
                    source: Some(Box::new(e)),
                })?;
                let mut lines = BufReader::new(file).lines();
                for _ in 0..start {
                    if lines.next().is_none() {
                        break;
                    }
                }
                Ok(FeedIter {
                    inner: FeedIterInner::Spilled(lines),
                    next_index: start,
                })
            }
        }
    }
}

enum FeedIterInner<'a> {
    Memory(std::slice::Iter<'a, ExportMessage>),
    Spilled(std::io::Lines<BufReader<std::fs::File>>),
}

/// Iterator over `(index, message)` pairs from a [`MessageFeed`].
pub struct FeedIter<'a> {
    inner: FeedIterInner<'a>,
    next_index: usize,
}

impl Iterator for FeedIter<'_> {
    type Item = Result<(usize, ExportMessage), PortageError>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next_index;
        let item = match &mut self.inner {
            FeedIterInner::Memory(iter) => iter.next().map(|m| Ok(m.clone())),
            FeedIterInner::Spilled(lines) => lines.next().map(|line| {
                let line = line.map_err(|e| PortageError::Export {
                    message: format!("spill read failed at record {index}"),
                    source: Some(Box::new(e)),
                })?;
                serde_json::from_str(&line).map_err(|e| PortageError::Export {
                    message: format!("spill record {index} is corrupt"),
                    source: Some(Box::new(e)),
                })
            }),
        }?;
        self.next_index += 1;
        Some(item.map(|m| (index, m)))
    }
}

/// Stage a normalized list to a JSON-lines spill file, one record per
/// line in ascending order, and return a spilled feed over it.
pub fn stage_to_spill(
    messages: Vec<ExportMessage>,
    spill_path: impl AsRef<Path>,
) -> Result<MessageFeed, PortageError> {
    let spill_path = spill_path.as_ref();
    let len = messages.len();

    let file = std::fs::File::create(spill_path).map_err(|e| PortageError::Export {
        message: format!("cannot create spill file {}", spill_path.display()),
        source: Some(Box::new(e)),
    })?;
    let mut writer = std::io::BufWriter::new(file);
    for msg in &messages {
        let line = serde_json::to_string(msg).map_err(|e| PortageError::Export {
            message: "spill serialization failed".to_string(),
            source: Some(Box::new(e)),
        })?;
        writeln!(writer, "{line}").map_err(spill_io(spill_path))?;
    }
    writer.flush().map_err(spill_io(spill_path))?;

    info!(records = len, path = %spill_path.display(), "export staged to spill file");
    Ok(MessageFeed::Spilled {
        path: spill_path.to_path_buf(),
        len,
    })
}

fn spill_io(path: &Path) -> impl Fn(std::io::Error) -> PortageError + '_ {
    move |e| PortageError::Export {
        message: format!("spill write failed for {}", path.display()),
        source: Some(Box::new(e)),
    }
}

/// Load, normalize, and (when the export file exceeds the threshold)
/// spill-stage an export for delivery.
pub fn open_export(
    export_path: impl AsRef<Path>,
    spill_path: impl AsRef<Path>,
    spill_threshold_bytes: u64,
    include_deleted: bool,
) -> Result<MessageFeed, PortageError> {
    let export_path = export_path.as_ref();
    let size = std::fs::metadata(export_path)
        .map_err(|e| PortageError::Export {
            message: format!("cannot stat export file {}", export_path.display()),
            source: Some(Box::new(e)),
        })?
        .len();

    let page = crate::normalize::load_export(export_path)?;
    let messages = crate::normalize::normalize(vec![page], include_deleted);

    if size > spill_threshold_bytes {
        debug!(size, spill_threshold_bytes, "export exceeds threshold");
        stage_to_spill(messages, spill_path)
    } else {
        Ok(MessageFeed::Memory(messages))
    }
}
