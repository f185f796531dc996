//! Project-scoped text file access.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// File access error.
#[derive(Debug, Error)]
pub enum FsError {
    /// The requested file does not exist.
    #[error("File not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reads and writes UTF-8 text relative to a project root.
#[derive(Debug, Clone, Copy)]
pub struct FileAccessor<'a> {
    root: &'a Path,
}

impl<'a> FileAccessor<'a> {
    pub fn new(root: &'a Path) -> Self {
        Self { root }
    }

    /// Resolve `relative` against the project root.
    ///
    /// An absolute `relative` replaces the root, matching `Path::join`.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Read a whole file. Invalid UTF-8 sequences are dropped.
    pub async fn read(&self, relative: &str) -> Result<String, FsError> {
        let path = self.resolve(relative);
        if !tokio::fs::try_exists(&path).await? {
            return Err(FsError::NotFound(relative.to_string()));
        }

        let bytes = tokio::fs::read(&path).await?;
        Ok(decode_dropping_invalid(&bytes))
    }

    /// Write a whole file, creating missing parent directories.
    pub async fn write(&self, relative: &str, content: &str) -> Result<(), FsError> {
        let path = self.resolve(relative);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&path, content.as_bytes()).await?;
        Ok(())
    }
}

/// Decode UTF-8, skipping invalid byte sequences instead of replacing them.
pub fn decode_dropping_invalid(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

/// Select a window of lines.
///
/// Without `line` the content is returned unchanged. Otherwise `line` is
/// 1-based and clamped to the first line. `limit` bounds the window end at
/// `line + limit`; an end that falls below zero counts back from the last
/// line, so `line = 1, limit = -1` drops the final line. Selected lines are
/// joined with `\n`.
pub fn select_lines(content: &str, line: Option<i64>, limit: Option<i64>) -> String {
    let Some(line) = line else {
        return content.to_string();
    };

    let lines = split_lines(content);
    let count = i64::try_from(lines.len()).unwrap_or(i64::MAX);
    let start = line.saturating_sub(1).clamp(0, count);
    let end = match limit {
        None => count,
        Some(limit) => match start.saturating_add(limit) {
            end if end < 0 => (end + count).max(0),
            end => end.min(count),
        },
    };

    if start >= end {
        return String::new();
    }
    // Both bounds lie in `0..=count`.
    lines[start as usize..end as usize].join("\n")
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{1c}'..='\u{1e}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Split on every Unicode line boundary, treating `\r\n` as one break.
///
/// A trailing break does not produce an empty last line.
fn split_lines(content: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = content.char_indices().peekable();

    while let Some((at, c)) = chars.next() {
        if !is_line_break(c) {
            continue;
        }
        lines.push(&content[start..at]);
        start = at + c.len_utf8();
        if c == '\r'
            && let Some(&(next, '\n')) = chars.peek()
        {
            chars.next();
            start = next + 1;
        }
    }

    if start < content.len() {
        lines.push(&content[start..]);
    }
    lines
}
