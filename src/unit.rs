//! Fragment writer and line tracker.
//!
//! Builds the single synthetic translation unit the front end sees. Every
//! entity (user fragment or probe) is written once, in order, and the writer
//! records which lines it occupies so diagnostics can be mapped back.
//!
//! Line numbers are 1-based, like compiler output. A range is half-open:
//! `start` is the line the cursor was on when the entity began, `end` is the
//! line after the last line it emitted. Entities always end with a newline,
//! so consecutive ranges never share a line and `end - start` equals the
//! number of newlines the entity emitted.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Text emission protocol for anything that goes into the unit.
///
/// The three parts are written back to back. Only `content` is user text;
/// prologue and epilogue are the synthetic wrapper around it.
pub trait WriteEntity {
    fn write_prologue(&self, _out: &mut String) {}

    fn write_content(&self, out: &mut String);

    fn write_epilogue(&self, _out: &mut String) {}
}

/// Handle of an entity written into a unit (its write-order index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub usize);

/// Lines occupied by one written entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    /// First line of the entity.
    pub start: u32,
    /// First line of the user content (after the prologue).
    pub content_start: u32,
    /// Line after the content (where the epilogue begins).
    pub content_end: u32,
    /// Line after the last emitted line.
    pub end: u32,
}

impl LineRange {
    #[inline]
    pub fn contains(&self, line: u32) -> bool {
        self.start <= line && line < self.end
    }

    /// Whether `line` belongs to the user content rather than the wrapper.
    #[inline]
    pub fn in_content(&self, line: u32) -> bool {
        self.content_start <= line && line < self.content_end
    }

    /// 1-based line relative to the start of the user content.
    #[inline]
    pub fn content_line(&self, line: u32) -> u32 {
        line.saturating_sub(self.content_start) + 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Sequential writer for a synthetic unit.
#[derive(Debug)]
pub struct UnitWriter {
    text: String,
    /// Line the cursor is on.
    line: u32,
    ranges: Vec<LineRange>,
}

impl Default for UnitWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitWriter {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            line: 1,
            ranges: Vec::new(),
        }
    }

    /// Line the next write will start on.
    pub fn next_line(&self) -> u32 {
        self.line
    }

    /// Append untracked text (includes and other boilerplate).
    ///
    /// Diagnostics on these lines are unattributable by construction.
    pub fn raw(&mut self, text: &str) {
        self.push(text);
        self.terminate_line();
    }

    /// Write an entity and record its line range.
    pub fn write<E: WriteEntity + ?Sized>(&mut self, entity: &E) -> EntityId {
        let start = self.line;

        let mut part = String::new();
        entity.write_prologue(&mut part);
        self.push(&part);
        self.terminate_line();
        let content_start = self.line;

        part.clear();
        entity.write_content(&mut part);
        self.push(&part);
        self.terminate_line();
        let content_end = self.line;

        part.clear();
        entity.write_epilogue(&mut part);
        self.push(&part);
        self.terminate_line();

        let range = LineRange {
            start,
            content_start,
            content_end,
            end: self.line,
        };
        debug!(
            start = range.start,
            content_start = range.content_start,
            end = range.end,
            "wrote unit entity #{}",
            self.ranges.len()
        );
        self.ranges.push(range);
        EntityId(self.ranges.len() - 1)
    }

    /// Close the writer into a unit that will live at `path`.
    pub fn finish(self, path: impl Into<PathBuf>) -> Unit {
        Unit {
            path: path.into(),
            text: self.text,
            ranges: self.ranges,
        }
    }

    fn push(&mut self, text: &str) {
        self.line += text.bytes().filter(|&b| b == b'\n').count() as u32;
        self.text.push_str(text);
    }

    /// Ensure the buffer ends on a line boundary.
    fn terminate_line(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.push("\n");
        }
    }
}

/// A synthesized translation unit with per-entity line ranges.
#[derive(Debug, Clone)]
pub struct Unit {
    path: PathBuf,
    text: String,
    ranges: Vec<LineRange>,
}

impl Unit {
    /// Path the front end should treat as the unit's own file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unit path as the front end spells it in diagnostics.
    pub fn file_name(&self) -> String {
        self.path.display().to_string()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Ranges in write order.
    pub fn ranges(&self) -> &[LineRange] {
        &self.ranges
    }

    pub fn range(&self, id: EntityId) -> LineRange {
        self.ranges[id.0]
    }

    /// Entity whose range contains `line`.
    ///
    /// Ranges are sorted and disjoint, so this is a binary search.
    pub fn locate(&self, line: u32) -> Option<EntityId> {
        let idx = self.ranges.partition_point(|r| r.end <= line);
        self.ranges
            .get(idx)
            .filter(|r| r.contains(line))
            .map(|_| EntityId(idx))
    }
}
