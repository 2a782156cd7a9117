use std::fmt::Display;
use std::ops::Range;

use derive_more::Deref;
use derive_more::DerefMut;
use serde::Deserialize;
use serde::Serialize;

/// The name shared by an open and a close region marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TagName {
	/// `#jupman-raise` … `#/jupman-raise`: the body is replaced by a
	/// placeholder statement in exercises.
	Raise,
	/// `#jupman-strip` … `#/jupman-strip`: the body only survives in
	/// solutions.
	Strip,
	/// `#jupman-purge` … `#/jupman-purge`: the body never survives.
	Purge,
}

impl TagName {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Raise => "jupman-raise",
			Self::Strip => "jupman-strip",
			Self::Purge => "jupman-purge",
		}
	}

	/// The text that opens a region, e.g. `#jupman-strip`.
	pub fn open_marker(self) -> String {
		format!("#{}", self.as_str())
	}

	/// The text that closes a region, e.g. `#/jupman-strip`.
	pub fn close_marker(self) -> String {
		format!("#/{}", self.as_str())
	}
}

impl Display for TagName {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

/// Single-line markers whose effect reaches the end of the enclosing region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Marker {
	/// `# SOLUTION` in code.
	Solution,
	/// `# write here` in code.
	WriteHere,
	/// `**ANSWER**:` in rich text.
	Answer,
}

impl Display for Marker {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Solution => write!(f, "# SOLUTION"),
			Self::WriteHere => write!(f, "# write here"),
			Self::Answer => write!(f, "**ANSWER**:"),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagEventKind {
	Open(TagName),
	Close(TagName),
	Standalone(Marker),
}

impl Display for TagEventKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Open(name) => write!(f, "#{name}"),
			Self::Close(name) => write!(f, "#/{name}"),
			Self::Standalone(marker) => write!(f, "{marker}"),
		}
	}
}

/// A 1-indexed line/column location together with its byte offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
	pub line: usize,
	pub column: usize,
	pub offset: usize,
}

/// One tag occurrence in a text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEvent {
	pub kind: TagEventKind,
	/// Byte range of the marker text itself.
	pub span: Range<usize>,
	/// Where the marker starts.
	pub start: Point,
}

/// The flat, offset-ordered list of tag events of one text body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut)]
pub struct TagEvents(
	#[deref]
	#[deref_mut]
	Vec<TagEvent>,
);

impl TagEvents {
	pub fn new(mut events: Vec<TagEvent>) -> Self {
		events.sort_by_key(|event| event.span.start);
		Self(events)
	}

	pub fn into_inner(self) -> Vec<TagEvent> {
		self.0
	}
}

/// Pre-computed line starts for offset-to-point conversion.
pub(crate) struct LineTable {
	line_starts: Vec<usize>,
}

impl LineTable {
	pub(crate) fn new(content: &str) -> Self {
		let mut line_starts = vec![0];
		for (i, byte) in content.bytes().enumerate() {
			if byte == b'\n' {
				line_starts.push(i + 1);
			}
		}
		Self { line_starts }
	}

	pub(crate) fn point(&self, offset: usize) -> Point {
		let line_idx = match self.line_starts.binary_search(&offset) {
			Ok(exact) => exact,
			Err(insert) => insert.saturating_sub(1),
		};

		Point {
			line: line_idx + 1,
			column: offset - self.line_starts[line_idx] + 1,
			offset,
		}
	}
}
