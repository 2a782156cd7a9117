use std::ops::Range;

use serde::Deserialize;
use serde::Serialize;

use crate::lexer::Dialect;
use crate::lexer::tokenize;
use crate::tokens::Point;
use crate::tokens::TagEvent;
use crate::tokens::TagEventKind;
use crate::tokens::TagEvents;
use crate::tokens::TagName;

/// A diagnostic produced while pairing region markers. These never stop
/// processing: the pairs that do balance are still used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TagDiagnostic {
	/// An open marker without a matching close marker.
	UnclosedRegion {
		name: TagName,
		line: usize,
		column: usize,
	},
	/// A close marker without a preceding open marker.
	UnopenedRegion {
		name: TagName,
		line: usize,
		column: usize,
	},
}

impl TagDiagnostic {
	pub fn name(&self) -> TagName {
		match self {
			Self::UnclosedRegion { name, .. } | Self::UnopenedRegion { name, .. } => *name,
		}
	}

	pub fn line(&self) -> usize {
		match self {
			Self::UnclosedRegion { line, .. } | Self::UnopenedRegion { line, .. } => *line,
		}
	}

	pub fn column(&self) -> usize {
		match self {
			Self::UnclosedRegion { column, .. } | Self::UnopenedRegion { column, .. } => *column,
		}
	}

	/// Human-readable message for this diagnostic.
	pub fn message(&self) -> String {
		match self {
			Self::UnclosedRegion { name, .. } => {
				format!("`#{name}` is never closed by `#/{name}`")
			}
			Self::UnopenedRegion { name, .. } => {
				format!("`#/{name}` closes a region that was never opened")
			}
		}
	}
}

/// A balanced pair of region markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRegion {
	pub name: TagName,
	/// Byte range of the open marker text.
	pub open: Range<usize>,
	/// Byte range of the close marker text.
	pub close: Range<usize>,
	/// Location of the open marker.
	pub start: Point,
}

impl TagRegion {
	/// From the first byte of the open marker to the last byte of the close
	/// marker.
	pub fn span(&self) -> Range<usize> {
		self.open.start..self.close.end
	}

	/// The text between the two markers.
	pub fn body(&self) -> Range<usize> {
		self.open.end..self.close.start
	}
}

/// Everything the tokenizer and the pairing pass found in one body.
#[derive(Debug, Clone, Default)]
pub struct ParsedTags {
	/// Balanced regions ordered by their open marker.
	pub regions: Vec<TagRegion>,
	/// Standalone markers ordered by offset.
	pub standalones: Vec<TagEvent>,
	pub diagnostics: Vec<TagDiagnostic>,
}

impl ParsedTags {
	pub fn has_region(&self, name: TagName) -> bool {
		self.regions.iter().any(|region| region.name == name)
	}

	pub fn is_empty(&self) -> bool {
		self.regions.is_empty() && self.standalones.is_empty()
	}
}

/// Tokenize and pair the tags of a text body.
pub fn parse(text: &str, dialect: Dialect) -> ParsedTags {
	let events = tokenize(text, dialect);
	build_from_events(events)
}

/// Split events into standalone markers and balanced regions.
pub fn build_from_events(events: TagEvents) -> ParsedTags {
	let mut pending: Vec<TagEvent> = vec![];
	let mut regions = vec![];
	let mut standalones = vec![];
	let mut diagnostics = vec![];

	for event in events.into_inner() {
		match event.kind {
			TagEventKind::Standalone(_) => standalones.push(event),
			TagEventKind::Open(_) => pending.push(event),
			TagEventKind::Close(name) => {
				// The nearest unmatched open of the same name.
				let pos = pending
					.iter()
					.rposition(|open| open.kind == TagEventKind::Open(name));
				if let Some(idx) = pos {
					let open = pending.remove(idx);
					regions.push(TagRegion {
						name,
						open: open.span,
						close: event.span,
						start: open.start,
					});
				} else {
					diagnostics.push(TagDiagnostic::UnopenedRegion {
						name,
						line: event.start.line,
						column: event.start.column,
					});
				}
			}
		}
	}

	for open in pending {
		if let TagEventKind::Open(name) = open.kind {
			diagnostics.push(TagDiagnostic::UnclosedRegion {
				name,
				line: open.start.line,
				column: open.start.column,
			});
		}
	}

	regions.sort_by_key(|region| region.open.start);
	diagnostics.sort_by_key(|diag| (diag.line(), diag.column()));

	ParsedTags {
		regions,
		standalones,
		diagnostics,
	}
}
