use logos::Logos;
use serde::Deserialize;
use serde::Serialize;

use crate::grammar::marker_pattern;
use crate::tokens::LineTable;
use crate::tokens::Marker;
use crate::tokens::TagEvent;
use crate::tokens::TagEventKind;
use crate::tokens::TagEvents;
use crate::tokens::TagName;

/// Raw tokens produced by logos for the region markers. Everything that is
/// not a marker collapses into `Hash`, `Newline` and `Text`.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum RawToken {
	#[token("#jupman-raise")]
	RaiseOpen,
	#[token("#/jupman-raise")]
	RaiseClose,
	#[token("#jupman-strip")]
	StripOpen,
	#[token("#/jupman-strip")]
	StripClose,
	#[token("#jupman-purge")]
	PurgeOpen,
	#[token("#/jupman-purge")]
	PurgeClose,
	#[token("\n")]
	Newline,
	#[token("#")]
	Hash,
	#[regex(r"[^#\n]+")]
	Text,
}

impl RawToken {
	fn event_kind(self) -> Option<TagEventKind> {
		let kind = match self {
			Self::RaiseOpen => TagEventKind::Open(TagName::Raise),
			Self::RaiseClose => TagEventKind::Close(TagName::Raise),
			Self::StripOpen => TagEventKind::Open(TagName::Strip),
			Self::StripClose => TagEventKind::Close(TagName::Strip),
			Self::PurgeOpen => TagEventKind::Open(TagName::Purge),
			Self::PurgeClose => TagEventKind::Close(TagName::Purge),
			Self::Newline | Self::Hash | Self::Text => return None,
		};

		Some(kind)
	}
}

/// Which standalone markers a body can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dialect {
	/// Code files and code cells: `# SOLUTION` and `# write here`.
	Code,
	/// Markdown cells: `**ANSWER**:`.
	Markdown,
}

impl Dialect {
	pub fn markers(self) -> &'static [Marker] {
		match self {
			Self::Code => &[Marker::Solution, Marker::WriteHere],
			Self::Markdown => &[Marker::Answer],
		}
	}
}

/// Tokenize a text body into its tag events, ordered by offset.
pub fn tokenize(text: &str, dialect: Dialect) -> TagEvents {
	let lines = LineTable::new(text);
	let mut events = Vec::new();

	for (result, span) in RawToken::lexer(text).spanned() {
		// Unrecognized bytes can only be plain text.
		let Ok(raw) = result else {
			continue;
		};

		if let Some(kind) = raw.event_kind() {
			events.push(TagEvent {
				kind,
				start: lines.point(span.start),
				span,
			});
		}
	}

	for marker in dialect.markers() {
		for found in marker_pattern(*marker).find_iter(text) {
			events.push(TagEvent {
				kind: TagEventKind::Standalone(*marker),
				start: lines.point(found.marker.start),
				span: found.marker,
			});
		}
	}

	TagEvents::new(events)
}
