use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use regex::RegexBuilder;

use crate::JupmanError;
use crate::JupmanResult;
use crate::tokens::Marker;

/// A compiled tag label.
///
/// The label's words may be separated by any run of horizontal whitespace,
/// the tag may be indented, and anything may follow it on the same line. The
/// tag must start its line: text before it on the line disqualifies the
/// match.
#[derive(Debug, Clone)]
pub struct TagPattern {
	regex: Regex,
}

/// One line holding a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMatch {
	/// From the start of the line to the end of the line, including the
	/// newline when there is one.
	pub line: Range<usize>,
	/// The tag words alone, without indentation or trailing content.
	pub marker: Range<usize>,
}

pub struct TagPatternBuilder {
	label: String,
	case_insensitive: bool,
	requires_newline: bool,
}

impl TagPatternBuilder {
	#[must_use]
	pub fn case_insensitive(mut self, yes: bool) -> Self {
		self.case_insensitive = yes;
		self
	}

	/// Only match when the tag line is terminated by a newline.
	#[must_use]
	pub fn requires_newline(mut self, yes: bool) -> Self {
		self.requires_newline = yes;
		self
	}

	pub fn build(self) -> JupmanResult<TagPattern> {
		let words: Vec<String> = self
			.label
			.split_whitespace()
			.map(regex::escape)
			.collect();

		if words.is_empty() {
			return Err(JupmanError::InvalidTag(self.label));
		}

		let terminator = if self.requires_newline {
			r"\n"
		} else {
			r"(?:\n|\z)"
		};
		let source = format!(
			r"(?m)^[ \t]*(?P<marker>{})[^\n]*{terminator}",
			words.join(r"[ \t]+")
		);

		let regex = RegexBuilder::new(&source)
			.case_insensitive(self.case_insensitive)
			.build()
			.map_err(|e| JupmanError::InvalidTag(format!("{}: {e}", self.label)))?;

		Ok(TagPattern { regex })
	}
}

impl TagPattern {
	pub fn builder(label: impl Into<String>) -> TagPatternBuilder {
		TagPatternBuilder {
			label: label.into(),
			case_insensitive: false,
			requires_newline: false,
		}
	}

	/// Whether the text starts with the tag (after optional indentation).
	pub fn matches_start(&self, text: &str) -> bool {
		self.regex.find(text).is_some_and(|m| m.start() == 0)
	}

	/// Whether any line of the text starts with the tag.
	pub fn is_match(&self, text: &str) -> bool {
		self.regex.is_match(text)
	}

	/// Every line starting with the tag, in order.
	pub fn find_iter<'a>(&'a self, text: &'a str) -> impl Iterator<Item = TagMatch> + 'a {
		self.regex.captures_iter(text).filter_map(|caps| {
			let line = caps.get(0)?;
			let marker = caps.name("marker")?;
			Some(TagMatch {
				line: line.range(),
				marker: marker.range(),
			})
		})
	}
}

/// Build the pattern for a tag label with default settings (case sensitive,
/// newline optional).
pub fn tag_pattern(label: &str) -> JupmanResult<TagPattern> {
	TagPattern::builder(label).build()
}

fn builtin(builder: TagPatternBuilder) -> TagPattern {
	builder
		.build()
		.unwrap_or_else(|e| unreachable!("built-in tag label failed to compile: {e}"))
}

static SOLUTION: LazyLock<TagPattern> =
	LazyLock::new(|| builtin(TagPattern::builder("# SOLUTION").case_insensitive(true)));

static WRITE_HERE: LazyLock<TagPattern> = LazyLock::new(|| {
	builtin(
		TagPattern::builder("# write here")
			.case_insensitive(true)
			.requires_newline(true),
	)
});

static ANSWER: LazyLock<TagPattern> =
	LazyLock::new(|| builtin(TagPattern::builder("**ANSWER**:")));

/// `# SOLUTION`, any case.
pub fn solution_pattern() -> &'static TagPattern {
	&SOLUTION
}

/// `# write here`, any case and spacing, newline required.
pub fn write_here_pattern() -> &'static TagPattern {
	&WRITE_HERE
}

/// `**ANSWER**:` in rich text.
pub fn answer_pattern() -> &'static TagPattern {
	&ANSWER
}

pub fn marker_pattern(marker: Marker) -> &'static TagPattern {
	match marker {
		Marker::Solution => solution_pattern(),
		Marker::WriteHere => write_here_pattern(),
		Marker::Answer => answer_pattern(),
	}
}
