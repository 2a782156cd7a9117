use std::fmt::Display;
use std::ops::Range;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::JupmanError;
use crate::grammar::answer_pattern;
use crate::lexer::Dialect;
use crate::parser::ParsedTags;
use crate::parser::TagRegion;
use crate::parser::parse;
use crate::tokens::Marker;
use crate::tokens::TagEvent;
use crate::tokens::TagEventKind;
use crate::tokens::TagName;

pub const DEFAULT_RAISE_PLACEHOLDER: &str = "raise Exception('TODO IMPLEMENT ME !')";

/// Which rendering of an authored document to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
	/// Solutions removed, scaffolding left for the student.
	Exercise,
	/// Everything the instructor wrote, minus the authoring markers.
	Solution,
	/// The solution as published on the website: `jupman-strip` bodies are
	/// redacted as well.
	SolutionPublic,
}

impl Variant {
	pub const ALL: [Variant; 3] = [Variant::Exercise, Variant::Solution, Variant::SolutionPublic];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Exercise => "exercise",
			Self::Solution => "solution",
			Self::SolutionPublic => "solution-public",
		}
	}

	pub fn is_exercise(self) -> bool {
		self == Self::Exercise
	}

	/// Whether the body of a region with this name survives.
	fn keeps_body(self, name: TagName) -> bool {
		match name {
			TagName::Raise => !self.is_exercise(),
			TagName::Strip => self == Self::Solution,
			TagName::Purge => false,
		}
	}
}

impl Display for Variant {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.as_str())
	}
}

impl FromStr for Variant {
	type Err = JupmanError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|variant| variant.as_str() == value)
			.ok_or_else(|| JupmanError::UnknownVariant(value.to_string()))
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StripOptions {
	/// Statement left in place of a `jupman-raise` region in exercises. An
	/// empty placeholder removes the region outright.
	pub raise_placeholder: String,
}

impl Default for StripOptions {
	fn default() -> Self {
		Self {
			raise_placeholder: DEFAULT_RAISE_PLACEHOLDER.to_string(),
		}
	}
}

/// A replacement of a byte range of the source.
#[derive(Debug)]
struct Splice {
	range: Range<usize>,
	replacement: String,
}

impl Splice {
	fn remove(range: Range<usize>) -> Self {
		Self {
			range,
			replacement: String::new(),
		}
	}
}

/// The next thing the scan has to decide on.
enum Item<'a> {
	Region(&'a TagRegion),
	Marker(Marker, &'a TagEvent),
}

impl Item<'_> {
	fn start(&self) -> usize {
		match self {
			Self::Region(region) => region.open.start,
			Self::Marker(_, event) => event.span.start,
		}
	}
}

fn items(parsed: &ParsedTags) -> Vec<Item<'_>> {
	let mut items: Vec<Item<'_>> = parsed.regions.iter().map(Item::Region).collect();
	for event in &parsed.standalones {
		if let TagEventKind::Standalone(marker) = event.kind {
			items.push(Item::Marker(marker, event));
		}
	}
	items.sort_by_key(|item| item.start());
	items
}

/// Produce one variant of a code body.
pub fn strip_code(text: &str, variant: Variant, options: &StripOptions) -> String {
	strip(text, Dialect::Code, variant, options)
}

/// Produce one variant of a rich-text body.
pub fn strip_markdown(text: &str, variant: Variant, options: &StripOptions) -> String {
	strip(text, Dialect::Markdown, variant, options)
}

/// Produce one variant of a text body.
///
/// The body is scanned once, earliest marker first. A marker found inside a
/// region that an earlier marker already consumed is consumed with it.
/// Exercise truncation at `# SOLUTION`, `# write here` or `**ANSWER**:` ends
/// the scan.
pub fn strip(text: &str, dialect: Dialect, variant: Variant, options: &StripOptions) -> String {
	let parsed = parse(text, dialect);
	if parsed.is_empty() {
		return text.to_string();
	}

	let mut splices = Vec::new();
	let mut consumed = 0;

	for item in items(&parsed) {
		if item.start() < consumed {
			continue;
		}

		match item {
			Item::Marker(marker, event) => {
				let line = line_range(text, event.span.start);
				match (marker, variant) {
					(Marker::Solution, Variant::Exercise) => {
						splices.push(Splice::remove(line.start..text.len()));
						break;
					}
					(Marker::WriteHere, Variant::Exercise) => {
						splices.push(Splice {
							range: line.end..text.len(),
							replacement: "\n".to_string(),
						});
						break;
					}
					(Marker::Answer, Variant::Exercise) => {
						splices.push(Splice {
							range: event.span.start..text.len(),
							replacement: format!("{}\n", Marker::Answer),
						});
						break;
					}
					(Marker::Solution | Marker::WriteHere, _) => {
						consumed = line.end;
						splices.push(Splice::remove(line));
					}
					(Marker::Answer, _) => {}
				}
			}
			Item::Region(region) => {
				if variant.keeps_body(region.name) {
					splices.push(Splice::remove(region.open.clone()));
					splices.push(Splice::remove(region.close.clone()));
					consumed = region.open.end;
				} else if region.name == TagName::Raise && !options.raise_placeholder.is_empty() {
					splices.push(Splice {
						range: region.span(),
						replacement: options.raise_placeholder.clone(),
					});
					consumed = region.close.end;
				} else {
					let range = removal_range(text, region);
					consumed = range.end;
					splices.push(Splice::remove(range));
				}
			}
		}
	}

	apply(text, splices)
}

/// Remove every balanced `jupman-strip` and `jupman-purge` region still in
/// the text, markers included. Repeats until none is left, so applying it
/// twice gives the same result as applying it once.
pub fn refine_public_text(text: &str) -> String {
	let mut current = text.to_string();

	loop {
		let parsed = parse(&current, Dialect::Code);
		let mut splices = Vec::new();
		let mut consumed = 0;

		for region in &parsed.regions {
			if region.name == TagName::Raise || region.open.start < consumed {
				continue;
			}
			let range = removal_range(&current, region);
			consumed = range.end;
			splices.push(Splice::remove(range));
		}

		if splices.is_empty() {
			return current;
		}

		current = apply(&current, splices);
	}
}

/// Whether a code body holds solution content: a `# SOLUTION` or
/// `# write here` marker, or a `jupman-raise` or `jupman-strip` region.
/// Bodies that only purge are not solutions.
pub fn is_code_solution(text: &str) -> bool {
	let parsed = parse(text, Dialect::Code);
	!parsed.standalones.is_empty()
		|| parsed.has_region(TagName::Raise)
		|| parsed.has_region(TagName::Strip)
}

/// Whether any variant of the code body differs from the body itself.
pub fn is_to_strip(text: &str) -> bool {
	is_code_solution(text) || parse(text, Dialect::Code).has_region(TagName::Purge)
}

pub fn has_markdown_answer(text: &str) -> bool {
	answer_pattern().is_match(text)
}

/// The line holding `offset`, newline included when there is one.
fn line_range(text: &str, offset: usize) -> Range<usize> {
	let start = text[..offset].rfind('\n').map_or(0, |idx| idx + 1);
	let end = text[offset..]
		.find('\n')
		.map_or(text.len(), |idx| offset + idx + 1);
	start..end
}

/// A region opening its line and closing at the end of a line takes those
/// lines with it. Otherwise only the marked span goes.
fn removal_range(text: &str, region: &TagRegion) -> Range<usize> {
	let span = region.span();
	let open_line = line_range(text, span.start);
	let close_line = line_range(text, span.end);

	let leads_line = text[open_line.start..span.start]
		.chars()
		.all(|c| c == ' ' || c == '\t');
	let ends_line = text[span.end..close_line.end]
		.chars()
		.all(char::is_whitespace);

	if leads_line && ends_line {
		open_line.start..close_line.end
	} else {
		span
	}
}

fn apply(text: &str, mut splices: Vec<Splice>) -> String {
	splices.sort_by_key(|splice| splice.range.start);

	let mut output = String::with_capacity(text.len());
	let mut cursor = 0;

	for splice in splices {
		if splice.range.start < cursor {
			continue;
		}
		output.push_str(&text[cursor..splice.range.start]);
		output.push_str(&splice.replacement);
		cursor = splice.range.end;
	}

	output.push_str(&text[cursor..]);
	output
}
