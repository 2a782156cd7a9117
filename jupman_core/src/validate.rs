use serde::Deserialize;
use serde::Serialize;

use crate::lexer::Dialect;
use crate::parser::TagDiagnostic;
use crate::parser::parse;

/// The outcome of validating one text body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagReport {
	/// Standalone markers plus complete region pairs.
	pub count: usize,
	/// Unbalanced region markers, in source order.
	pub diagnostics: Vec<TagDiagnostic>,
}

impl TagReport {
	pub fn is_balanced(&self) -> bool {
		self.diagnostics.is_empty()
	}
}

/// Count the tags of a code body and collect its imbalance diagnostics.
pub fn validate_code_tags(text: &str, source_id: &str) -> TagReport {
	validate(text, Dialect::Code, source_id)
}

/// Count the `**ANSWER**:` markers of a rich-text body.
pub fn validate_markdown_tags(text: &str, source_id: &str) -> TagReport {
	validate(text, Dialect::Markdown, source_id)
}

/// Number of standalone code markers starting their line plus the number of
/// complete `jupman-raise`, `jupman-strip` and `jupman-purge` pairs.
///
/// Unbalanced pairs are logged as warnings naming `source_id` and are not
/// counted.
pub fn count_code_tags(text: &str, source_id: &str) -> usize {
	validate_code_tags(text, source_id).count
}

/// Number of `**ANSWER**:` markers starting their line.
pub fn count_markdown_tags(text: &str, source_id: &str) -> usize {
	validate_markdown_tags(text, source_id).count
}

fn validate(text: &str, dialect: Dialect, source_id: &str) -> TagReport {
	let parsed = parse(text, dialect);

	// Region markers are not rich-text tags.
	let regions = match dialect {
		Dialect::Code => parsed.regions.len(),
		Dialect::Markdown => 0,
	};
	let diagnostics = parsed.diagnostics;

	for diagnostic in &diagnostics {
		tracing::warn!(
			source = source_id,
			line = diagnostic.line(),
			column = diagnostic.column(),
			"tag imbalance: {}",
			diagnostic.message()
		);
	}

	TagReport {
		count: parsed.standalones.len() + regions,
		diagnostics,
	}
}
