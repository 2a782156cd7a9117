use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum JupmanError {
	#[error(transparent)]
	#[diagnostic(code(jupman::io_error))]
	Io(#[from] std::io::Error),

	#[error("invalid tag label: `{0}`")]
	#[diagnostic(
		code(jupman::invalid_tag),
		help("a tag label must contain at least one non-whitespace character")
	)]
	InvalidTag(String),

	#[error("unknown variant `{0}`")]
	#[diagnostic(
		code(jupman::unknown_variant),
		help("use one of `exercise`, `solution` or `solution-public`")
	)]
	UnknownVariant(String),

	#[error("invalid date `{0}`")]
	#[diagnostic(
		code(jupman::date_format),
		help("dates must be real calendar days written as `YYYY-MM-DD`, e.g. `2000-12-31`")
	)]
	DateFormat(String),

	#[error("failed to read notebook: {0}")]
	#[diagnostic(
		code(jupman::notebook),
		help("check that the file is a valid notebook (JSON with a `cells` array)")
	)]
	Notebook(#[from] serde_json::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(jupman::config_parse),
		help("check that jupman.toml is valid TOML with [ignore], [exclude] and/or [naming] sections")
	)]
	ConfigParse(String),

	#[error("failed to load markdown: {0}")]
	#[diagnostic(code(jupman::markdown))]
	Markdown(String),

	#[error("not a directory: `{0}`")]
	#[diagnostic(code(jupman::not_a_directory))]
	NotADirectory(PathBuf),
}

pub type JupmanResult<T> = Result<T, JupmanError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
