use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::JupmanResult;
use crate::engine::StripOptions;
use crate::engine::Variant;
use crate::engine::refine_public_text;
use crate::engine::strip_code;
use crate::engine::strip_markdown;
use crate::notebook::Cell;
use crate::notebook::CellType;
use crate::notebook::Notebook;
use crate::parser::TagDiagnostic;
use crate::uproot::Relocation;
use crate::uproot::rewrite_references;
use crate::uproot::rewrite_script_imports;
use crate::validate::TagReport;
use crate::validate::validate_code_tags;
use crate::validate::validate_markdown_tags;

pub const DEFAULT_SUPPORT_MODULE: &str = "jupman";

/// An authored course document.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
	/// A plain code file, one body.
	Code(String),
	/// A notebook, one body per cell.
	Notebook(Notebook),
}

impl Document {
	/// Read a document from its text, using the file name to tell notebooks
	/// from code.
	pub fn parse(path: impl AsRef<Path>, text: &str) -> JupmanResult<Self> {
		if is_notebook_path(path.as_ref()) {
			Ok(Self::Notebook(Notebook::from_json(text)?))
		} else {
			Ok(Self::Code(text.to_string()))
		}
	}

	/// The text to write back to disk.
	pub fn to_text(&self) -> JupmanResult<String> {
		match self {
			Self::Code(code) => Ok(code.clone()),
			Self::Notebook(notebook) => notebook.to_json(),
		}
	}

	pub fn as_notebook(&self) -> Option<&Notebook> {
		match self {
			Self::Notebook(notebook) => Some(notebook),
			Self::Code(_) => None,
		}
	}
}

pub fn is_notebook_path(path: &Path) -> bool {
	path.extension().is_some_and(|ext| ext == "ipynb")
}

/// Everything a transform needs besides the document and the variant.
#[derive(Debug, Clone)]
pub struct GenerationContext {
	pub strip: StripOptions,
	/// Applied to rich-text references when present.
	pub relocation: Option<Relocation>,
	/// The module whose `sys.path` setup is removed from scripts.
	pub support_module: String,
	/// Names the document in log lines.
	pub source_id: String,
}

impl Default for GenerationContext {
	fn default() -> Self {
		Self {
			strip: StripOptions::default(),
			relocation: None,
			support_module: DEFAULT_SUPPORT_MODULE.to_string(),
			source_id: String::new(),
		}
	}
}

impl GenerationContext {
	pub fn new(source_id: impl Into<String>) -> Self {
		Self {
			source_id: source_id.into(),
			..Self::default()
		}
	}

	#[must_use]
	pub fn with_relocation(mut self, relocation: Relocation) -> Self {
		self.relocation = Some(relocation);
		self
	}
}

/// Produce one variant of a document. The input is never modified.
pub fn generate(
	document: &Document,
	variant: Variant,
	ctx: &GenerationContext,
) -> JupmanResult<Document> {
	match document {
		Document::Code(code) => {
			let stripped = strip_code(code, variant, &ctx.strip);
			Ok(Document::Code(rewrite_script_imports(
				&stripped,
				&ctx.support_module,
				&ctx.source_id,
			)))
		}
		Document::Notebook(notebook) => {
			let cells = notebook
				.cells
				.iter()
				.enumerate()
				.map(|(idx, cell)| generate_cell(cell, idx, variant, ctx))
				.collect::<JupmanResult<Vec<_>>>()?;

			Ok(Document::Notebook(Notebook {
				cells,
				..notebook.clone()
			}))
		}
	}
}

/// Produce one variant of a single cell.
pub fn generate_cell(
	cell: &Cell,
	idx: usize,
	variant: Variant,
	ctx: &GenerationContext,
) -> JupmanResult<Cell> {
	match cell.cell_type {
		CellType::Code => {
			let stripped = strip_code(&cell.source, variant, &ctx.strip);
			let changed = stripped != cell.source;
			let source = rewrite_script_imports(&stripped, &ctx.support_module, &ctx.source_id);
			let generated = cell.with_source(source);

			if changed && variant.is_exercise() {
				tracing::debug!(source = %ctx.source_id, cell = idx, "clearing outputs of stripped cell");
				Ok(generated.without_outputs())
			} else {
				Ok(generated)
			}
		}
		CellType::Markdown => {
			let stripped = strip_markdown(&cell.source, variant, &ctx.strip);
			let source = match &ctx.relocation {
				Some(relocation) => rewrite_references(&stripped, relocation)?,
				None => stripped,
			};
			Ok(cell.with_source(source))
		}
		CellType::Raw => Ok(cell.clone()),
	}
}

/// Rewrite references and script imports only, keeping every tag. Used for
/// documents that have no variants.
pub fn relocate(document: &Document, ctx: &GenerationContext) -> JupmanResult<Document> {
	match document {
		Document::Code(code) => Ok(Document::Code(rewrite_script_imports(
			code,
			&ctx.support_module,
			&ctx.source_id,
		))),
		Document::Notebook(notebook) => {
			let cells = notebook
				.cells
				.iter()
				.map(|cell| {
					match (cell.cell_type, &ctx.relocation) {
						(CellType::Code, _) => {
							Ok(cell.with_source(rewrite_script_imports(
								&cell.source,
								&ctx.support_module,
								&ctx.source_id,
							)))
						}
						(CellType::Markdown, Some(relocation)) => {
							Ok(cell.with_source(rewrite_references(&cell.source, relocation)?))
						}
						_ => Ok(cell.clone()),
					}
				})
				.collect::<JupmanResult<Vec<_>>>()?;

			Ok(Document::Notebook(Notebook {
				cells,
				..notebook.clone()
			}))
		}
	}
}

/// The website pass over a generated solution notebook: any `jupman-strip`
/// or `jupman-purge` region that survived is removed. Idempotent.
pub fn refine_public(notebook: &Notebook) -> Notebook {
	notebook.map_cells(|_, cell| match cell.cell_type {
		CellType::Code | CellType::Markdown => cell.with_source(refine_public_text(&cell.source)),
		CellType::Raw => cell.clone(),
	})
}

/// A tag diagnostic together with the cell it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatedDiagnostic {
	/// `None` for plain code files.
	pub cell: Option<usize>,
	pub diagnostic: TagDiagnostic,
}

/// The tag count and the diagnostics of a whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReport {
	pub count: usize,
	pub diagnostics: Vec<LocatedDiagnostic>,
}

impl DocumentReport {
	fn absorb(&mut self, cell: Option<usize>, report: TagReport) {
		self.count += report.count;
		self.diagnostics.extend(
			report
				.diagnostics
				.into_iter()
				.map(|diagnostic| LocatedDiagnostic { cell, diagnostic }),
		);
	}
}

/// Count and validate the tags of every body of a document.
pub fn validate_document(document: &Document, source_id: &str) -> DocumentReport {
	let mut report = DocumentReport::default();

	match document {
		Document::Code(code) => report.absorb(None, validate_code_tags(code, source_id)),
		Document::Notebook(notebook) => {
			for (idx, cell) in notebook.cells.iter().enumerate() {
				let cell_id = format!("{source_id} cell {idx}");
				let cell_report = match cell.cell_type {
					CellType::Code => validate_code_tags(&cell.source, &cell_id),
					CellType::Markdown => validate_markdown_tags(&cell.source, &cell_id),
					CellType::Raw => continue,
				};
				report.absorb(Some(idx), cell_report);
			}
		}
	}

	report
}
