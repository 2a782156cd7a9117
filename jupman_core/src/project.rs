use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;
use tempfile::NamedTempFile;

use crate::JupmanError;
use crate::JupmanResult;
use crate::config::JupmanConfig;
use crate::config::NamingConfig;
use crate::document::Document;
use crate::document::GenerationContext;
use crate::document::LocatedDiagnostic;
use crate::document::generate;
use crate::document::relocate;
use crate::document::validate_document;
use crate::engine::Variant;
use crate::uproot::FsClassifier;
use crate::uproot::MemoryClassifier;
use crate::uproot::Relocation;
use crate::uproot::compute_root_prefix;
use crate::uproot::rewrite_test_imports;

/// Path segment names that are never exported. Names may be globs
/// (`*.pyc`).
#[derive(Debug, Clone)]
pub struct IgnoreSet {
	names: Vec<String>,
	globs: GlobSet,
}

impl IgnoreSet {
	pub fn new(names: impl IntoIterator<Item = String>) -> Self {
		let names: Vec<String> = names.into_iter().collect();
		let mut builder = GlobSetBuilder::new();
		for name in &names {
			// Plain names still match by equality.
			if let Ok(glob) = Glob::new(name) {
				builder.add(glob);
			}
		}
		let globs = builder.build().unwrap_or_else(|_| GlobSet::empty());

		Self { names, globs }
	}

	pub fn names(&self) -> &[String] {
		&self.names
	}

	/// Whether any segment of `path` is an ignored name.
	pub fn is_ignored(&self, path: impl AsRef<Path>) -> bool {
		path.as_ref()
			.iter()
			.filter_map(|segment| segment.to_str())
			.any(|segment| self.is_ignored_name(segment))
	}

	pub fn is_ignored_name(&self, name: &str) -> bool {
		self.names.iter().any(|ignored| ignored == name) || self.globs.is_match(name)
	}
}

impl Default for IgnoreSet {
	fn default() -> Self {
		JupmanConfig::default().ignore_set()
	}
}

/// What an exported source file is, judged by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
	/// A tagged file with exercise and solution variants.
	Solution { notebook: bool, challenge: bool },
	/// A test harness for a solution script.
	Test,
	/// A notebook without variants.
	Notebook,
	/// A code file without variants.
	Code,
	/// Anything else, copied byte for byte.
	Other,
}

impl SourceKind {
	pub fn classify(path: &Path, naming: &NamingConfig) -> Self {
		let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
			return Self::Other;
		};
		let extension = path
			.extension()
			.and_then(|ext| ext.to_str())
			.unwrap_or_default();

		if extension == "ipynb" {
			if let Some(base) = stem.strip_suffix(naming.notebook_sol_suffix.as_str()) {
				return Self::Solution {
					notebook: true,
					challenge: base.ends_with(naming.notebook_chal_suffix.as_str()),
				};
			}
			return Self::Notebook;
		}

		if extension != naming.code_extension {
			return Self::Other;
		}

		if let Some(base) = stem.strip_suffix(naming.sol_suffix.as_str()) {
			return Self::Solution {
				notebook: false,
				challenge: base.ends_with(naming.chal_suffix.as_str()),
			};
		}

		if stem.ends_with(naming.test_suffix.as_str()) {
			return Self::Test;
		}

		Self::Code
	}
}

/// One file an export writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedOutput {
	/// Relative to the destination directory.
	pub path: PathBuf,
	/// `None` when the source is copied without variant generation.
	pub variant: Option<Variant>,
}

/// Decide which files a source produces.
///
/// `foo_sol.py` yields `foo.py` (and `foo_sol.py` when `copy_solutions`);
/// challenges such as `foo_chal_sol.py` only ever yield `foo_chal.py`.
pub fn plan_outputs(
	rel_path: &Path,
	kind: SourceKind,
	naming: &NamingConfig,
	copy_solutions: bool,
) -> Vec<PlannedOutput> {
	let SourceKind::Solution {
		notebook,
		challenge,
	} = kind
	else {
		return vec![PlannedOutput {
			path: rel_path.to_path_buf(),
			variant: None,
		}];
	};

	let suffix = if notebook {
		&naming.notebook_sol_suffix
	} else {
		&naming.sol_suffix
	};
	let exercise_path = match (rel_path.file_stem().and_then(|s| s.to_str()), rel_path.extension()) {
		(Some(stem), Some(ext)) => {
			let base = stem.strip_suffix(suffix.as_str()).unwrap_or(stem);
			rel_path.with_file_name(format!("{base}.{}", ext.to_string_lossy()))
		}
		_ => rel_path.to_path_buf(),
	};

	let mut outputs = vec![PlannedOutput {
		path: exercise_path,
		variant: Some(Variant::Exercise),
	}];
	if copy_solutions && !challenge {
		outputs.push(PlannedOutput {
			path: rel_path.to_path_buf(),
			variant: Some(Variant::Solution),
		});
	}
	outputs
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
	/// The directory `uproot` prefixes of source files are measured from.
	pub project_root: PathBuf,
	/// Also write solution files next to the exercises.
	pub copy_solutions: bool,
	pub config: JupmanConfig,
}

impl ExportOptions {
	pub fn new(project_root: impl Into<PathBuf>) -> Self {
		Self {
			project_root: project_root.into(),
			copy_solutions: false,
			config: JupmanConfig::default(),
		}
	}
}

/// A file that could not be exported.
#[derive(Debug)]
pub struct ExportFailure {
	/// Relative to the source directory.
	pub path: PathBuf,
	pub error: JupmanError,
}

#[derive(Debug, Default)]
pub struct ExportReport {
	/// Written files, relative to the destination directory.
	pub written: Vec<PathBuf>,
	pub failures: Vec<ExportFailure>,
	/// Tag diagnostics per source file, relative to the source directory.
	pub diagnostics: Vec<(PathBuf, LocatedDiagnostic)>,
}

impl ExportReport {
	pub fn is_success(&self) -> bool {
		self.failures.is_empty()
	}
}

/// Export a chapter directory: exercises and (optionally) solutions are
/// generated, references are relocated and everything else is copied.
///
/// Each file is handled on its own. A failing file is recorded in the
/// report and the export carries on with the next one.
pub fn export_chapter(
	src_dir: &Path,
	dest_dir: &Path,
	options: &ExportOptions,
) -> JupmanResult<ExportReport> {
	if !src_dir.is_dir() {
		return Err(JupmanError::NotADirectory(src_dir.to_path_buf()));
	}

	let walker = Walker {
		root: src_dir,
		dest_dir,
		ignore_set: options.config.ignore_set(),
		exclude: build_exclude_matcher(src_dir, &options.config.exclude.patterns)?,
	};
	let scan = walker.scan();

	let mut report = ExportReport {
		failures: scan.failures,
		..ExportReport::default()
	};
	for file in scan.files {
		let rel_path = file.strip_prefix(src_dir).unwrap_or(&file).to_path_buf();
		tracing::debug!(path = %rel_path.display(), "exporting");

		match export_file(&file, &rel_path, dest_dir, options, &mut report) {
			Ok(written) => report.written.extend(written),
			Err(error) => {
				tracing::warn!(path = %rel_path.display(), "failed to export: {error}");
				report.failures.push(ExportFailure {
					path: rel_path,
					error,
				});
			}
		}
	}

	Ok(report)
}

fn export_file(
	file: &Path,
	rel_path: &Path,
	dest_dir: &Path,
	options: &ExportOptions,
	report: &mut ExportReport,
) -> JupmanResult<Vec<PathBuf>> {
	let config = &options.config;
	let kind = SourceKind::classify(rel_path, &config.naming);
	let outputs = plan_outputs(rel_path, kind, &config.naming, options.copy_solutions);

	if kind == SourceKind::Other {
		let bytes = std::fs::read(file)?;
		for output in &outputs {
			write_atomic(&dest_dir.join(&output.path), &bytes)?;
		}
		return Ok(outputs.into_iter().map(|output| output.path).collect());
	}

	let source_id = rel_path.display().to_string();
	let text = std::fs::read_to_string(file)?;
	let text = if kind == SourceKind::Test {
		rewrite_test_imports(&text, &config.naming.sol_suffix)
	} else {
		text
	};
	let document = Document::parse(rel_path, &text)?;

	if let SourceKind::Solution { .. } = kind {
		let tags = validate_document(&document, &source_id);
		if tags.count == 0 {
			tracing::warn!(path = %source_id, "solution file has no jupman tags");
		}
		report.diagnostics.extend(
			tags.diagnostics
				.into_iter()
				.map(|diagnostic| (rel_path.to_path_buf(), diagnostic)),
		);
	}

	let mut written = Vec::with_capacity(outputs.len());
	for output in outputs {
		let ctx = GenerationContext {
			strip: config.strip_options(),
			relocation: Some(relocation_for(file, &output.path, options)),
			support_module: config.support_module.clone(),
			source_id: source_id.clone(),
		};
		let generated = match output.variant {
			Some(variant) => generate(&document, variant, &ctx)?,
			None => relocate(&document, &ctx)?,
		};

		write_atomic(&dest_dir.join(&output.path), generated.to_text()?.as_bytes())?;
		written.push(output.path);
	}

	Ok(written)
}

/// From the source's prefix below the project root to the output's prefix
/// below the destination.
fn relocation_for(file: &Path, output: &Path, options: &ExportOptions) -> Relocation {
	let from = file
		.strip_prefix(&options.project_root)
		.map(|rel| {
			compute_root_prefix(
				&rel.to_string_lossy(),
				&FsClassifier::new(&options.project_root),
			)
		})
		.unwrap_or_default();
	let to = compute_root_prefix(
		&output.to_string_lossy(),
		&MemoryClassifier::new().with_file(output),
	);

	Relocation::new(from, to)
}

/// Write through a temporary file in the same directory, so a failed write
/// never leaves a partial file behind. The temporary file is removed on
/// every error path.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
	let parent = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};
	std::fs::create_dir_all(parent)?;

	let mut temp = NamedTempFile::new_in(parent)?;
	temp.write_all(contents)?;
	temp.persist(path).map_err(|error| error.error)?;

	Ok(())
}

/// The files found below a root, and the directories that could not be
/// read.
#[derive(Debug, Default)]
pub struct SourceScan {
	/// Sorted.
	pub files: Vec<PathBuf>,
	/// Paths relative to the scanned root.
	pub failures: Vec<ExportFailure>,
}

/// Every code file and notebook below `root` that carries tags, skipping
/// ignored names and `[exclude]` patterns. Unreadable directories are
/// reported and skipped.
pub fn collect_sources(root: &Path, config: &JupmanConfig) -> JupmanResult<SourceScan> {
	if !root.is_dir() {
		return Err(JupmanError::NotADirectory(root.to_path_buf()));
	}

	let walker = Walker {
		root,
		dest_dir: Path::new(""),
		ignore_set: config.ignore_set(),
		exclude: build_exclude_matcher(root, &config.exclude.patterns)?,
	};
	let mut scan = walker.scan();
	scan.files.retain(|file| {
		!matches!(
			SourceKind::classify(file, &config.naming),
			SourceKind::Other
		)
	});

	Ok(scan)
}

/// Build a `Gitignore` matcher from the `[exclude]` patterns of
/// `jupman.toml`.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> JupmanResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			JupmanError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
	}
	builder
		.build()
		.map_err(|e| JupmanError::ConfigParse(format!("failed to build exclude rules: {e}")))
}

struct Walker<'a> {
	root: &'a Path,
	/// Never descended into. The destination may live inside the chapter.
	dest_dir: &'a Path,
	ignore_set: IgnoreSet,
	exclude: Gitignore,
}

impl Walker<'_> {
	fn scan(&self) -> SourceScan {
		let mut scan = SourceScan::default();
		self.walk_dir(self.root, &mut scan);
		// Sort for deterministic ordering.
		scan.files.sort();
		scan
	}

	fn fail(&self, path: &Path, error: std::io::Error, scan: &mut SourceScan) {
		let rel_path = path.strip_prefix(self.root).unwrap_or(path).to_path_buf();
		tracing::warn!(path = %rel_path.display(), "skipping unreadable entry: {error}");
		scan.failures.push(ExportFailure {
			path: rel_path,
			error: error.into(),
		});
	}

	fn walk_dir(&self, dir: &Path, scan: &mut SourceScan) {
		let entries = match std::fs::read_dir(dir) {
			Ok(entries) => entries,
			Err(error) => {
				self.fail(dir, error, scan);
				return;
			}
		};

		for entry in entries {
			let path = match entry {
				Ok(entry) => entry.path(),
				Err(error) => {
					self.fail(dir, error, scan);
					continue;
				}
			};

			if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
				if self.ignore_set.is_ignored_name(name) {
					continue;
				}
			}

			if path == self.dest_dir {
				continue;
			}

			let is_dir = path.is_dir();
			if self.exclude.matched(&path, is_dir).is_ignore() {
				continue;
			}

			if is_dir {
				self.walk_dir(&path, scan);
			} else {
				scan.files.push(path);
			}
		}
	}
}
