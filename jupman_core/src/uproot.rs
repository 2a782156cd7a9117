use std::collections::BTreeSet;
use std::ops::Range;
use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

use markdown::ParseOptions;
use markdown::mdast::Node;
use markdown::to_mdast;
use regex::Regex;

use crate::JupmanError;
use crate::JupmanResult;

/// What a project-relative path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
	File,
	Directory,
	Missing,
}

/// Answers whether a project-relative path is a file, a directory or
/// nothing at all.
pub trait PathClassifier {
	fn classify(&self, path: &Path) -> PathKind;
}

/// Classifies paths against the real file system below `root`.
#[derive(Debug, Clone)]
pub struct FsClassifier {
	root: PathBuf,
}

impl FsClassifier {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}
}

impl PathClassifier for FsClassifier {
	fn classify(&self, path: &Path) -> PathKind {
		let full = self.root.join(path);
		if full.is_dir() {
			PathKind::Directory
		} else if full.is_file() {
			PathKind::File
		} else {
			PathKind::Missing
		}
	}
}

/// An in-memory tree of files and directories.
#[derive(Debug, Clone, Default)]
pub struct MemoryClassifier {
	files: BTreeSet<PathBuf>,
	dirs: BTreeSet<PathBuf>,
}

impl MemoryClassifier {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a file and all of its parent directories.
	#[must_use]
	pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
		let path = path.as_ref();
		if let Some(parent) = path.parent() {
			self.add_dirs(parent);
		}
		self.files.insert(path.to_path_buf());
		self
	}

	/// Add a directory and all of its parents.
	#[must_use]
	pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
		self.add_dirs(path.as_ref());
		self
	}

	fn add_dirs(&mut self, path: &Path) {
		for ancestor in path.ancestors() {
			if ancestor.as_os_str().is_empty() {
				break;
			}
			self.dirs.insert(ancestor.to_path_buf());
		}
	}
}

impl PathClassifier for MemoryClassifier {
	fn classify(&self, path: &Path) -> PathKind {
		if path.as_os_str().is_empty() || self.dirs.contains(path) {
			PathKind::Directory
		} else if self.files.contains(path) {
			PathKind::File
		} else {
			PathKind::Missing
		}
	}
}

/// Split a project-relative path into its normal segments.
fn segments(path: &str) -> Vec<&str> {
	let mut segments = Vec::new();
	for segment in path.split(['/', '\\']) {
		match segment {
			"" | "." => {}
			".." => {
				segments.pop();
			}
			other => segments.push(other),
		}
	}
	segments
}

/// Number of directory levels between the project root and the directory
/// that `path` lives in.
pub fn root_depth(path: &str, classifier: &impl PathClassifier) -> usize {
	let segments = segments(path);
	if segments.is_empty() {
		return 0;
	}

	let full: PathBuf = segments.iter().collect();
	match classifier.classify(&full) {
		PathKind::File => segments.len() - 1,
		PathKind::Directory => segments.len(),
		PathKind::Missing => {
			// One level below the nearest existing ancestor directory.
			let ancestor = (1..segments.len()).rev().find(|&len| {
				let prefix: PathBuf = segments[..len].iter().collect();
				classifier.classify(&prefix) == PathKind::Directory
			});
			ancestor.unwrap_or(0) + 1
		}
	}
}

/// The relative prefix leading from `path` back to the project root, e.g.
/// `../../` for a file two directories deep. The root itself yields `""`.
pub fn compute_root_prefix(path: &str, classifier: &impl PathClassifier) -> String {
	"../".repeat(root_depth(path, classifier))
}

/// Moves relative references from one root prefix to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
	/// The prefix references carry in the source document.
	pub from: String,
	/// The prefix they need at the destination.
	pub to: String,
}

impl Relocation {
	pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
		Self {
			from: from.into(),
			to: to.into(),
		}
	}

	pub fn is_identity(&self) -> bool {
		self.from == self.to
	}

	/// The relocated target, or `None` when the target is absolute or does
	/// not start with the source prefix.
	pub fn relocate(&self, target: &str) -> Option<String> {
		if is_absolute_url(target) {
			return None;
		}
		let rest = target.strip_prefix(self.from.as_str())?;
		Some(format!("{}{rest}", self.to))
	}
}

static SCHEME: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").unwrap_or_else(|e| unreachable!("{e}")));

static HTML_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"(?i)\b(?:href|src)[ \t]*=[ \t]*(?:"([^"]*)"|'([^']*)')"#)
		.unwrap_or_else(|e| unreachable!("{e}"))
});

fn is_absolute_url(target: &str) -> bool {
	target.is_empty()
		|| target.starts_with('#')
		|| target.starts_with('/')
		|| SCHEME.is_match(target)
}

/// Rewrite the targets of markdown links, images, link definitions and HTML
/// `href` / `src` attributes according to `relocation`. Code spans and code
/// blocks are left alone.
pub fn rewrite_references(text: &str, relocation: &Relocation) -> JupmanResult<String> {
	if relocation.is_identity() {
		return Ok(text.to_string());
	}

	let mdast =
		to_mdast(text, &ParseOptions::gfm()).map_err(|e| JupmanError::Markdown(e.to_string()))?;
	let mut targets = Vec::new();
	collect_targets(&mdast, text, &mut targets);

	targets.sort_by_key(|range| range.start);
	let mut output = String::with_capacity(text.len());
	let mut cursor = 0;

	for range in targets {
		if range.start < cursor {
			continue;
		}
		let target = &text[range.clone()];
		if let Some(relocated) = relocation.relocate(target) {
			output.push_str(&text[cursor..range.start]);
			output.push_str(&relocated);
			cursor = range.end;
		}
	}

	output.push_str(&text[cursor..]);
	Ok(output)
}

fn node_span(node: &Node) -> Option<Range<usize>> {
	node.position()
		.map(|position| position.start.offset..position.end.offset)
}

fn collect_targets(node: &Node, text: &str, targets: &mut Vec<Range<usize>>) {
	match node {
		Node::Link(link) => {
			push_destination(text, node_span(node), "](", &link.url, targets);
		}
		Node::Image(image) => {
			push_destination(text, node_span(node), "](", &image.url, targets);
		}
		Node::Definition(definition) => {
			push_destination(text, node_span(node), "]:", &definition.url, targets);
		}
		Node::Html(_) => {
			if let Some(span) = node_span(node) {
				for caps in HTML_ATTRIBUTE.captures_iter(&text[span.clone()]) {
					if let Some(value) = caps.get(1).or_else(|| caps.get(2)) {
						targets.push(span.start + value.start()..span.start + value.end());
					}
				}
			}
		}
		_ => {}
	}

	if let Some(children) = node.children() {
		for child in children {
			collect_targets(child, text, targets);
		}
	}
}

/// Locate `url` as written after the last `opener` inside the node source.
fn push_destination(
	text: &str,
	span: Option<Range<usize>>,
	opener: &str,
	url: &str,
	targets: &mut Vec<Range<usize>>,
) {
	let Some(span) = span else {
		return;
	};
	if url.is_empty() {
		return;
	}
	let source = &text[span.clone()];
	let Some(opener_at) = source.rfind(opener) else {
		return;
	};
	let after = opener_at + opener.len();
	let Some(found) = source[after..].find(url) else {
		return;
	};
	let start = span.start + after + found;
	targets.push(start..start + url.len());
}

static PATH_MUTATION: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[ \t]*sys\.path\.(?:append|insert)[ \t]*\(.*\)[ \t]*\r?\n?$")
		.unwrap_or_else(|e| unreachable!("{e}"))
});

static IMPORT_SYS: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[ \t]*import[ \t]+sys[ \t]*\r?\n?$").unwrap_or_else(|e| unreachable!("{e}"))
});

static USES_SYS: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\bsys\b").unwrap_or_else(|e| unreachable!("{e}")));

/// Drop the `sys.path` mutations that exist only to make `support_module`
/// importable from the source tree, together with an `import sys` directly
/// before them when nothing else uses `sys`. Every other line is kept as is.
pub fn rewrite_script_imports(code: &str, support_module: &str, context_label: &str) -> String {
	let Ok(support_import) = Regex::new(&format!(
		r"^[ \t]*(?:import[ \t]+{module}\b|from[ \t]+{module}[ \t]+import\b)",
		module = regex::escape(support_module)
	)) else {
		return code.to_string();
	};

	let lines: Vec<&str> = code.split_inclusive('\n').collect();
	let mut removed = vec![false; lines.len()];
	let mut sys_imports = Vec::new();

	for idx in 0..lines.len() {
		let imports_support = lines
			.get(idx + 1)
			.is_some_and(|next| support_import.is_match(next));
		if !PATH_MUTATION.is_match(lines[idx]) || !imports_support {
			continue;
		}

		tracing::debug!(
			source = context_label,
			line = idx + 1,
			"removing sys.path mutation before `import {support_module}`"
		);
		removed[idx] = true;
		if idx > 0 && IMPORT_SYS.is_match(lines[idx - 1]) {
			sys_imports.push(idx - 1);
		}
	}

	for sys_idx in sys_imports {
		let still_used = lines
			.iter()
			.enumerate()
			.any(|(idx, line)| idx != sys_idx && !removed[idx] && USES_SYS.is_match(line));
		if !still_used {
			removed[sys_idx] = true;
		}
	}

	lines
		.iter()
		.zip(removed)
		.filter(|(_, removed)| !removed)
		.map(|(line, _)| *line)
		.collect()
}

/// Point imports of solution modules (`import foo_sol`,
/// `from foo_sol import …`) at the exercise module instead.
pub fn rewrite_test_imports(code: &str, sol_suffix: &str) -> String {
	if sol_suffix.is_empty() {
		return code.to_string();
	}

	let Ok(pattern) = Regex::new(&format!(
		r"(?m)^([ \t]*(?:import|from)[ \t]+)([A-Za-z_][A-Za-z0-9_]*?){}\b",
		regex::escape(sol_suffix)
	)) else {
		return code.to_string();
	};

	pattern.replace_all(code, "${1}${2}").into_owned()
}
