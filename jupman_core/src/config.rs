use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::JupmanError;
use crate::JupmanResult;
use crate::document::DEFAULT_SUPPORT_MODULE;
use crate::engine::DEFAULT_RAISE_PLACEHOLDER;
use crate::engine::StripOptions;
use crate::project::IgnoreSet;

pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["jupman.toml", ".jupman.toml", ".config/jupman.toml"];

pub const DEFAULT_IGNORED_NAMES: [&str; 6] = [
	".ipynb_checkpoints",
	"__pycache__",
	".pytest_cache",
	".git",
	".cache",
	"_build",
];

/// Project configuration, read from `jupman.toml`.
///
/// ```toml
/// support_module = "jupman"
/// raise_placeholder = "raise Exception('TODO IMPLEMENT ME !')"
///
/// [ignore]
/// names = [".ipynb_checkpoints", "__pycache__"]
///
/// [exclude]
/// patterns = ["drafts/", "*.bak"]
///
/// [naming]
/// sol_suffix = "_sol"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct JupmanConfig {
	/// The course support module whose `sys.path` setup is dropped from
	/// exported scripts.
	#[serde(default = "default_support_module")]
	pub support_module: String,
	/// Statement that replaces `jupman-raise` regions in exercises.
	#[serde(default = "default_raise_placeholder")]
	pub raise_placeholder: String,
	#[serde(default)]
	pub ignore: IgnoreConfig,
	/// Gitignore-style patterns skipped during export.
	#[serde(default)]
	pub exclude: ExcludeConfig,
	#[serde(default)]
	pub naming: NamingConfig,
}

impl Default for JupmanConfig {
	fn default() -> Self {
		Self {
			support_module: default_support_module(),
			raise_placeholder: default_raise_placeholder(),
			ignore: IgnoreConfig::default(),
			exclude: ExcludeConfig::default(),
			naming: NamingConfig::default(),
		}
	}
}

fn default_support_module() -> String {
	DEFAULT_SUPPORT_MODULE.to_string()
}

fn default_raise_placeholder() -> String {
	DEFAULT_RAISE_PLACEHOLDER.to_string()
}

/// Path segments that are never exported, wherever they appear.
#[derive(Debug, Clone, Deserialize)]
pub struct IgnoreConfig {
	#[serde(default = "default_ignored_names")]
	pub names: Vec<String>,
}

impl Default for IgnoreConfig {
	fn default() -> Self {
		Self {
			names: default_ignored_names(),
		}
	}
}

fn default_ignored_names() -> Vec<String> {
	DEFAULT_IGNORED_NAMES.iter().map(ToString::to_string).collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeConfig {
	/// Relative to the exported chapter. Supports negation (`!pattern`) and
	/// directory markers (trailing `/`).
	#[serde(default)]
	pub patterns: Vec<String>,
}

/// File name suffixes that mark solutions, challenges and tests.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
	/// Solution scripts: `foo_sol.py`.
	pub sol_suffix: String,
	/// Challenge scripts: `foo_chal_sol.py`.
	pub chal_suffix: String,
	/// Test harnesses: `foo_test.py`.
	pub test_suffix: String,
	/// Solution notebooks: `foo-sol.ipynb`.
	pub notebook_sol_suffix: String,
	/// Challenge notebooks: `foo-chal-sol.ipynb`.
	pub notebook_chal_suffix: String,
	/// Extension of code files that carry tags.
	pub code_extension: String,
}

impl Default for NamingConfig {
	fn default() -> Self {
		Self {
			sol_suffix: "_sol".into(),
			chal_suffix: "_chal".into(),
			test_suffix: "_test".into(),
			notebook_sol_suffix: "-sol".into(),
			notebook_chal_suffix: "-chal".into(),
			code_extension: "py".into(),
		}
	}
}

impl JupmanConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if there is none.
	pub fn load(root: &Path) -> JupmanResult<Option<JupmanConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::from_toml(&content)?;
		tracing::debug!(path = %config_path.display(), "loaded config");

		Ok(Some(config))
	}

	/// Like `load`, falling back to the defaults.
	pub fn load_or_default(root: &Path) -> JupmanResult<JupmanConfig> {
		Ok(Self::load(root)?.unwrap_or_default())
	}

	pub fn from_toml(content: &str) -> JupmanResult<JupmanConfig> {
		toml::from_str(content).map_err(|e| JupmanError::ConfigParse(e.to_string()))
	}

	pub fn strip_options(&self) -> StripOptions {
		StripOptions {
			raise_placeholder: self.raise_placeholder.clone(),
		}
	}

	pub fn ignore_set(&self) -> IgnoreSet {
		IgnoreSet::new(self.ignore.names.iter().cloned())
	}
}
