use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use jupman_core::Variant;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Generate exercise and solution variants of tagged course material.",
	long_about = "jupman derives the exercise, solution and published solution of a code file \
	              or notebook from a single authored source.\n\nInstructor-only content is \
	              marked with `#jupman-raise`, `#jupman-strip` and `#jupman-purge` regions and \
	              with the `# SOLUTION`, `# write here` and `**ANSWER**:` markers.\n\nQuick \
	              start:\n  jupman strip foo_sol.py      Print the exercise of a file\n  jupman \
	              check                Verify every region is balanced\n  jupman export src \
	              dest      Generate a whole chapter"
)]
pub struct JupmanCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Print one variant of a code file or notebook.
	///
	/// The file is read, stripped for the chosen variant and written to
	/// stdout. Nothing on disk changes.
	Strip {
		/// The code file or notebook to strip.
		file: PathBuf,

		/// Which variant to produce.
		#[arg(long, value_enum, default_value_t = VariantArg::Exercise)]
		variant: VariantArg,

		/// Show a line diff between the source and the variant instead of
		/// the variant itself.
		#[arg(long, default_value_t = false)]
		diff: bool,
	},
	/// Check that every tag region in the project is balanced.
	///
	/// Scans all code files and notebooks below the project root and
	/// reports open markers that are never closed and close markers that
	/// were never opened. Files that cannot be read or parsed are reported
	/// by path and the rest are still checked. Exits with a non-zero status
	/// code when any region is unbalanced or any file could not be checked.
	Check {
		/// Output format for check results. Use `text` for human-readable
		/// output or `json` for programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Export a chapter directory.
	///
	/// Solution files (`*_sol.py`, `*-sol.ipynb`) become exercises, relative
	/// links are relocated for the destination and every other file is
	/// copied as is.
	Export {
		/// The chapter directory to read.
		src: PathBuf,

		/// The directory the exported chapter is written to.
		dest: PathBuf,

		/// Also write the solution variant of each non-challenge solution
		/// file next to its exercise.
		#[arg(long, default_value_t = false)]
		solutions: bool,
	},
	/// Print the prefix that leads from a path back to the project root.
	///
	/// For `chapter/data/pop.csv` this prints `../../`.
	Uproot {
		/// A path relative to the project root.
		#[arg(id = "uproot_path", value_name = "PATH")]
		path: String,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
	/// Solutions removed, scaffolding left for the student.
	Exercise,
	/// The full solution without the authoring markers.
	Solution,
	/// The solution as published, with `jupman-strip` regions removed.
	SolutionPublic,
}

impl From<VariantArg> for Variant {
	fn from(value: VariantArg) -> Self {
		match value {
			VariantArg::Exercise => Variant::Exercise,
			VariantArg::Solution => Variant::Solution,
			VariantArg::SolutionPublic => Variant::SolutionPublic,
		}
	}
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption. Each entry includes the
	/// file path, the cell, the position and the message.
	Json,
}
