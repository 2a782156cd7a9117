use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use jupman_cli::Commands;
use jupman_cli::JupmanCli;
use jupman_cli::OutputFormat;
use jupman_cli::VariantArg;
use jupman_core::Document;
use jupman_core::ExportOptions;
use jupman_core::GenerationContext;
use jupman_core::JupmanConfig;
use jupman_core::LocatedDiagnostic;
use jupman_core::TagDiagnostic;
use jupman_core::Variant;
use jupman_core::collect_sources;
use jupman_core::export_chapter;
use jupman_core::generate;
use jupman_core::refine_public;
use jupman_core::uproot::FsClassifier;
use jupman_core::uproot::compute_root_prefix;
use jupman_core::validate_document;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = JupmanCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	let default_level = if args.verbose { "debug" } else { "warn" };
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
		)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.without_time()
		.init();

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Strip {
			file,
			variant,
			diff,
		}) => run_strip(&args, file, *variant, *diff),
		Some(Commands::Check { format }) => run_check(&args, *format),
		Some(Commands::Export {
			src,
			dest,
			solutions,
		}) => run_export(&args, src, dest, *solutions),
		Some(Commands::Uproot { path }) => run_uproot(&args, path),
		None => {
			eprintln!("No subcommand specified. Run `jupman --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<jupman_core::JupmanError>() {
			Ok(jupman_err) => {
				let report: miette::Report = (*jupman_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

fn resolve_root(args: &JupmanCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn run_strip(
	args: &JupmanCli,
	file: &Path,
	variant: VariantArg,
	show_diff: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = JupmanConfig::load_or_default(&root)?;
	let source_id = make_relative(file, &root);

	let text = std::fs::read_to_string(file)?;
	let document = Document::parse(file, &text)?;
	let variant = Variant::from(variant);

	let ctx = GenerationContext {
		strip: config.strip_options(),
		relocation: None,
		support_module: config.support_module.clone(),
		source_id,
	};
	let generated = match generate(&document, variant, &ctx)? {
		Document::Notebook(notebook) if variant == Variant::SolutionPublic => {
			Document::Notebook(refine_public(&notebook))
		}
		generated => generated,
	};
	let output = generated.to_text()?;

	if show_diff {
		if output == text {
			println!("{} is unchanged by the {variant} variant", ctx.source_id);
		} else {
			println!("{}", colored!(&ctx.source_id, bold));
			print_diff(&text, &output);
		}
	} else {
		print!("{output}");
	}

	Ok(())
}

fn run_check(args: &JupmanCli, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = JupmanConfig::load_or_default(&root)?;
	let scan = collect_sources(&root, &config)?;
	let files = scan.files;

	let mut count = 0;
	let mut problems: Vec<(String, LocatedDiagnostic)> = Vec::new();
	let mut failures: Vec<(String, String)> = scan
		.failures
		.iter()
		.map(|failure| (failure.path.display().to_string(), failure.error.to_string()))
		.collect();

	for file in &files {
		let rel = make_relative(file, &root);
		let document = match read_document(file) {
			Ok(document) => document,
			Err(error) => {
				tracing::warn!(path = %rel, "failed to check: {error}");
				failures.push((rel, error.to_string()));
				continue;
			}
		};
		let report = validate_document(&document, &rel);

		if args.verbose {
			println!("{rel}: {} tag(s)", report.count);
		}

		count += report.count;
		problems.extend(
			report
				.diagnostics
				.into_iter()
				.map(|diagnostic| (rel.clone(), diagnostic)),
		);
	}

	match format {
		OutputFormat::Text => {
			for (rel, error) in &failures {
				eprintln!("{} {rel}: {error}", colored!("failed:", red));
			}

			if problems.is_empty() && failures.is_empty() {
				println!(
					"{} {count} tag(s) across {} file(s) are balanced.",
					colored!("ok:", green),
					files.len()
				);
			} else if !problems.is_empty() {
				for (rel, located) in &problems {
					let report = diagnostic_to_report(located, rel);
					eprintln!("{report:?}");
				}
				eprintln!(
					"{} {} unbalanced region(s) found.",
					colored!("error:", red),
					problems.len()
				);
			}

			if !failures.is_empty() {
				eprintln!(
					"{} {} file(s) could not be checked.",
					colored!("error:", red),
					failures.len()
				);
			}
		}
		OutputFormat::Json => {
			let diagnostics: Vec<serde_json::Value> = problems
				.iter()
				.map(|(rel, located)| {
					serde_json::json!({
						"file": rel,
						"cell": located.cell,
						"line": located.diagnostic.line(),
						"column": located.diagnostic.column(),
						"tag": located.diagnostic.name().as_str(),
						"message": located.diagnostic.message(),
					})
				})
				.collect();
			let failed: Vec<serde_json::Value> = failures
				.iter()
				.map(|(rel, error)| serde_json::json!({ "file": rel, "error": error }))
				.collect();
			let output = serde_json::json!({
				"ok": problems.is_empty() && failures.is_empty(),
				"files": files.len(),
				"tags": count,
				"diagnostics": diagnostics,
				"failures": failed,
			});
			println!("{}", serde_json::to_string_pretty(&output)?);
		}
	}

	if !problems.is_empty() || !failures.is_empty() {
		process::exit(1);
	}

	Ok(())
}

fn read_document(file: &Path) -> Result<Document, Box<dyn std::error::Error>> {
	let text = std::fs::read_to_string(file)?;
	Ok(Document::parse(file, &text)?)
}

fn run_export(
	args: &JupmanCli,
	src: &Path,
	dest: &Path,
	solutions: bool,
) -> Result<(), Box<dyn std::error::Error>> {
	let root = std::path::absolute(resolve_root(args))?;
	let src = std::path::absolute(src)?;
	let dest = std::path::absolute(dest)?;
	let options = ExportOptions {
		project_root: root.clone(),
		copy_solutions: solutions,
		config: JupmanConfig::load_or_default(&root)?,
	};

	let report = export_chapter(&src, &dest, &options)?;

	for path in &report.written {
		if args.verbose {
			println!("  {} {}", colored!("wrote", green), path.display());
		}
	}

	for (path, located) in &report.diagnostics {
		let report = diagnostic_to_report(located, &path.display().to_string());
		eprintln!("{report:?}");
	}

	for failure in &report.failures {
		eprintln!(
			"{} {}: {}",
			colored!("failed:", red),
			failure.path.display(),
			failure.error
		);
	}

	println!(
		"Exported {} file(s) to {}",
		report.written.len(),
		dest.display()
	);

	if !report.is_success() {
		eprintln!(
			"{} {} file(s) could not be exported",
			colored!("warning:", yellow),
			report.failures.len()
		);
		process::exit(1);
	}

	Ok(())
}

fn run_uproot(args: &JupmanCli, path: &str) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	println!("{}", compute_root_prefix(path, &FsClassifier::new(root)));

	Ok(())
}

fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				print!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				print!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				print!("   {change}");
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}

/// Convert a tag diagnostic into a `miette::Report` with an error code and
/// help text for rich terminal display.
fn diagnostic_to_report(located: &LocatedDiagnostic, rel_path: &str) -> miette::Report {
	let diag = &located.diagnostic;
	let location = match located.cell {
		Some(cell) => format!("{rel_path} cell {cell}:{}:{}", diag.line(), diag.column()),
		None => format!("{rel_path}:{}:{}", diag.line(), diag.column()),
	};

	let message = format!("[{location}] {}", diag.message());
	let name = diag.name();
	let (code, help) = match diag {
		TagDiagnostic::UnclosedRegion { .. } => {
			(
				"jupman::unclosed_region",
				format!("add `{}` where the region should end", name.close_marker()),
			)
		}
		TagDiagnostic::UnopenedRegion { .. } => {
			(
				"jupman::unopened_region",
				format!(
					"add `{}` where the region should start or remove the stray marker",
					name.open_marker()
				),
			)
		}
		_ => ("jupman::diagnostic", diag.message()),
	};

	let diag_value = miette::MietteDiagnostic::new(message)
		.with_code(code)
		.with_help(help)
		.with_severity(miette::Severity::Error);
	miette::Report::new(diag_value)
}
