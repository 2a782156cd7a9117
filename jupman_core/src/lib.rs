//! `jupman_core` derives exercise, solution and website variants of course
//! material from a single authored source. Code files and notebooks mark
//! instructor-only content with inline tags; the engine strips, keeps or
//! replaces that content per variant and relocates relative references so
//! copies still resolve from their new place in the tree.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Code file / notebook cell
//!   → Grammar (tag patterns: `# SOLUTION`, `# write here`, `**ANSWER**:`)
//!   → Lexer (logos tokens for `#jupman-raise`, `#jupman-strip`, `#jupman-purge`)
//!   → Parser (pairs open/close markers into regions, reports imbalance)
//!   → Engine (per-variant stripping in a single scan)
//!   → Uproot (relocates links, images and script imports)
//!   → Document (applies all of the above cell by cell)
//! ```
//!
//! ## Tags
//!
//! | Tag | exercise | solution | solution-public |
//! |---|---|---|---|
//! | `# SOLUTION` | truncates from the marker line | marker line removed | marker line removed |
//! | `# write here` | keeps the marker line, truncates after it | marker line removed | marker line removed |
//! | `**ANSWER**:` | truncates after the marker | kept | kept |
//! | `#jupman-raise` … | placeholder statement | body kept | body kept |
//! | `#jupman-strip` … | removed | body kept | removed |
//! | `#jupman-purge` … | removed | removed | removed |
//!
//! ## Quick Start
//!
//! ```rust
//! use jupman_core::StripOptions;
//! use jupman_core::Variant;
//! use jupman_core::strip_code;
//!
//! let source = "def add(a, b):\n    #jupman-raise\n    return a + b\n    #/jupman-raise\n";
//! let exercise = strip_code(source, Variant::Exercise, &StripOptions::default());
//! assert_eq!(
//! 	exercise,
//! 	"def add(a, b):\n    raise Exception('TODO IMPLEMENT ME !')\n"
//! );
//! ```

pub use config::*;
pub use date::*;
pub use document::*;
pub use engine::*;
pub use error::*;
pub use grammar::*;
pub use lexer::Dialect;
pub use lexer::tokenize;
pub use notebook::*;
pub use parser::*;
pub use project::*;
pub use tokens::*;
pub use uproot::*;
pub use validate::*;

pub mod config;
mod date;
mod document;
mod engine;
#[allow(unused_assignments)]
mod error;
mod grammar;
pub(crate) mod lexer;
pub mod notebook;
mod parser;
pub mod project;
mod tokens;
pub mod uproot;
mod validate;

#[cfg(test)]
mod __fixtures;
