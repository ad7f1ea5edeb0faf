//! `docstrip_core` turns private C and C++ sources into their public variant.
//! Doxygen comments are removed, a provenance notice is added once, and
//! blank lines around declarations are collapsed. Files in unexpected
//! encodings and partially malformed comments are tolerated.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Batch walker (collects *.c, *.cc, *.cpp, *.cxx, *.h, *.hpp)
//!   → Encoding resolver (BOM, UTF-8, detected, optional Windows-1252)
//!   → Comment stripper (two-state scanner over lines)
//!   → Header notice injector
//!   → Blank-line collapser (line classifier + fixed-point passes)
//!   → Formatter adapter (external clang-format, style sidecar)
//!   → Blank-line collapser again
//! ```
//!
//! ## Modules
//!
//! - [`config`]: `docstrip.toml` discovery and schema.
//! - [`stripper`]: doc-comment removal.
//! - [`classifier`] and [`collapser`]: declaration-aware blank-line cleanup.
//! - [`notice`]: provenance banner insertion.
//! - [`formatter`] and [`style`]: the external formatter and its style file.
//! - [`pipeline`]: per-file orchestration and reports.
//! - [`batch`]: directory walking and the worker pool.
//! - [`publish`]: copying headers into a public tree while honouring ignore
//!   markers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docstrip_core::DocstripConfig;
//! use docstrip_core::PipelineOptions;
//! use docstrip_core::run_batch;
//! use std::path::Path;
//!
//! let root = Path::new("include");
//! let config = DocstripConfig::discover(root).unwrap();
//! let options = PipelineOptions::from_config(&config);
//!
//! let report = run_batch(root, &options).unwrap();
//! for file in &report.files {
//!     for warning in &file.warnings {
//!         eprintln!("{}: {warning}", file.path.display());
//!     }
//! }
//! ```

pub use batch::*;
pub use config::*;
pub use error::*;
pub use pipeline::*;

pub mod batch;
pub mod classifier;
pub mod collapser;
pub mod config;
pub mod encoding;
#[allow(unused_assignments)]
mod error;
pub mod formatter;
pub mod notice;
pub mod pipeline;
pub mod publish;
pub mod stripper;
pub mod style;

#[cfg(test)]
mod __fixtures;
