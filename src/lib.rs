//! # dflint
//!
//! A Dockerfile parsing and linting engine. The pipeline has three fixed
//! phases: tokenize the raw text into logical lines (handling `\`
//! continuations and the `# escape=` directive), build a per-instruction AST
//! with shape validation, then assemble the semantic model of build stages,
//! resolved parent images, and cross-stage references. A registry of
//! stateless checks runs concurrently against that frozen model and produces
//! a [`Report`] keyed by stable check IDs.
//!
//! ## Example
//!
//! ```rust,no_run
//! use dflint::{lint_file, LintOptions};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), dflint::ModelError> {
//! let report = lint_file(Path::new("Dockerfile"), None, &LintOptions::new())?;
//! for (id, result) in &report.hits {
//!     println!("{}: {}", id, result.message);
//! }
//! # Ok(())
//! # }
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod checks;
pub mod error;
pub mod ignorefile;
pub mod model;
pub mod options;
pub mod parser;

pub use checks::{
    all_checks, run_checks, run_checks_with_timeout, Check, CheckContext, CheckInfo, CheckResult,
    Report, ReportStatus, CHECK_TIMEOUT,
};
pub use error::{CheckError, ModelError, ParseError};
pub use ignorefile::Dockerignore;
pub use model::{BuildStage, Dockerfile, Instruction, ParentImage};
pub use options::LintOptions;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lint a Dockerfile on disk.
///
/// The `.dockerignore` is looked up in `context_dir` when given, otherwise in
/// the Dockerfile's own directory. Fails only when the file cannot be read or
/// tokenized; lintable problems land in the report instead.
pub fn lint_file(
    path: &Path,
    context_dir: Option<&Path>,
    options: &LintOptions,
) -> Result<Report, ModelError> {
    let dockerfile = Dockerfile::from_file(path)?;
    let context_dir: Option<PathBuf> = context_dir
        .map(Path::to_path_buf)
        .or_else(|| path.parent().map(Path::to_path_buf));
    let dockerignore = match &context_dir {
        Some(dir) => Dockerignore::load(dir),
        None => Dockerignore::missing(),
    };
    let context = CheckContext::new(path, context_dir, Arc::new(dockerfile), Arc::new(dockerignore));
    Ok(run_checks(options, Arc::new(context)))
}

/// Lint Dockerfile content from any reader.
///
/// No build context is available, so the dockerignore checks see an absent
/// file.
pub fn lint_reader<R: Read>(
    reader: R,
    name: impl Into<String>,
    options: &LintOptions,
) -> Result<Report, ModelError> {
    let name = name.into();
    let dockerfile = Dockerfile::from_reader(reader, name.clone())?;
    let context = CheckContext::new(
        name,
        None,
        Arc::new(dockerfile),
        Arc::new(Dockerignore::missing()),
    );
    Ok(run_checks(options, Arc::new(context)))
}
