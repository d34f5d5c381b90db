//! Lint checks: metadata, results, and the static registry.
//!
//! A check is stateless: `info()` returns its stable metadata, `run()`
//! evaluates the shared read-only [`CheckContext`] and reports zero or more
//! matches. Checks never re-parse text; they inspect the pre-computed model
//! only. The registry is an explicit, statically enumerated list — there is
//! no global mutable registration.

use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::CheckError;
use crate::model::Instruction;

pub mod context;
pub mod engine;

pub mod id10001;
pub mod id10002;
pub mod id10003;
pub mod id20001;
pub mod id20002;
pub mod id20003;
pub mod id20004;
pub mod id20005;
pub mod id20006;
pub mod id20007;
pub mod id20008;
pub mod id20009;
pub mod id20010;
pub mod id20011;
pub mod id20012;
pub mod id20013;
pub mod id20014;
pub mod id20015;
pub mod id20016;
pub mod id20017;

pub use context::CheckContext;
pub use engine::{run_checks, run_checks_with_timeout, Report, ReportStatus, CHECK_TIMEOUT};

/// Label keys. These, with the values below, are the documented selection
/// surface and must remain stable across releases.
pub mod label {
    pub const LEVEL: &str = "level";
    pub const SCOPE: &str = "scope";
}

/// `level` label values.
pub mod level {
    pub const ANY: &str = "any";
    pub const FATAL: &str = "fatal";
    pub const ERROR: &str = "error";
    pub const WARN: &str = "warn";
    pub const INFO: &str = "info";
    pub const STYLE: &str = "style";
}

/// `scope` label values.
pub mod scope {
    pub const ALL: &str = "all";
    pub const DOCKERFILE: &str = "dockerfile";
    pub const STAGE: &str = "stage";
    pub const INSTRUCTION: &str = "instruction";
    pub const DOCKERIGNORE: &str = "dockerignore";
    pub const DATA: &str = "data";
    pub const APP: &str = "app";
    pub const SHELL: &str = "shell";
}

/// Stable metadata for one check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckInfo {
    /// Stable ID of form `ID.NNNNN` (10000s = dockerignore scope,
    /// 20000s = dockerfile/stage/instruction scope).
    pub id: &'static str,
    /// Short kebab-case name.
    pub name: &'static str,
    pub description: &'static str,
    pub labels: &'static [(&'static str, &'static str)],
}

impl CheckInfo {
    pub fn label(&self, key: &str) -> Option<&'static str> {
        self.labels
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    pub fn has_label(&self, key: &str, value: &str) -> bool {
        self.labels.iter().any(|(k, v)| *k == key && *v == value)
    }
}

/// One place a check matched, with model back-references.
#[derive(Debug, Clone, Serialize)]
pub struct Match {
    pub message: String,
    /// Index of the stage involved, if any.
    pub stage: Option<usize>,
    /// The instruction involved, if any.
    pub instruction: Option<Arc<Instruction>>,
}

/// The outcome of one check run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    /// The check ID this result came from.
    pub source: String,
    /// True iff the check's condition matched at least once.
    pub hit: bool,
    pub message: String,
    pub matches: Vec<Match>,
}

impl CheckResult {
    pub fn new(info: &CheckInfo) -> Self {
        CheckResult {
            source: info.id.to_string(),
            hit: false,
            message: String::new(),
            matches: Vec::new(),
        }
    }

    /// Record a match; the first one flips `hit`.
    pub fn add_match(
        &mut self,
        message: impl Into<String>,
        stage: Option<usize>,
        instruction: Option<Arc<Instruction>>,
    ) {
        self.hit = true;
        self.matches.push(Match {
            message: message.into(),
            stage,
            instruction,
        });
    }
}

/// An independent, stateless lint rule.
pub trait Check: Send + Sync {
    fn info(&self) -> &'static CheckInfo;

    /// Evaluate the frozen context. Must not mutate shared state; any scratch
    /// state stays local to the call.
    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError>;
}

static REGISTRY: Lazy<Vec<Arc<dyn Check>>> = Lazy::new(|| {
    vec![
        Arc::new(id10001::MissingDockerignore),
        Arc::new(id10002::EmptyDockerignore),
        Arc::new(id10003::DockerfileIgnored),
        Arc::new(id20001::EmptyDockerfile),
        Arc::new(id20002::NoStages),
        Arc::new(id20003::StagelessInstructions),
        Arc::new(id20004::UnknownInstructions),
        Arc::new(id20005::InvalidInstructions),
        Arc::new(id20006::DuplicateStageNames),
        Arc::new(id20007::InvalidStageArguments),
        Arc::new(id20008::UnusedStages),
        Arc::new(id20009::UntaggedImage),
        Arc::new(id20010::LatestTag),
        Arc::new(id20011::MultipleCmd),
        Arc::new(id20012::MultipleEntrypoint),
        Arc::new(id20013::DeprecatedMaintainer),
        Arc::new(id20014::RelativeWorkdir),
        Arc::new(id20015::ShellFormCmd),
        Arc::new(id20016::MultipleHealthcheck),
        Arc::new(id20017::CopyFromOwnStage),
    ]
});

/// Every known check, in registry order.
pub fn all_checks() -> &'static [Arc<dyn Check>] {
    REGISTRY.as_slice()
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn registry_ids_are_unique_and_well_formed() {
        let mut seen = HashSet::new();
        for check in all_checks() {
            let info = check.info();
            assert!(seen.insert(info.id), "duplicate check ID {}", info.id);
            assert!(info.id.starts_with("ID."), "bad ID format: {}", info.id);
            assert!(info.label(label::LEVEL).is_some(), "{} has no level", info.id);
            assert!(info.label(label::SCOPE).is_some(), "{} has no scope", info.id);
        }
        assert_eq!(seen.len(), 20);
    }

    // This table is the documented selection surface; changing a label here
    // changes which checks label-based filters pick up.
    #[test]
    fn label_surface_is_stable() {
        let expected = [
            ("ID.10001", level::WARN, scope::DOCKERIGNORE),
            ("ID.10002", level::INFO, scope::DOCKERIGNORE),
            ("ID.10003", level::WARN, scope::DOCKERIGNORE),
            ("ID.20001", level::ERROR, scope::DOCKERFILE),
            ("ID.20002", level::ERROR, scope::DOCKERFILE),
            ("ID.20003", level::ERROR, scope::DOCKERFILE),
            ("ID.20004", level::ERROR, scope::INSTRUCTION),
            ("ID.20005", level::ERROR, scope::INSTRUCTION),
            ("ID.20006", level::ERROR, scope::STAGE),
            ("ID.20007", level::ERROR, scope::STAGE),
            ("ID.20008", level::WARN, scope::STAGE),
            ("ID.20009", level::WARN, scope::STAGE),
            ("ID.20010", level::WARN, scope::STAGE),
            ("ID.20011", level::WARN, scope::STAGE),
            ("ID.20012", level::WARN, scope::STAGE),
            ("ID.20013", level::STYLE, scope::INSTRUCTION),
            ("ID.20014", level::WARN, scope::INSTRUCTION),
            ("ID.20015", level::STYLE, scope::INSTRUCTION),
            ("ID.20016", level::ERROR, scope::STAGE),
            ("ID.20017", level::ERROR, scope::INSTRUCTION),
        ];
        assert_eq!(expected.len(), all_checks().len());
        for (id, expected_level, expected_scope) in expected {
            let check = all_checks()
                .iter()
                .find(|c| c.info().id == id)
                .unwrap_or_else(|| panic!("{} missing from registry", id));
            assert_eq!(check.info().label(label::LEVEL), Some(expected_level), "{}", id);
            assert_eq!(check.info().label(label::SCOPE), Some(expected_scope), "{}", id);
        }
    }

    #[test]
    fn dockerignore_checks_use_the_10000_range() {
        for check in all_checks() {
            let info = check.info();
            let is_ignore_scope = info.has_label(label::SCOPE, scope::DOCKERIGNORE);
            let in_10000s = info.id.starts_with("ID.1");
            assert_eq!(is_ignore_scope, in_10000s, "{} range/scope mismatch", info.id);
        }
    }
}
