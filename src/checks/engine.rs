//! Concurrent check execution.
//!
//! Every selected check runs as an independent worker thread against the
//! shared read-only context. Results funnel into one channel pre-sized to
//! the selected-check count, so producers never block on send. Collection
//! races a global wall-clock budget against completion; on timeout the
//! still-running workers are deliberately abandoned — checks are pure,
//! bounded, in-memory computations, and no cancellation signal is sent.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel;
use serde::Serialize;

use crate::checks::{all_checks, Check, CheckContext, CheckResult};
use crate::error::CheckError;
use crate::ignorefile::Dockerignore;
use crate::model::Dockerfile;
use crate::options::LintOptions;

/// Global wall-clock budget for one lint run.
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(120);

/// Lifecycle of a lint run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Unknown,
    Running,
    Complete,
    Timeout,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Timeout => "timeout",
        }
    }
}

/// The outcome of a lint run: the frozen models plus three ID-keyed maps.
///
/// `errors` entries are inconclusive — neither a hit nor a clean pass — and
/// none of the maps is mutually exclusive with a `Timeout` status: results
/// collected before the deadline remain usable.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub status: ReportStatus,
    pub dockerfile: Arc<Dockerfile>,
    pub dockerignore: Arc<Dockerignore>,
    pub hits: BTreeMap<String, CheckResult>,
    pub no_hits: BTreeMap<String, CheckResult>,
    pub errors: BTreeMap<String, String>,
}

impl Report {
    fn new(dockerfile: Arc<Dockerfile>, dockerignore: Arc<Dockerignore>) -> Self {
        Report {
            status: ReportStatus::Unknown,
            dockerfile,
            dockerignore,
            hits: BTreeMap::new(),
            no_hits: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    pub fn has_hits(&self) -> bool {
        !self.hits.is_empty()
    }

    /// Hit check IDs in sorted order.
    pub fn hit_ids(&self) -> Vec<&str> {
        self.hits.keys().map(String::as_str).collect()
    }

    /// Serialize the whole report (models included) to pretty JSON for
    /// downstream consumers.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Apply the selection filters to the registry.
pub fn select_checks(options: &LintOptions) -> Vec<Arc<dyn Check>> {
    let registry = all_checks();

    // Non-empty include-by-ID is authoritative.
    if !options.include_check_ids.is_empty() {
        return registry
            .iter()
            .filter(|c| options.include_check_ids.contains(c.info().id))
            .cloned()
            .collect();
    }

    // Include-by-label, narrowed by exclude-IDs.
    if !options.include_check_labels.is_empty() {
        return registry
            .iter()
            .filter(|c| {
                options
                    .include_check_labels
                    .iter()
                    .any(|(k, v)| c.info().has_label(k, v))
            })
            .filter(|c| !options.exclude_check_ids.contains(c.info().id))
            .cloned()
            .collect();
    }

    // Default-all minus exclude-IDs minus exclude-labels.
    registry
        .iter()
        .filter(|c| !options.exclude_check_ids.contains(c.info().id))
        .filter(|c| {
            !options
                .exclude_check_labels
                .iter()
                .any(|(k, v)| c.info().has_label(k, v))
        })
        .cloned()
        .collect()
}

/// Run the selected checks with the standard 120-second budget.
pub fn run_checks(options: &LintOptions, context: Arc<CheckContext>) -> Report {
    run_checks_with_timeout(options, context, CHECK_TIMEOUT)
}

/// Run the selected checks against a frozen context with an explicit budget.
pub fn run_checks_with_timeout(
    options: &LintOptions,
    context: Arc<CheckContext>,
    timeout: Duration,
) -> Report {
    run_check_set(select_checks(options), context, timeout)
}

/// Fan out one worker thread per check and collect under the budget.
fn run_check_set(
    checks: Vec<Arc<dyn Check>>,
    context: Arc<CheckContext>,
    timeout: Duration,
) -> Report {
    let mut report = Report::new(
        Arc::clone(&context.dockerfile),
        Arc::clone(&context.dockerignore),
    );

    if checks.is_empty() {
        report.status = ReportStatus::Complete;
        return report;
    }
    report.status = ReportStatus::Running;
    log::debug!("running {} checks", checks.len());

    // Sized to the worker count so sends never block, even for workers that
    // finish after a timeout abandoned them.
    let total = checks.len();
    let (sender, receiver) = channel::bounded(total);

    for check in checks {
        let sender = sender.clone();
        let context = Arc::clone(&context);
        thread::spawn(move || {
            let id = check.info().id;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| check.run(&context)));
            let result = match outcome {
                Ok(result) => result,
                Err(payload) => Err(CheckError::Panicked(panic_message(payload.as_ref()))),
            };
            let _ = sender.send((id.to_string(), result));
        });
    }
    drop(sender);

    let deadline = channel::after(timeout);
    let mut received = 0usize;
    report.status = loop {
        crossbeam::select! {
            recv(receiver) -> message => match message {
                Ok((id, Ok(result))) => {
                    if result.hit {
                        report.hits.insert(id, result);
                    } else {
                        report.no_hits.insert(id, result);
                    }
                    received += 1;
                    if received == total {
                        break ReportStatus::Complete;
                    }
                }
                Ok((id, Err(err))) => {
                    log::warn!("check {} failed: {}", id, err);
                    report.errors.insert(id, err.to_string());
                    received += 1;
                    if received == total {
                        break ReportStatus::Complete;
                    }
                }
                Err(_) => break ReportStatus::Complete,
            },
            recv(deadline) -> _ => {
                log::warn!(
                    "check run timed out after {:?} with {}/{} results",
                    timeout,
                    received,
                    total
                );
                break ReportStatus::Timeout;
            }
        }
    };

    report
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{label, level, scope, CheckInfo};

    fn context_for(content: &str) -> Arc<CheckContext> {
        let outcome = crate::parser::parse_bytes(content.as_bytes()).unwrap();
        let dockerfile = Dockerfile::build(outcome, "Dockerfile", "Dockerfile").unwrap();
        Arc::new(CheckContext::new(
            "Dockerfile",
            None,
            Arc::new(dockerfile),
            Arc::new(Dockerignore::missing()),
        ))
    }

    struct StuckCheck;

    static STUCK_INFO: CheckInfo = CheckInfo {
        id: "ID.29999",
        name: "stuck",
        description: "never returns",
        labels: &[(label::LEVEL, level::ANY), (label::SCOPE, scope::ALL)],
    };

    impl Check for StuckCheck {
        fn info(&self) -> &'static CheckInfo {
            &STUCK_INFO
        }

        fn run(&self, _context: &CheckContext) -> Result<CheckResult, CheckError> {
            loop {
                thread::sleep(Duration::from_secs(60));
            }
        }
    }

    struct PanickyCheck;

    static PANICKY_INFO: CheckInfo = CheckInfo {
        id: "ID.29998",
        name: "panicky",
        description: "always panics",
        labels: &[(label::LEVEL, level::ANY), (label::SCOPE, scope::ALL)],
    };

    impl Check for PanickyCheck {
        fn info(&self) -> &'static CheckInfo {
            &PANICKY_INFO
        }

        fn run(&self, _context: &CheckContext) -> Result<CheckResult, CheckError> {
            panic!("boom");
        }
    }

    #[test]
    fn include_ids_are_authoritative() {
        let options = LintOptions::new()
            .include_id("ID.20001")
            // Exclusions are ignored while includes are present.
            .exclude_id("ID.20001")
            .exclude_label(label::LEVEL, level::ERROR);
        let selected = select_checks(&options);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].info().id, "ID.20001");
    }

    #[test]
    fn label_include_narrowed_by_id_exclude() {
        let options = LintOptions::new()
            .include_label(label::SCOPE, scope::DOCKERIGNORE)
            .exclude_id("ID.10002");
        let ids: Vec<&str> = select_checks(&options)
            .iter()
            .map(|c| c.info().id)
            .collect();
        assert_eq!(ids, vec!["ID.10001", "ID.10003"]);
    }

    #[test]
    fn style_level_selects_the_style_checks() {
        let options = LintOptions::new().include_label(label::LEVEL, level::STYLE);
        let ids: Vec<&str> = select_checks(&options)
            .iter()
            .map(|c| c.info().id)
            .collect();
        assert_eq!(ids, vec!["ID.20013", "ID.20015"]);
    }

    #[test]
    fn default_all_minus_excludes() {
        let total = all_checks().len();
        let options = LintOptions::new().exclude_id("ID.20001");
        assert_eq!(select_checks(&options).len(), total - 1);

        let options = LintOptions::new().exclude_label(label::SCOPE, scope::DOCKERIGNORE);
        assert_eq!(select_checks(&options).len(), total - 3);
    }

    #[test]
    fn zero_selected_goes_straight_to_complete() {
        let options = LintOptions::new().include_id("ID.99999");
        let report = run_checks(&options, context_for("FROM scratch\n"));
        assert_eq!(report.status, ReportStatus::Complete);
        assert!(report.hits.is_empty());
        assert!(report.no_hits.is_empty());
        assert!(report.errors.is_empty());
    }

    #[test]
    fn excluded_check_appears_nowhere() {
        let options = LintOptions::new().exclude_id("ID.20001");
        let report = run_checks(&options, context_for(""));
        assert!(!report.hits.contains_key("ID.20001"));
        assert!(!report.no_hits.contains_key("ID.20001"));
        // The no-stages check still fires on an empty Dockerfile.
        assert!(report.hits.contains_key("ID.20002"));
    }

    #[test]
    fn every_check_lands_in_exactly_one_map() {
        let report = run_checks(&LintOptions::new(), context_for("FROM scratch\n"));
        assert_eq!(report.status, ReportStatus::Complete);
        let total = all_checks().len();
        assert_eq!(
            report.hits.len() + report.no_hits.len() + report.errors.len(),
            total
        );
    }

    #[test]
    fn stuck_check_times_out_without_blocking_others() {
        let checks: Vec<Arc<dyn Check>> = vec![
            Arc::new(StuckCheck),
            Arc::new(crate::checks::id20001::EmptyDockerfile),
        ];
        let report = run_check_set(checks, context_for(""), Duration::from_millis(300));
        assert_eq!(report.status, ReportStatus::Timeout);
        // The fast check's result was collected before the deadline.
        assert!(report.hits.contains_key("ID.20001"));
        assert!(!report.hits.contains_key("ID.29999"));
        assert!(!report.no_hits.contains_key("ID.29999"));
    }

    #[test]
    fn panicking_check_is_attributed_not_fatal() {
        let checks: Vec<Arc<dyn Check>> = vec![
            Arc::new(PanickyCheck),
            Arc::new(crate::checks::id20002::NoStages),
        ];
        let report = run_check_set(checks, context_for(""), Duration::from_secs(5));
        assert_eq!(report.status, ReportStatus::Complete);
        assert!(report.errors["ID.29998"].contains("boom"));
        assert!(report.hits.contains_key("ID.20002"));
    }
}
