//! ID.20002: no build stage was ever opened.
//!
//! A Dockerfile without a single valid FROM cannot produce an image.

use crate::checks::{label, level, scope, Check, CheckContext, CheckInfo, CheckResult};
use crate::error::CheckError;

pub struct NoStages;

static INFO: CheckInfo = CheckInfo {
    id: "ID.20002",
    name: "no-stages",
    description: "the Dockerfile defines no build stages",
    labels: &[
        (label::LEVEL, level::ERROR),
        (label::SCOPE, scope::DOCKERFILE),
    ],
};

impl Check for NoStages {
    fn info(&self) -> &'static CheckInfo {
        &INFO
    }

    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError> {
        let mut result = CheckResult::new(&INFO);
        if context.dockerfile.stages.is_empty() {
            result.add_match("no valid FROM instruction found", None, None);
            result.message = INFO.description.to_string();
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::run_one;

    #[test]
    fn hits_without_a_valid_from() {
        assert!(run_one(&NoStages, "").hit);
        assert!(run_one(&NoStages, "RUN echo hi\n").hit);
        // A shape-invalid FROM opens no stage.
        assert!(run_one(&NoStages, "FROM a b\n").hit);
    }

    #[test]
    fn silent_with_a_stage() {
        assert!(!run_one(&NoStages, "FROM scratch\n").hit);
    }
}
