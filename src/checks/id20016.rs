//! ID.20016: more than one HEALTHCHECK in a stage.

use std::sync::Arc;

use crate::checks::{label, level, scope, Check, CheckContext, CheckInfo, CheckResult};
use crate::error::CheckError;
use crate::parser::InstructionKind;

pub struct MultipleHealthcheck;

static INFO: CheckInfo = CheckInfo {
    id: "ID.20016",
    name: "multiple-healthcheck",
    description: "a stage declares more than one HEALTHCHECK",
    labels: &[(label::LEVEL, level::ERROR), (label::SCOPE, scope::STAGE)],
};

impl Check for MultipleHealthcheck {
    fn info(&self) -> &'static CheckInfo {
        &INFO
    }

    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError> {
        let mut result = CheckResult::new(&INFO);
        for stage in &context.dockerfile.stages {
            let healthchecks = stage.instructions_of(InstructionKind::Healthcheck);
            if healthchecks.len() < 2 {
                continue;
            }
            for shadowed in &healthchecks[..healthchecks.len() - 1] {
                result.add_match(
                    format!(
                        "stage {}: HEALTHCHECK on line {} is shadowed by a later HEALTHCHECK",
                        stage.index, shadowed.start_line
                    ),
                    Some(stage.index),
                    Some(Arc::clone(shadowed)),
                );
            }
        }
        if result.hit {
            result.message = format!("{} shadowed HEALTHCHECK instructions", result.matches.len());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::run_one;

    #[test]
    fn hits_on_duplicate_healthcheck() {
        let content =
            "FROM scratch\nHEALTHCHECK CMD curl -f http://localhost/\nHEALTHCHECK NONE\n";
        let result = run_one(&MultipleHealthcheck, content);
        assert!(result.hit);
        assert_eq!(result.matches[0].instruction.as_ref().unwrap().start_line, 2);
    }

    #[test]
    fn one_per_stage_is_fine() {
        assert!(!run_one(&MultipleHealthcheck, "FROM scratch\nHEALTHCHECK NONE\n").hit);
    }
}
