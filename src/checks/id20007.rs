//! ID.20007: malformed or unresolvable FROM arguments.
//!
//! Covers present-but-empty name/tag/digest segments (`FROM alpine:`) and
//! ARG references with no declaration to resolve against.

use std::sync::Arc;

use crate::checks::{label, level, scope, Check, CheckContext, CheckInfo, CheckResult};
use crate::error::CheckError;

pub struct InvalidStageArguments;

static INFO: CheckInfo = CheckInfo {
    id: "ID.20007",
    name: "invalid-stage-arguments",
    description: "a stage's FROM reference is malformed or unresolvable",
    labels: &[(label::LEVEL, level::ERROR), (label::SCOPE, scope::STAGE)],
};

impl Check for InvalidStageArguments {
    fn info(&self) -> &'static CheckInfo {
        &INFO
    }

    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError> {
        let mut result = CheckResult::new(&INFO);
        for stage in &context.dockerfile.stages {
            let from = stage.all_instructions.first().map(Arc::clone);
            let parent = &stage.parent;

            if parent.has_empty_name {
                result.add_match(
                    format!("stage {} (line {}): empty image name", stage.index, stage.start_line),
                    Some(stage.index),
                    from.clone(),
                );
            }
            if parent.has_empty_tag {
                result.add_match(
                    format!("stage {} (line {}): empty tag", stage.index, stage.start_line),
                    Some(stage.index),
                    from.clone(),
                );
            }
            if parent.has_empty_digest {
                result.add_match(
                    format!("stage {} (line {}): empty digest", stage.index, stage.start_line),
                    Some(stage.index),
                    from.clone(),
                );
            }
            for arg in &stage.unknown_from_args {
                result.add_match(
                    format!(
                        "stage {} (line {}): FROM references undeclared ARG '{}'",
                        stage.index, stage.start_line, arg
                    ),
                    Some(stage.index),
                    from.clone(),
                );
            }
        }
        if result.hit {
            result.message = format!("{} malformed FROM references", result.matches.len());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::run_one;

    #[test]
    fn hits_on_empty_tag() {
        let result = run_one(&InvalidStageArguments, "FROM alpine:\n");
        assert!(result.hit);
        assert!(result.matches[0].message.contains("empty tag"));
    }

    #[test]
    fn hits_on_undeclared_arg() {
        let result = run_one(&InvalidStageArguments, "FROM alpine:${MISSING}\n");
        assert!(result.hit);
        assert!(result.matches[0].message.contains("MISSING"));
    }

    #[test]
    fn scratch_and_resolved_args_are_fine() {
        assert!(!run_one(&InvalidStageArguments, "FROM scratch\n").hit);
        assert!(!run_one(&InvalidStageArguments, "ARG V=3.19\nFROM alpine:$V\n").hit);
    }
}
