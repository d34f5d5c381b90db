//! ID.20008: stages no later stage consumes.

use std::sync::Arc;

use crate::checks::{label, level, scope, Check, CheckContext, CheckInfo, CheckResult};
use crate::error::CheckError;

pub struct UnusedStages;

static INFO: CheckInfo = CheckInfo {
    id: "ID.20008",
    name: "unused-stages",
    description: "stages that are never used by a later stage",
    labels: &[(label::LEVEL, level::WARN), (label::SCOPE, scope::STAGE)],
};

impl Check for UnusedStages {
    fn info(&self) -> &'static CheckInfo {
        &INFO
    }

    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError> {
        let mut result = CheckResult::new(&INFO);
        for stage in &context.dockerfile.stages {
            if stage.is_used {
                continue;
            }
            let label = match &stage.name {
                Some(name) => format!("stage {} ('{}')", stage.index, name),
                None => format!("stage {}", stage.index),
            };
            result.add_match(
                format!("{} starting on line {} is never used", label, stage.start_line),
                Some(stage.index),
                stage.all_instructions.first().map(Arc::clone),
            );
        }
        if result.hit {
            result.message = format!("{} unused stages", result.matches.len());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::run_one;

    #[test]
    fn hits_on_abandoned_stage() {
        let result = run_one(&UnusedStages, "FROM a:1 AS orphan\nFROM b:2\n");
        assert!(result.hit);
        assert_eq!(result.matches[0].stage, Some(0));
    }

    #[test]
    fn from_and_copy_references_count_as_use() {
        let content = "FROM a:1 AS base\nFROM base AS build\nFROM c:3\nCOPY --from=build /x /y\n";
        assert!(!run_one(&UnusedStages, content).hit);
    }

    #[test]
    fn the_final_stage_is_always_used() {
        assert!(!run_one(&UnusedStages, "FROM scratch\n").hit);
    }
}
