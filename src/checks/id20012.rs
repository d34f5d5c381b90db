//! ID.20012: more than one ENTRYPOINT in a stage; only the last takes effect.

use std::sync::Arc;

use crate::checks::{label, level, scope, Check, CheckContext, CheckInfo, CheckResult};
use crate::error::CheckError;
use crate::parser::InstructionKind;

pub struct MultipleEntrypoint;

static INFO: CheckInfo = CheckInfo {
    id: "ID.20012",
    name: "multiple-entrypoint",
    description: "a stage declares more than one ENTRYPOINT",
    labels: &[(label::LEVEL, level::WARN), (label::SCOPE, scope::STAGE)],
};

impl Check for MultipleEntrypoint {
    fn info(&self) -> &'static CheckInfo {
        &INFO
    }

    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError> {
        let mut result = CheckResult::new(&INFO);
        for stage in &context.dockerfile.stages {
            let entrypoints = stage.instructions_of(InstructionKind::Entrypoint);
            if entrypoints.len() < 2 {
                continue;
            }
            for shadowed in &entrypoints[..entrypoints.len() - 1] {
                result.add_match(
                    format!(
                        "stage {}: ENTRYPOINT on line {} is shadowed by a later ENTRYPOINT",
                        stage.index, shadowed.start_line
                    ),
                    Some(stage.index),
                    Some(Arc::clone(shadowed)),
                );
            }
        }
        if result.hit {
            result.message = format!("{} shadowed ENTRYPOINT instructions", result.matches.len());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::run_one;

    #[test]
    fn hits_on_duplicate_entrypoint() {
        let content = "FROM scratch\nENTRYPOINT [\"a\"]\nENTRYPOINT [\"b\"]\n";
        assert!(run_one(&MultipleEntrypoint, content).hit);
    }

    #[test]
    fn separate_stages_are_independent() {
        let content = "FROM a:1 AS x\nENTRYPOINT [\"a\"]\nFROM b:2\nENTRYPOINT [\"b\"]\n";
        assert!(!run_one(&MultipleEntrypoint, content).hit);
    }
}
