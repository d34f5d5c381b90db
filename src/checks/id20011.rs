//! ID.20011: more than one CMD in a stage; only the last takes effect.

use std::sync::Arc;

use crate::checks::{label, level, scope, Check, CheckContext, CheckInfo, CheckResult};
use crate::error::CheckError;
use crate::parser::InstructionKind;

pub struct MultipleCmd;

static INFO: CheckInfo = CheckInfo {
    id: "ID.20011",
    name: "multiple-cmd",
    description: "a stage declares more than one CMD",
    labels: &[(label::LEVEL, level::WARN), (label::SCOPE, scope::STAGE)],
};

impl Check for MultipleCmd {
    fn info(&self) -> &'static CheckInfo {
        &INFO
    }

    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError> {
        let mut result = CheckResult::new(&INFO);
        for stage in &context.dockerfile.stages {
            let cmds = stage.instructions_of(InstructionKind::Cmd);
            if cmds.len() < 2 {
                continue;
            }
            // Every CMD before the last one is shadowed.
            for shadowed in &cmds[..cmds.len() - 1] {
                result.add_match(
                    format!(
                        "stage {}: CMD on line {} is shadowed by a later CMD",
                        stage.index, shadowed.start_line
                    ),
                    Some(stage.index),
                    Some(Arc::clone(shadowed)),
                );
            }
        }
        if result.hit {
            result.message = format!("{} shadowed CMD instructions", result.matches.len());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::run_one;

    #[test]
    fn hits_on_two_cmds_in_one_stage() {
        let result = run_one(&MultipleCmd, "FROM scratch\nCMD [\"a\"]\nCMD [\"b\"]\n");
        assert!(result.hit);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].instruction.as_ref().unwrap().start_line, 2);
    }

    #[test]
    fn one_cmd_per_stage_is_fine() {
        let content = "FROM a:1 AS x\nCMD [\"a\"]\nFROM b:2\nCMD [\"b\"]\n";
        assert!(!run_one(&MultipleCmd, content).hit);
    }

    #[test]
    fn onbuild_cmd_does_not_count() {
        assert!(!run_one(&MultipleCmd, "FROM scratch\nCMD [\"a\"]\nONBUILD CMD [\"b\"]\n").hit);
    }
}
