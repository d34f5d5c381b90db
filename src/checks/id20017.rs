//! ID.20017: COPY --from pointing at the stage it appears in.

use std::sync::Arc;

use crate::checks::{label, level, scope, Check, CheckContext, CheckInfo, CheckResult};
use crate::error::CheckError;
use crate::parser::InstructionKind;

pub struct CopyFromOwnStage;

static INFO: CheckInfo = CheckInfo {
    id: "ID.20017",
    name: "copy-from-own-stage",
    description: "COPY --from references the stage it belongs to",
    labels: &[
        (label::LEVEL, level::ERROR),
        (label::SCOPE, scope::INSTRUCTION),
    ],
};

impl Check for CopyFromOwnStage {
    fn info(&self) -> &'static CheckInfo {
        &INFO
    }

    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError> {
        let mut result = CheckResult::new(&INFO);
        let df = &context.dockerfile;
        for stage in &df.stages {
            for instr in &stage.all_instructions {
                if instr.kind != InstructionKind::Copy {
                    continue;
                }
                let Some(value) = instr.flag_value("from") else {
                    continue;
                };
                let target = match value.parse::<usize>() {
                    Ok(index) => Some(index),
                    Err(_) => df.stages_by_name.get(value).copied(),
                };
                if target == Some(stage.index) {
                    result.add_match(
                        format!(
                            "stage {}: COPY --from={} on line {} references its own stage",
                            stage.index, value, instr.start_line
                        ),
                        Some(stage.index),
                        Some(Arc::clone(instr)),
                    );
                }
            }
        }
        if result.hit {
            result.message = format!("{} self-referencing COPY instructions", result.matches.len());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::run_one;

    #[test]
    fn hits_on_own_index() {
        let result = run_one(&CopyFromOwnStage, "FROM scratch\nCOPY --from=0 /x /y\n");
        assert!(result.hit);
        assert_eq!(result.matches[0].stage, Some(0));
    }

    #[test]
    fn hits_on_own_name() {
        let content = "FROM a:1\nFROM b:2 AS me\nCOPY --from=me /x /y\n";
        let result = run_one(&CopyFromOwnStage, content);
        assert!(result.hit);
        assert_eq!(result.matches[0].stage, Some(1));
    }

    #[test]
    fn earlier_stage_references_are_fine() {
        let content = "FROM a:1 AS base\nFROM b:2\nCOPY --from=base /x /y\nCOPY --from=0 /a /b\n";
        assert!(!run_one(&CopyFromOwnStage, content).hit);
    }

    #[test]
    fn external_references_are_fine() {
        assert!(!run_one(&CopyFromOwnStage, "FROM scratch\nCOPY --from=nginx:1.25 /x /y\n").hit);
    }
}
