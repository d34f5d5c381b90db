//! ID.20004: instructions outside the known vocabulary.

use std::sync::Arc;

use crate::checks::{label, level, scope, Check, CheckContext, CheckInfo, CheckResult};
use crate::error::CheckError;

pub struct UnknownInstructions;

static INFO: CheckInfo = CheckInfo {
    id: "ID.20004",
    name: "unknown-instructions",
    description: "unrecognized instruction keywords",
    labels: &[
        (label::LEVEL, level::ERROR),
        (label::SCOPE, scope::INSTRUCTION),
    ],
};

impl Check for UnknownInstructions {
    fn info(&self) -> &'static CheckInfo {
        &INFO
    }

    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError> {
        let mut result = CheckResult::new(&INFO);
        for instr in &context.dockerfile.unknown_instructions {
            let stage = (instr.stage_id >= 0).then(|| instr.stage_id as usize);
            // The parser records "unknown instruction: KEYWORD" on the node.
            let detail = instr
                .errors
                .first()
                .cloned()
                .unwrap_or_else(|| "unknown instruction".to_string());
            result.add_match(
                format!("line {}: {}", instr.start_line, detail),
                stage,
                Some(Arc::clone(instr)),
            );
        }
        if result.hit {
            result.message = format!("{} unknown instructions", result.matches.len());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::run_one;

    #[test]
    fn hits_on_typo_keyword() {
        let result = run_one(&UnknownInstructions, "FROM scratch\nFORM alpine\n");
        assert!(result.hit);
        assert_eq!(result.matches[0].stage, Some(0));
    }

    #[test]
    fn silent_on_known_vocabulary() {
        assert!(!run_one(&UnknownInstructions, "FROM scratch\nRUN true\n").hit);
    }
}
