//! ID.20005: known instructions with malformed arguments.

use std::sync::Arc;

use crate::checks::{label, level, scope, Check, CheckContext, CheckInfo, CheckResult};
use crate::error::CheckError;

pub struct InvalidInstructions;

static INFO: CheckInfo = CheckInfo {
    id: "ID.20005",
    name: "invalid-instructions",
    description: "instructions with invalid arguments",
    labels: &[
        (label::LEVEL, level::ERROR),
        (label::SCOPE, scope::INSTRUCTION),
    ],
};

impl Check for InvalidInstructions {
    fn info(&self) -> &'static CheckInfo {
        &INFO
    }

    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError> {
        let mut result = CheckResult::new(&INFO);
        for instr in &context.dockerfile.invalid_instructions {
            let stage = (instr.stage_id >= 0).then(|| instr.stage_id as usize);
            result.add_match(
                format!(
                    "{} on line {}: {}",
                    instr.name,
                    instr.start_line,
                    instr.errors.join("; ")
                ),
                stage,
                Some(Arc::clone(instr)),
            );
        }
        if result.hit {
            result.message = format!("{} invalid instructions", result.matches.len());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::run_one;

    #[test]
    fn hits_on_bare_env() {
        let result = run_one(&InvalidInstructions, "FROM scratch\nENV\n");
        assert!(result.hit);
        assert!(!result.matches[0].message.is_empty());
    }

    #[test]
    fn hits_on_two_argument_from() {
        assert!(run_one(&InvalidInstructions, "FROM alpine extra\n").hit);
    }

    #[test]
    fn silent_on_well_formed_input() {
        assert!(!run_one(&InvalidInstructions, "FROM scratch\nRUN true\n").hit);
    }
}
