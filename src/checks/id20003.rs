//! ID.20003: instructions appearing before the first FROM.
//!
//! Only ARG (and parser directives) may precede a stage; everything else in
//! that position is dead weight the builder rejects.

use std::sync::Arc;

use crate::checks::{label, level, scope, Check, CheckContext, CheckInfo, CheckResult};
use crate::error::CheckError;

pub struct StagelessInstructions;

static INFO: CheckInfo = CheckInfo {
    id: "ID.20003",
    name: "stageless-instructions",
    description: "instructions found before the first FROM",
    labels: &[
        (label::LEVEL, level::ERROR),
        (label::SCOPE, scope::DOCKERFILE),
    ],
};

impl Check for StagelessInstructions {
    fn info(&self) -> &'static CheckInfo {
        &INFO
    }

    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError> {
        let mut result = CheckResult::new(&INFO);
        for instr in &context.dockerfile.stageless_instructions {
            result.add_match(
                format!("{} on line {} precedes the first FROM", instr.name, instr.start_line),
                None,
                Some(Arc::clone(instr)),
            );
        }
        if result.hit {
            result.message = format!("{} instructions precede the first FROM", result.matches.len());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::run_one;

    #[test]
    fn hits_on_pre_from_run() {
        let result = run_one(&StagelessInstructions, "RUN echo hi\nFROM scratch\n");
        assert!(result.hit);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].instruction.as_ref().unwrap().start_line, 1);
    }

    #[test]
    fn pre_from_args_are_allowed() {
        assert!(!run_one(&StagelessInstructions, "ARG V=1\nFROM alpine:$V\n").hit);
    }
}
