//! ID.20013: the MAINTAINER instruction is deprecated; use a LABEL.

use std::sync::Arc;

use crate::checks::{label, level, scope, Check, CheckContext, CheckInfo, CheckResult};
use crate::error::CheckError;
use crate::parser::InstructionKind;

pub struct DeprecatedMaintainer;

static INFO: CheckInfo = CheckInfo {
    id: "ID.20013",
    name: "deprecated-maintainer",
    description: "MAINTAINER is deprecated in favor of LABEL maintainer=...",
    labels: &[
        (label::LEVEL, level::STYLE),
        (label::SCOPE, scope::INSTRUCTION),
    ],
};

impl Check for DeprecatedMaintainer {
    fn info(&self) -> &'static CheckInfo {
        &INFO
    }

    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError> {
        let mut result = CheckResult::new(&INFO);
        let maintainers = context
            .dockerfile
            .instructions_by_type
            .get(&InstructionKind::Maintainer)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for instr in maintainers {
            let stage = (instr.stage_id >= 0).then(|| instr.stage_id as usize);
            result.add_match(
                format!("MAINTAINER on line {} is deprecated", instr.start_line),
                stage,
                Some(Arc::clone(instr)),
            );
        }
        if result.hit {
            result.message = format!("{} MAINTAINER instructions", result.matches.len());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::run_one;

    #[test]
    fn hits_on_maintainer() {
        let result = run_one(&DeprecatedMaintainer, "FROM scratch\nMAINTAINER someone\n");
        assert!(result.hit);
        assert_eq!(result.matches[0].stage, Some(0));
    }

    #[test]
    fn label_form_is_fine() {
        assert!(!run_one(&DeprecatedMaintainer, "FROM scratch\nLABEL maintainer=someone\n").hit);
    }
}
