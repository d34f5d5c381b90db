//! ID.20015: shell-form CMD / ENTRYPOINT.
//!
//! Shell form wraps the command in `/bin/sh -c`, so the process does not run
//! as PID 1 and never sees SIGTERM directly.

use std::sync::Arc;

use crate::checks::{label, level, scope, Check, CheckContext, CheckInfo, CheckResult};
use crate::error::CheckError;
use crate::parser::InstructionKind;

pub struct ShellFormCmd;

static INFO: CheckInfo = CheckInfo {
    id: "ID.20015",
    name: "shell-form-cmd",
    description: "CMD or ENTRYPOINT uses shell form instead of exec form",
    labels: &[
        (label::LEVEL, level::STYLE),
        (label::SCOPE, scope::INSTRUCTION),
    ],
};

impl Check for ShellFormCmd {
    fn info(&self) -> &'static CheckInfo {
        &INFO
    }

    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError> {
        let mut result = CheckResult::new(&INFO);
        for kind in [InstructionKind::Cmd, InstructionKind::Entrypoint] {
            let instructions = context
                .dockerfile
                .instructions_by_type
                .get(&kind)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            for instr in instructions {
                if !instr.is_valid || instr.is_json_form {
                    continue;
                }
                let stage = (instr.stage_id >= 0).then(|| instr.stage_id as usize);
                result.add_match(
                    format!("{} on line {} uses shell form", instr.name, instr.start_line),
                    stage,
                    Some(Arc::clone(instr)),
                );
            }
        }
        if result.hit {
            result.message = format!("{} shell-form instructions", result.matches.len());
        }
        Ok(result)
    }
}
