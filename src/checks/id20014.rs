//! ID.20014: WORKDIR with a relative path.
//!
//! A relative WORKDIR composes with whatever came before it, which makes the
//! resulting location depend on the base image. Variable-led paths are left
//! alone since their value is unknowable here.

use std::sync::Arc;

use crate::checks::{label, level, scope, Check, CheckContext, CheckInfo, CheckResult};
use crate::error::CheckError;
use crate::parser::InstructionKind;

pub struct RelativeWorkdir;

static INFO: CheckInfo = CheckInfo {
    id: "ID.20014",
    name: "relative-workdir",
    description: "WORKDIR uses a relative path",
    labels: &[
        (label::LEVEL, level::WARN),
        (label::SCOPE, scope::INSTRUCTION),
    ],
};

fn is_absolute(path: &str) -> bool {
    if path.starts_with('/') || path.starts_with('$') {
        return true;
    }
    // Windows drive form, e.g. C:\app or C:/app.
    let bytes = path.as_bytes();
    bytes.len() > 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/')
}

impl Check for RelativeWorkdir {
    fn info(&self) -> &'static CheckInfo {
        &INFO
    }

    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError> {
        let mut result = CheckResult::new(&INFO);
        let workdirs = context
            .dockerfile
            .instructions_by_type
            .get(&InstructionKind::Workdir)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for instr in workdirs {
            if !instr.is_valid {
                continue;
            }
            let Some(path) = instr.args.first() else {
                continue;
            };
            if !is_absolute(path) {
                let stage = (instr.stage_id >= 0).then(|| instr.stage_id as usize);
                result.add_match(
                    format!("WORKDIR '{}' on line {} is relative", path, instr.start_line),
                    stage,
                    Some(Arc::clone(instr)),
                );
            }
        }
        if result.hit {
            result.message = format!("{} relative WORKDIR instructions", result.matches.len());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::run_one;

    #[test]
    fn hits_on_relative_path() {
        assert!(run_one(&RelativeWorkdir, "FROM scratch\nWORKDIR app\n").hit);
        assert!(run_one(&RelativeWorkdir, "FROM scratch\nWORKDIR ./app\n").hit);
    }

    #[test]
    fn absolute_and_variable_paths_are_fine() {
        assert!(!run_one(&RelativeWorkdir, "FROM scratch\nWORKDIR /app\n").hit);
        assert!(!run_one(&RelativeWorkdir, "FROM scratch\nWORKDIR $HOME\n").hit);
        assert!(!run_one(&RelativeWorkdir, "FROM scratch\nWORKDIR C:\\\\app\n").hit);
    }
}
