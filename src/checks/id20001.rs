//! ID.20001: the Dockerfile contains no instructions at all.

use crate::checks::{label, level, scope, Check, CheckContext, CheckInfo, CheckResult};
use crate::error::CheckError;

pub struct EmptyDockerfile;

static INFO: CheckInfo = CheckInfo {
    id: "ID.20001",
    name: "empty-dockerfile",
    description: "the Dockerfile contains no instructions",
    labels: &[
        (label::LEVEL, level::ERROR),
        (label::SCOPE, scope::DOCKERFILE),
    ],
};

impl Check for EmptyDockerfile {
    fn info(&self) -> &'static CheckInfo {
        &INFO
    }

    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError> {
        let mut result = CheckResult::new(&INFO);
        if context.dockerfile.all_instructions.is_empty() {
            result.add_match(
                format!("{} has no instructions", context.dockerfile.name),
                None,
                None,
            );
            result.message = INFO.description.to_string();
        }
        Ok(result)
    }
}
