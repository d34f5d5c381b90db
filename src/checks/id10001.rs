//! ID.10001: the build context has no `.dockerignore`.
//!
//! Without one, the whole context (including VCS metadata and local build
//! artifacts) ships to the daemon and can leak into the image.

use crate::checks::{label, level, scope, Check, CheckContext, CheckInfo, CheckResult};
use crate::error::CheckError;

pub struct MissingDockerignore;

static INFO: CheckInfo = CheckInfo {
    id: "ID.10001",
    name: "missing-dockerignore",
    description: "no .dockerignore file found in the build context",
    labels: &[
        (label::LEVEL, level::WARN),
        (label::SCOPE, scope::DOCKERIGNORE),
    ],
};

impl Check for MissingDockerignore {
    fn info(&self) -> &'static CheckInfo {
        &INFO
    }

    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError> {
        let mut result = CheckResult::new(&INFO);
        if !context.dockerignore.exists {
            let location = if context.dockerignore.location.is_empty() {
                "the build context".to_string()
            } else {
                context.dockerignore.location.clone()
            };
            result.add_match(format!("no .dockerignore at {}", location), None, None);
            result.message = INFO.description.to_string();
        }
        Ok(result)
    }
}
