//! ID.10003: the Dockerfile itself is excluded by `.dockerignore`.
//!
//! A build still works when the file is passed explicitly, but `COPY`ing the
//! Dockerfile or rebuilding from the context silently loses it.

use crate::checks::{label, level, scope, Check, CheckContext, CheckInfo, CheckResult};
use crate::error::CheckError;

pub struct DockerfileIgnored;

static INFO: CheckInfo = CheckInfo {
    id: "ID.10003",
    name: "dockerfile-ignored",
    description: "the Dockerfile is matched by a .dockerignore pattern",
    labels: &[
        (label::LEVEL, level::WARN),
        (label::SCOPE, scope::DOCKERIGNORE),
    ],
};

impl Check for DockerfileIgnored {
    fn info(&self) -> &'static CheckInfo {
        &INFO
    }

    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError> {
        let mut result = CheckResult::new(&INFO);
        let ignore = &context.dockerignore;
        if ignore.exists {
            let relative = context.dockerfile_relative_path();
            if ignore.matches(&relative) {
                result.add_match(
                    format!("{} is excluded by {}", relative, ignore.location),
                    None,
                    None,
                );
                result.message = INFO.description.to_string();
            }
        }
        Ok(result)
    }
}
