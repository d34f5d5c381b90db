//! ID.10002: the `.dockerignore` exists but excludes nothing.

use crate::checks::{label, level, scope, Check, CheckContext, CheckInfo, CheckResult};
use crate::error::CheckError;

pub struct EmptyDockerignore;

static INFO: CheckInfo = CheckInfo {
    id: "ID.10002",
    name: "empty-dockerignore",
    description: ".dockerignore contains no patterns",
    labels: &[
        (label::LEVEL, level::INFO),
        (label::SCOPE, scope::DOCKERIGNORE),
    ],
};

impl Check for EmptyDockerignore {
    fn info(&self) -> &'static CheckInfo {
        &INFO
    }

    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError> {
        let mut result = CheckResult::new(&INFO);
        let ignore = &context.dockerignore;
        if ignore.exists && ignore.patterns.is_empty() {
            result.add_match(
                format!("{} has no effective patterns", ignore.location),
                None,
                None,
            );
            result.message = INFO.description.to_string();
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::context_with_ignore;
    use crate::ignorefile::Dockerignore;

    #[test]
    fn hits_on_comment_only_file() {
        let ignore = Dockerignore::from_content(".dockerignore", "# nothing here\n\n");
        let context = context_with_ignore("FROM scratch\n", ignore);
        assert!(EmptyDockerignore.run(&context).unwrap().hit);
    }

    #[test]
    fn silent_when_missing_or_populated() {
        let context = context_with_ignore("FROM scratch\n", Dockerignore::missing());
        assert!(!EmptyDockerignore.run(&context).unwrap().hit);

        let ignore = Dockerignore::from_content(".dockerignore", "*.log\n");
        let context = context_with_ignore("FROM scratch\n", ignore);
        assert!(!EmptyDockerignore.run(&context).unwrap().hit);
    }
}
