//! ID.20010: base images pinned to the floating `latest` tag.

use std::sync::Arc;

use crate::checks::{label, level, scope, Check, CheckContext, CheckInfo, CheckResult};
use crate::error::CheckError;

pub struct LatestTag;

static INFO: CheckInfo = CheckInfo {
    id: "ID.20010",
    name: "latest-tag",
    description: "a base image uses the 'latest' tag",
    labels: &[(label::LEVEL, level::WARN), (label::SCOPE, scope::STAGE)],
};

impl Check for LatestTag {
    fn info(&self) -> &'static CheckInfo {
        &INFO
    }

    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError> {
        let mut result = CheckResult::new(&INFO);
        for stage in &context.dockerfile.stages {
            let parent = &stage.parent;
            if parent.parent_stage.is_none() && parent.tag == "latest" {
                result.add_match(
                    format!(
                        "stage {} (line {}): image '{}' uses the floating 'latest' tag",
                        stage.index, stage.start_line, parent.name
                    ),
                    Some(stage.index),
                    stage.all_instructions.first().map(Arc::clone),
                );
            }
        }
        if result.hit {
            result.message = format!("{} 'latest' base images", result.matches.len());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::run_one;

    #[test]
    fn hits_on_explicit_latest() {
        assert!(run_one(&LatestTag, "FROM nginx:latest\n").hit);
    }

    #[test]
    fn hits_on_arg_resolved_latest() {
        assert!(run_one(&LatestTag, "ARG TAG=latest\nFROM nginx:$TAG\n").hit);
    }

    #[test]
    fn pinned_tags_are_fine() {
        assert!(!run_one(&LatestTag, "FROM nginx:1.25\n").hit);
        assert!(!run_one(&LatestTag, "FROM nginx\n").hit);
    }
}
