//! ID.20009: external base images pulled without a tag or digest.
//!
//! `scratch`, same-file stage parents, and references already flagged as
//! malformed or unresolvable are out of scope here.

use std::sync::Arc;

use crate::checks::{label, level, scope, Check, CheckContext, CheckInfo, CheckResult};
use crate::error::CheckError;

pub struct UntaggedImage;

static INFO: CheckInfo = CheckInfo {
    id: "ID.20009",
    name: "untagged-image",
    description: "a base image is referenced without a tag or digest",
    labels: &[(label::LEVEL, level::WARN), (label::SCOPE, scope::STAGE)],
};

impl Check for UntaggedImage {
    fn info(&self) -> &'static CheckInfo {
        &INFO
    }

    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError> {
        let mut result = CheckResult::new(&INFO);
        for stage in &context.dockerfile.stages {
            let parent = &stage.parent;
            if parent.parent_stage.is_some() || parent.name == "scratch" || parent.name.is_empty() {
                continue;
            }
            if parent.has_empty_name
                || parent.has_empty_tag
                || parent.has_empty_digest
                || !stage.unknown_from_args.is_empty()
            {
                continue;
            }
            if parent.tag.is_empty() && parent.digest.is_empty() {
                result.add_match(
                    format!(
                        "stage {} (line {}): image '{}' has no tag or digest",
                        stage.index, stage.start_line, parent.name
                    ),
                    Some(stage.index),
                    stage.all_instructions.first().map(Arc::clone),
                );
            }
        }
        if result.hit {
            result.message = format!("{} untagged base images", result.matches.len());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::run_one;

    #[test]
    fn hits_on_bare_image_name() {
        let result = run_one(&UntaggedImage, "FROM alpine\n");
        assert!(result.hit);
        assert!(result.matches[0].message.contains("alpine"));
    }

    #[test]
    fn scratch_and_stage_parents_are_exempt() {
        assert!(!run_one(&UntaggedImage, "FROM scratch\n").hit);
        assert!(!run_one(&UntaggedImage, "FROM a:1 AS base\nFROM base\n").hit);
    }

    #[test]
    fn tag_or_digest_satisfies() {
        assert!(!run_one(&UntaggedImage, "FROM alpine:3.19\n").hit);
        assert!(!run_one(&UntaggedImage, "FROM alpine@sha256:abc\n").hit);
    }

    #[test]
    fn unresolved_arg_is_not_reported_here() {
        assert!(!run_one(&UntaggedImage, "FROM $IMG\n").hit);
    }
}
