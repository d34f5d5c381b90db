//! ID.20006: two stages declared with the same `AS` name.
//!
//! References resolve to the first declaration, so the later one is
//! unreachable by name.

use std::collections::HashMap;
use std::sync::Arc;

use crate::checks::{label, level, scope, Check, CheckContext, CheckInfo, CheckResult};
use crate::error::CheckError;

pub struct DuplicateStageNames;

static INFO: CheckInfo = CheckInfo {
    id: "ID.20006",
    name: "duplicate-stage-names",
    description: "multiple stages share the same name",
    labels: &[(label::LEVEL, level::ERROR), (label::SCOPE, scope::STAGE)],
};

impl Check for DuplicateStageNames {
    fn info(&self) -> &'static CheckInfo {
        &INFO
    }

    fn run(&self, context: &CheckContext) -> Result<CheckResult, CheckError> {
        let mut result = CheckResult::new(&INFO);
        let mut first_seen: HashMap<&str, usize> = HashMap::new();
        for stage in &context.dockerfile.stages {
            let Some(name) = stage.name.as_deref() else {
                continue;
            };
            match first_seen.get(name) {
                Some(&original) => {
                    result.add_match(
                        format!(
                            "stage {} (line {}) reuses name '{}' first declared by stage {}",
                            stage.index, stage.start_line, name, original
                        ),
                        Some(stage.index),
                        stage.all_instructions.first().map(Arc::clone),
                    );
                }
                None => {
                    first_seen.insert(name, stage.index);
                }
            }
        }
        if result.hit {
            result.message = format!("{} duplicate stage names", result.matches.len());
        }
        Ok(result)
    }
}
