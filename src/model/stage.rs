//! Build stages and resolved parent-image references.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::model::instruction::Instruction;
use crate::parser::InstructionKind;

/// The resolved base image of a stage.
///
/// When a FROM segment references an ARG (`FROM $IMG:latest`,
/// `FROM alpine:${V}`), the resolved value lands in `name`/`tag`/`digest` and
/// the backing ARG name in the matching `build_arg_*` field. Malformed
/// references (a present-but-empty segment) set the `has_empty_*` flags.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParentImage {
    pub name: String,
    pub tag: String,
    pub digest: String,
    /// ARG names backing each segment, when the segment was `$VAR`-form.
    pub build_arg_name: String,
    pub build_arg_tag: String,
    pub build_arg_digest: String,
    pub has_empty_name: bool,
    pub has_empty_tag: bool,
    pub has_empty_digest: bool,
    /// Back-reference (stage index) when the base resolves to an earlier
    /// named stage in the same file.
    pub parent_stage: Option<usize>,
}

/// A `FROM ... [AS name]` section and the instructions that follow it.
#[derive(Debug, Clone, Serialize)]
pub struct BuildStage {
    /// Dense index; `dockerfile.stages[i].index == i`.
    pub index: usize,
    /// The `AS` name, if any.
    pub name: Option<String>,
    pub parent: ParentImage,
    pub start_line: i32,
    pub end_line: i32,
    /// Every instruction in the stage, the FROM included.
    pub all_instructions: Vec<Arc<Instruction>>,
    /// Valid, non-ONBUILD instructions.
    pub current_instructions: Vec<Arc<Instruction>>,
    pub on_build_instructions: Vec<Arc<Instruction>>,
    pub unknown_instructions: Vec<Arc<Instruction>>,
    pub invalid_instructions: Vec<Arc<Instruction>>,
    pub current_instructions_by_type: HashMap<InstructionKind, Vec<Arc<Instruction>>>,
    /// Last write wins per key.
    pub env_vars: HashMap<String, String>,
    pub build_args: HashMap<String, String>,
    /// Global ARG values consumed by this stage's FROM reference.
    pub from_args: HashMap<String, String>,
    /// ARG names referenced by the FROM value but never declared.
    pub unknown_from_args: Vec<String>,
    /// Indexes of stages this stage depends on (FROM or COPY --from).
    pub stage_references: Vec<usize>,
    /// COPY --from values resolving to neither a stage index nor name.
    pub external_references: Vec<String>,
    /// Whether any later stage (or finality) consumes this stage.
    pub is_used: bool,
}

impl BuildStage {
    pub(crate) fn new(index: usize, start_line: i32) -> Self {
        BuildStage {
            index,
            name: None,
            parent: ParentImage::default(),
            start_line,
            end_line: start_line,
            all_instructions: Vec::new(),
            current_instructions: Vec::new(),
            on_build_instructions: Vec::new(),
            unknown_instructions: Vec::new(),
            invalid_instructions: Vec::new(),
            current_instructions_by_type: HashMap::new(),
            env_vars: HashMap::new(),
            build_args: HashMap::new(),
            from_args: HashMap::new(),
            unknown_from_args: Vec::new(),
            stage_references: Vec::new(),
            external_references: Vec::new(),
            is_used: false,
        }
    }

    /// Valid, non-ONBUILD instructions of one kind, in order.
    pub fn instructions_of(&self, kind: InstructionKind) -> &[Arc<Instruction>] {
        self.current_instructions_by_type
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn reference_stage(&mut self, index: usize) {
        if !self.stage_references.contains(&index) {
            self.stage_references.push(index);
        }
    }
}
