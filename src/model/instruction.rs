//! Flattened public instruction records.

use serde::Serialize;

use crate::parser::{InstructionKind, Node};

/// One instruction of the public model, flattened from a top-level AST node.
///
/// An ONBUILD node substitutes its nested instruction's kind and args while
/// keeping the outer node's position and `is_on_build = true`.
#[derive(Debug, Clone, Serialize)]
pub struct Instruction {
    /// 0-based position in file order, across the whole Dockerfile.
    pub global_index: usize,
    /// 0-based position within the owning stage; -1 before any FROM.
    pub stage_index: i32,
    /// Index of the owning stage; -1 when stageless.
    pub stage_id: i32,
    /// Canonical upper-case instruction name.
    pub name: String,
    pub kind: InstructionKind,
    pub args: Vec<String>,
    pub flags: Vec<String>,
    pub args_raw: String,
    /// The physical lines this instruction occupied.
    pub raw_lines: Vec<String>,
    pub is_json_form: bool,
    pub is_on_build: bool,
    pub is_valid: bool,
    pub errors: Vec<String>,
    /// 1-based inclusive line span.
    pub start_line: i32,
    pub end_line: i32,
}

impl Instruction {
    /// Flatten a top-level AST node. ONBUILD substitutes the nested
    /// instruction's identity and arguments.
    pub(crate) fn from_node(node: &Node, global_index: usize) -> Self {
        let is_on_build = node.kind == InstructionKind::Onbuild;
        let effective = if is_on_build {
            node.children.first().unwrap_or(node)
        } else {
            node
        };

        let mut errors = node.errors.clone();
        if is_on_build {
            errors.extend(effective.errors.iter().cloned());
        }

        Instruction {
            global_index,
            stage_index: -1,
            stage_id: -1,
            name: effective.kind.as_str().to_string(),
            kind: effective.kind,
            args: effective.args.clone(),
            flags: effective.flags.clone(),
            args_raw: node.args_raw.clone(),
            raw_lines: node.original.lines().map(str::to_string).collect(),
            is_json_form: effective.is_json_form(),
            is_on_build,
            is_valid: node.is_valid,
            errors,
            start_line: node.start_line,
            end_line: node.end_line,
        }
    }

    /// The value of a leading `--name=value` flag, if present.
    pub fn flag_value(&self, name: &str) -> Option<&str> {
        let prefix = format!("--{}=", name);
        self.flags
            .iter()
            .find_map(|f| f.strip_prefix(prefix.as_str()))
    }
}
