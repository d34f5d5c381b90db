//! The semantic Dockerfile model and its single-pass builder.
//!
//! `Dockerfile::build` walks the raw AST once, in file order, reconstructing
//! build stages, resolving FROM references (including ARG-substituted image
//! refs and same-file parent stages), COPY `--from` cross-references, and
//! bucketing every instruction globally and per stage. The model is built
//! once and never mutated afterwards; checks only read it.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{ModelError, ParseError};
use crate::model::instruction::Instruction;
use crate::model::stage::{BuildStage, ParentImage};
use crate::parser::{self, InstructionKind, ParseOutcome};

/// The frozen semantic model of one Dockerfile.
#[derive(Debug, Clone, Serialize)]
pub struct Dockerfile {
    pub name: String,
    pub location: String,
    /// Physical lines, in order.
    pub lines: Vec<String>,
    /// ARGs declared before any stage, name → default value ("" when none).
    pub from_args: HashMap<String, String>,
    /// Ordered stages; `stages[i].index == i`.
    pub stages: Vec<BuildStage>,
    /// Stage name → index of the first stage declared with that name.
    pub stages_by_name: HashMap<String, usize>,
    /// Non-ARG instructions appearing before the first FROM.
    pub stageless_instructions: Vec<Arc<Instruction>>,
    /// Every ARG instruction, global or in-stage.
    pub arg_instructions: Vec<Arc<Instruction>>,
    pub all_instructions: Vec<Arc<Instruction>>,
    pub instructions_by_type: HashMap<InstructionKind, Vec<Arc<Instruction>>>,
    pub unknown_instructions: Vec<Arc<Instruction>>,
    pub invalid_instructions: Vec<Arc<Instruction>>,
    /// Tokenizer warnings (blank continuations, empty file).
    pub warnings: Vec<String>,
}

impl Dockerfile {
    /// Parse and model a Dockerfile on disk.
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        let file = std::fs::File::open(path).map_err(ParseError::Io)?;
        let outcome = parser::parse(file)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Dockerfile".to_string());
        Self::build(outcome, name, path.to_string_lossy().into_owned())
    }

    /// Parse and model a Dockerfile from any reader.
    pub fn from_reader<R: Read>(reader: R, name: impl Into<String>) -> Result<Self, ModelError> {
        let outcome = parser::parse(reader)?;
        let name = name.into();
        let location = name.clone();
        Self::build(outcome, name, location)
    }

    /// Build the model from a tokenized AST. Fails only on an invalid root;
    /// instruction-local problems are bucketed, never fatal.
    pub fn build(
        outcome: ParseOutcome,
        name: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<Self, ModelError> {
        if !outcome.root.is_valid {
            return Err(ModelError::InvalidRoot);
        }

        let mut df = Dockerfile {
            name: name.into(),
            location: location.into(),
            lines: outcome.lines,
            from_args: HashMap::new(),
            stages: Vec::new(),
            stages_by_name: HashMap::new(),
            stageless_instructions: Vec::new(),
            arg_instructions: Vec::new(),
            all_instructions: Vec::new(),
            instructions_by_type: HashMap::new(),
            unknown_instructions: Vec::new(),
            invalid_instructions: Vec::new(),
            warnings: outcome.warnings,
        };

        for (global_index, node) in outcome.root.children.iter().enumerate() {
            let mut instr = Instruction::from_node(node, global_index);

            if node.kind == InstructionKind::From && node.is_valid {
                df.open_stage(node.start_line, &instr);
            }

            if let Some(stage) = df.stages.last() {
                instr.stage_id = stage.index as i32;
                instr.stage_index = stage.all_instructions.len() as i32;
            }
            let instr = Arc::new(instr);

            df.all_instructions.push(Arc::clone(&instr));
            df.instructions_by_type
                .entry(instr.kind)
                .or_default()
                .push(Arc::clone(&instr));
            if instr.kind == InstructionKind::Arg {
                df.arg_instructions.push(Arc::clone(&instr));
            }
            if node.kind == InstructionKind::Unknown {
                df.unknown_instructions.push(Arc::clone(&instr));
            } else if !instr.is_valid {
                df.invalid_instructions.push(Arc::clone(&instr));
            }

            if df.stages.is_empty() {
                // Before any FROM: ARGs feed the global FromArgs table, any
                // other instruction is stageless (reported by a check).
                if instr.kind == InstructionKind::Arg && instr.is_valid {
                    for token in &instr.args {
                        let (key, value) = split_assignment(token);
                        df.from_args.insert(key.to_string(), value.to_string());
                    }
                } else {
                    df.stageless_instructions.push(Arc::clone(&instr));
                }
                continue;
            }

            df.bucket_into_stage(node, instr);
        }

        if let Some(last) = df.stages.last_mut() {
            last.is_used = true;
        }

        log::debug!(
            "modeled {}: {} stages, {} instructions",
            df.name,
            df.stages.len(),
            df.all_instructions.len()
        );

        Ok(df)
    }

    /// The final stage, when any stage exists.
    pub fn last_stage(&self) -> Option<&BuildStage> {
        self.stages.last()
    }

    /// Open a new stage for a valid FROM instruction.
    fn open_stage(&mut self, start_line: i32, instr: &Instruction) {
        let index = self.stages.len();
        let mut stage = BuildStage::new(index, start_line);

        let image_ref = instr.args.first().map(String::as_str).unwrap_or("");
        resolve_parent_image(&mut stage, image_ref, &self.from_args);

        // Same-file parent: resolves against already-declared stages only.
        if let Some(&parent_index) = self.stages_by_name.get(&stage.parent.name) {
            stage.parent.parent_stage = Some(parent_index);
            stage.reference_stage(parent_index);
            self.stages[parent_index].is_used = true;
        }

        if instr.args.len() == 3 {
            let stage_name = instr.args[2].clone();
            stage.name = Some(stage_name.clone());
            // First declaration wins; duplicates are a check's concern.
            self.stages_by_name.entry(stage_name).or_insert(index);
        }

        self.stages.push(stage);
    }

    /// Bucket an instruction into the currently open (last) stage.
    fn bucket_into_stage(&mut self, node: &crate::parser::Node, instr: Arc<Instruction>) {
        // COPY --from resolution needs immutable access to earlier stages;
        // compute the decision before mutating.
        let mut copy_reference: Option<CopyFrom> = None;
        if instr.kind == InstructionKind::Copy {
            if let Some(value) = instr.flag_value("from") {
                copy_reference = Some(self.resolve_copy_from(value));
            }
        }

        let current = self.stages.len() - 1;
        if let Some(CopyFrom::Stage(referenced)) = copy_reference {
            self.stages[referenced].is_used = true;
        }

        let stage = &mut self.stages[current];
        stage.end_line = stage.end_line.max(instr.end_line);
        stage.all_instructions.push(Arc::clone(&instr));

        match copy_reference {
            Some(CopyFrom::Stage(referenced)) => stage.reference_stage(referenced),
            Some(CopyFrom::External(value)) => stage.external_references.push(value),
            None => {}
        }

        if node.kind == InstructionKind::Unknown {
            stage.unknown_instructions.push(instr);
            return;
        }
        if !instr.is_valid {
            stage.invalid_instructions.push(instr);
            return;
        }
        if instr.is_on_build {
            stage.on_build_instructions.push(instr);
            return;
        }

        match instr.kind {
            InstructionKind::Env => {
                for pair in instr.args.chunks(2) {
                    if let [key, value] = pair {
                        stage.env_vars.insert(key.clone(), value.clone());
                    }
                }
            }
            InstructionKind::Arg => {
                for token in &instr.args {
                    let (key, value) = split_assignment(token);
                    stage.build_args.insert(key.to_string(), value.to_string());
                }
            }
            _ => {}
        }

        stage
            .current_instructions_by_type
            .entry(instr.kind)
            .or_default()
            .push(Arc::clone(&instr));
        stage.current_instructions.push(instr);
    }

    /// Resolve a COPY --from value: stage index, then stage name, then
    /// external reference. No network or registry validation happens here.
    fn resolve_copy_from(&self, value: &str) -> CopyFrom {
        if let Ok(index) = value.parse::<usize>() {
            if index < self.stages.len() {
                return CopyFrom::Stage(index);
            }
        } else if let Some(&index) = self.stages_by_name.get(value) {
            return CopyFrom::Stage(index);
        }
        CopyFrom::External(value.to_string())
    }
}

enum CopyFrom {
    Stage(usize),
    External(String),
}

/// Split the image reference on the first `:` (tag) or `@` (digest) and
/// resolve `$VAR`/`${VAR}` segments against the global ARG table.
fn resolve_parent_image(stage: &mut BuildStage, image_ref: &str, global_args: &HashMap<String, String>) {
    let (name_part, rest) = split_reference(image_ref);

    let parent = &mut stage.parent;
    if let Some(var) = arg_reference(name_part) {
        parent.build_arg_name = var.to_string();
        match global_args.get(var) {
            Some(value) => {
                stage.from_args.insert(var.to_string(), value.clone());
                // A resolved value may itself carry a tag or digest.
                if rest.is_none() && (value.contains(':') || value.contains('@')) {
                    let (inner_name, inner_rest) = split_reference(value);
                    parent.name = inner_name.to_string();
                    assign_rest(parent, inner_rest);
                } else {
                    parent.name = value.clone();
                }
                parent.has_empty_name = parent.name.is_empty();
            }
            None => stage.unknown_from_args.push(var.to_string()),
        }
    } else {
        parent.name = name_part.to_string();
        parent.has_empty_name = name_part.is_empty() && !image_ref.is_empty();
    }

    if let Some((separator, segment)) = rest {
        let (value, build_arg, unknown) = resolve_segment(segment, global_args);
        if let Some(var) = &unknown {
            stage.unknown_from_args.push(var.clone());
        }
        if let (Some(var), Some(value)) = (&build_arg, &value) {
            stage.from_args.insert(var.clone(), value.clone());
        }
        let resolved = value.unwrap_or_default();
        match separator {
            ':' => {
                parent.tag = resolved;
                parent.build_arg_tag = build_arg.unwrap_or_default();
                parent.has_empty_tag = parent.tag.is_empty() && unknown.is_none();
            }
            _ => {
                parent.digest = resolved;
                parent.build_arg_digest = build_arg.unwrap_or_default();
                parent.has_empty_digest = parent.digest.is_empty() && unknown.is_none();
            }
        }
    }
}

/// Resolve one tag/digest segment, which may be a `$VAR` reference.
/// Returns (resolved value, backing ARG name, unresolved ARG name).
fn resolve_segment(
    segment: &str,
    global_args: &HashMap<String, String>,
) -> (Option<String>, Option<String>, Option<String>) {
    match arg_reference(segment) {
        Some(var) => match global_args.get(var) {
            Some(value) => (Some(value.clone()), Some(var.to_string()), None),
            None => (None, None, Some(var.to_string())),
        },
        None => (Some(segment.to_string()), None, None),
    }
}

/// Split on the earliest of `:` and `@`; exactly one applies.
fn split_reference(image_ref: &str) -> (&str, Option<(char, &str)>) {
    match image_ref.find([':', '@']) {
        Some(pos) => {
            let separator = image_ref.as_bytes()[pos] as char;
            (&image_ref[..pos], Some((separator, &image_ref[pos + 1..])))
        }
        None => (image_ref, None),
    }
}

fn assign_rest(parent: &mut ParentImage, rest: Option<(char, &str)>) {
    if let Some((separator, segment)) = rest {
        match separator {
            ':' => {
                parent.tag = segment.to_string();
                parent.has_empty_tag = segment.is_empty();
            }
            _ => {
                parent.digest = segment.to_string();
                parent.has_empty_digest = segment.is_empty();
            }
        }
    }
}

/// `$VAR` / `${VAR}` → `VAR`.
fn arg_reference(segment: &str) -> Option<&str> {
    let s = segment.strip_prefix('$')?;
    let s = match s.strip_prefix('{') {
        Some(inner) => inner.strip_suffix('}').unwrap_or(inner),
        None => s,
    };
    Some(s)
}

fn split_assignment(token: &str) -> (&str, &str) {
    match token.split_once('=') {
        Some((key, value)) => (key, value),
        None => (token, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(content: &str) -> Dockerfile {
        let outcome = parser::parse_bytes(content.as_bytes()).unwrap();
        Dockerfile::build(outcome, "Dockerfile", "Dockerfile").unwrap()
    }

    #[test]
    fn single_stage_from_scratch() {
        let df = model("FROM scratch\n");
        assert_eq!(df.stages.len(), 1);
        assert_eq!(df.stages[0].parent.name, "scratch");
        assert!(df.stages[0].parent.tag.is_empty());
        assert!(df.stages[0].is_used);
    }

    #[test]
    fn stage_count_matches_valid_from_instructions() {
        let df = model("FROM a:1\nRUN x\nFROM b:2\nFROM c d e f\n");
        // The last FROM is shape-invalid and opens no stage.
        assert_eq!(df.stages.len(), 2);
        assert_eq!(df.invalid_instructions.len(), 1);
    }

    #[test]
    fn stage_indexes_are_dense_and_consistent() {
        let df = model("FROM a:1 AS one\nRUN x\nFROM b:2 AS two\nRUN y\nRUN z\n");
        for (i, stage) in df.stages.iter().enumerate() {
            assert_eq!(stage.index, i);
            for (j, instr) in stage.all_instructions.iter().enumerate() {
                assert_eq!(instr.stage_id, i as i32);
                assert_eq!(instr.stage_index, j as i32);
            }
        }
        assert_eq!(df.stages[1].all_instructions.len(), 3);
    }

    #[test]
    fn global_arg_resolves_from_tag() {
        let df = model("ARG V=1.0\nFROM alpine:${V}\n");
        let parent = &df.stages[0].parent;
        assert_eq!(parent.name, "alpine");
        assert_eq!(parent.tag, "1.0");
        assert_eq!(parent.build_arg_tag, "V");
        assert_eq!(df.stages[0].from_args.get("V").map(String::as_str), Some("1.0"));
        assert!(df.stages[0].unknown_from_args.is_empty());
    }

    #[test]
    fn missing_arg_lands_in_unknown_from_args() {
        let df = model("FROM alpine:${MISSING}\n");
        let stage = &df.stages[0];
        assert!(stage.parent.tag.is_empty());
        assert_eq!(stage.unknown_from_args, vec!["MISSING"]);
        assert!(!stage.parent.has_empty_tag);
    }

    #[test]
    fn arg_backed_name_is_resplit() {
        let df = model("ARG IMG=alpine:3.19\nFROM $IMG\n");
        let parent = &df.stages[0].parent;
        assert_eq!(parent.name, "alpine");
        assert_eq!(parent.tag, "3.19");
        assert_eq!(parent.build_arg_name, "IMG");
    }

    #[test]
    fn digest_reference() {
        let df = model("FROM alpine@sha256:abcdef\n");
        let parent = &df.stages[0].parent;
        assert_eq!(parent.name, "alpine");
        assert_eq!(parent.digest, "sha256:abcdef");
        assert!(parent.tag.is_empty());
    }

    #[test]
    fn empty_tag_sets_flag() {
        let df = model("FROM alpine:\n");
        assert!(df.stages[0].parent.has_empty_tag);
    }

    #[test]
    fn empty_name_sets_flag() {
        let df = model("FROM :3.19\n");
        assert!(df.stages[0].parent.has_empty_name);
    }

    #[test]
    fn named_stage_parent_resolution_is_backward_only() {
        let df = model("FROM alpine:3.19 AS base\nFROM base AS app\nRUN x\n");
        assert_eq!(df.stages[1].parent.parent_stage, Some(0));
        assert!(df.stages[0].is_used);
        assert_eq!(df.stages[1].stage_references, vec![0]);

        // Forward references do not resolve.
        let df = model("FROM later AS first\nFROM alpine:3.19 AS later\n");
        assert_eq!(df.stages[0].parent.parent_stage, None);
    }

    #[test]
    fn copy_from_stage_name() {
        let df = model(
            "FROM alpine:3.19 AS base\nFROM golang:1.22 AS build\nRUN make\nFROM scratch\nCOPY --from=build /x /y\n",
        );
        let last = df.last_stage().unwrap();
        assert_eq!(last.stage_references, vec![1]);
        assert!(df.stages[1].is_used);
        assert!(last.external_references.is_empty());
    }

    #[test]
    fn copy_from_index() {
        let df = model("FROM a:1\nFROM b:2\nCOPY --from=0 /x /y\n");
        assert!(df.stages[0].is_used);
        assert_eq!(df.stages[1].stage_references, vec![0]);
    }

    #[test]
    fn copy_from_external_reference() {
        let df = model("FROM scratch\nCOPY --from=nginx:latest /x /y\n");
        assert_eq!(df.stages[0].external_references, vec!["nginx:latest"]);
        assert!(df.stages[0].stage_references.is_empty());
    }

    #[test]
    fn out_of_range_index_is_external() {
        let df = model("FROM scratch\nCOPY --from=7 /x /y\n");
        assert_eq!(df.stages[0].external_references, vec!["7"]);
    }

    #[test]
    fn env_and_arg_folding_last_write_wins() {
        let df = model("FROM alpine:3.19\nENV A=1 B=2\nENV A=3\nARG X=old\nARG X=new\n");
        let stage = &df.stages[0];
        assert_eq!(stage.env_vars.get("A").map(String::as_str), Some("3"));
        assert_eq!(stage.env_vars.get("B").map(String::as_str), Some("2"));
        assert_eq!(stage.build_args.get("X").map(String::as_str), Some("new"));
    }

    #[test]
    fn invalid_instructions_do_not_fold() {
        let df = model("FROM alpine:3.19\nENV\n");
        let stage = &df.stages[0];
        assert!(stage.env_vars.is_empty());
        assert_eq!(stage.invalid_instructions.len(), 1);
    }

    #[test]
    fn pre_from_args_are_global_others_stageless() {
        let df = model("ARG V=1\nRUN echo early\nFROM alpine:3.19\n");
        assert_eq!(df.from_args.get("V").map(String::as_str), Some("1"));
        assert_eq!(df.stageless_instructions.len(), 1);
        assert_eq!(df.stageless_instructions[0].stage_id, -1);
        assert_eq!(df.stageless_instructions[0].stage_index, -1);
    }

    #[test]
    fn unknown_instructions_bucket_globally_and_per_stage() {
        let df = model("FROM alpine:3.19\nFROBNICATE all the things\n");
        assert_eq!(df.unknown_instructions.len(), 1);
        assert_eq!(df.stages[0].unknown_instructions.len(), 1);
        assert!(df.stages[0].current_instructions.iter().all(|i| i.is_valid));
    }

    #[test]
    fn onbuild_buckets_separately() {
        let df = model("FROM alpine:3.19\nONBUILD RUN make\nRUN true\n");
        let stage = &df.stages[0];
        assert_eq!(stage.on_build_instructions.len(), 1);
        assert_eq!(stage.on_build_instructions[0].kind, InstructionKind::Run);
        assert!(stage.on_build_instructions[0].is_on_build);
        // ONBUILD contents do not count as current instructions.
        assert_eq!(stage.instructions_of(InstructionKind::Run).len(), 1);
    }

    #[test]
    fn duplicate_stage_names_first_wins() {
        let df = model("FROM a:1 AS dup\nFROM b:2 AS dup\nFROM dup\n");
        assert_eq!(df.stages_by_name.get("dup"), Some(&0));
        assert_eq!(df.stages[2].parent.parent_stage, Some(0));
    }

    #[test]
    fn idempotent_reparse() {
        let content = "ARG V=1\nFROM alpine:${V} AS base\nRUN echo a \\\n  && echo b\nFROM base\nCOPY --from=0 /x /y\n";
        let a = model(content);
        let b = model(content);
        assert_eq!(a.stages.len(), b.stages.len());
        for (sa, sb) in a.stages.iter().zip(&b.stages) {
            assert_eq!(sa.all_instructions.len(), sb.all_instructions.len());
        }
        let ga: Vec<usize> = a.all_instructions.iter().map(|i| i.global_index).collect();
        let gb: Vec<usize> = b.all_instructions.iter().map(|i| i.global_index).collect();
        assert_eq!(ga, gb);
    }

    #[test]
    fn last_stage_is_always_used() {
        let df = model("FROM a:1 AS unused\nFROM b:2\n");
        assert!(!df.stages[0].is_used);
        assert!(df.stages[1].is_used);
    }
}
