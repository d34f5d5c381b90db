//! Dockerfile tokenizer and raw AST builder.

pub mod instruction;
pub mod tokenizer;

pub use instruction::{InstructionKind, Node};
pub use tokenizer::{parse, parse_bytes, ParseOutcome, DEFAULT_ESCAPE, MAX_LINE_BYTES};
