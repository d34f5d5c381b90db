//! Raw AST nodes and per-instruction argument parsing.
//!
//! Each continuation-merged logical line becomes exactly one [`Node`]. The
//! keyword selects an argument shape via an exhaustive match on
//! [`InstructionKind`]; unknown keywords fall back to a pass-through parse and
//! are flagged invalid. Argument-shape problems are recoverable: they are
//! recorded in `Node::errors` and never abort tokenization.

use std::collections::BTreeMap;

use nom::{
    character::complete::{char, space0},
    multi::separated_list0,
    sequence::tuple,
    IResult,
};
use serde::Serialize;

/// The fixed, case-insensitive Dockerfile instruction vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionKind {
    Add,
    Arg,
    Cmd,
    Copy,
    Entrypoint,
    Env,
    Expose,
    From,
    Healthcheck,
    Label,
    Maintainer,
    Onbuild,
    Run,
    Shell,
    Stopsignal,
    User,
    Volume,
    Workdir,
    /// Anything outside the known vocabulary.
    Unknown,
}

impl InstructionKind {
    /// Look up a keyword (any case). Unrecognized keywords map to `Unknown`.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_lowercase().as_str() {
            "add" => Self::Add,
            "arg" => Self::Arg,
            "cmd" => Self::Cmd,
            "copy" => Self::Copy,
            "entrypoint" => Self::Entrypoint,
            "env" => Self::Env,
            "expose" => Self::Expose,
            "from" => Self::From,
            "healthcheck" => Self::Healthcheck,
            "label" => Self::Label,
            "maintainer" => Self::Maintainer,
            "onbuild" => Self::Onbuild,
            "run" => Self::Run,
            "shell" => Self::Shell,
            "stopsignal" => Self::Stopsignal,
            "user" => Self::User,
            "volume" => Self::Volume,
            "workdir" => Self::Workdir,
            _ => Self::Unknown,
        }
    }

    /// Canonical upper-case instruction name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Arg => "ARG",
            Self::Cmd => "CMD",
            Self::Copy => "COPY",
            Self::Entrypoint => "ENTRYPOINT",
            Self::Env => "ENV",
            Self::Expose => "EXPOSE",
            Self::From => "FROM",
            Self::Healthcheck => "HEALTHCHECK",
            Self::Label => "LABEL",
            Self::Maintainer => "MAINTAINER",
            Self::Onbuild => "ONBUILD",
            Self::Run => "RUN",
            Self::Shell => "SHELL",
            Self::Stopsignal => "STOPSIGNAL",
            Self::User => "USER",
            Self::Volume => "VOLUME",
            Self::Workdir => "WORKDIR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// A raw AST node for one instruction.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    /// Lower-cased keyword as written (kept even for unknown instructions).
    pub value: String,
    /// Resolved instruction kind.
    pub kind: InstructionKind,
    /// Everything after the keyword, verbatim (flags included).
    pub args_raw: String,
    /// Parsed, ordered argument tokens.
    pub args: Vec<String>,
    /// Leading `--flag[=value]` tokens, verbatim and uninterpreted.
    pub flags: Vec<String>,
    /// Nested instruction for ONBUILD.
    pub children: Vec<Node>,
    /// Form attributes, e.g. `json` for exec-form arguments.
    pub attributes: BTreeMap<String, bool>,
    /// False iff `errors` is non-empty or the keyword is unknown.
    pub is_valid: bool,
    /// Recoverable, instruction-local errors.
    pub errors: Vec<String>,
    /// The original physical text (continuation lines joined with newlines).
    pub original: String,
    /// 1-based inclusive start line; -1 sentinel on the empty root.
    pub start_line: i32,
    /// 1-based inclusive end line.
    pub end_line: i32,
}

impl Node {
    /// The empty document root. Children are the top-level instructions.
    pub fn root() -> Self {
        Node {
            value: String::new(),
            kind: InstructionKind::Unknown,
            args_raw: String::new(),
            args: Vec::new(),
            flags: Vec::new(),
            children: Vec::new(),
            attributes: BTreeMap::new(),
            is_valid: true,
            errors: Vec::new(),
            original: String::new(),
            start_line: -1,
            end_line: -1,
        }
    }

    /// Whether the exec-form ("json") attribute is set.
    pub fn is_json_form(&self) -> bool {
        self.attributes.get("json").copied().unwrap_or(false)
    }

    fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.is_valid = false;
    }
}

/// Parse one continuation-merged logical line into a [`Node`].
pub(crate) fn parse_line(merged: &str, start_line: i32, end_line: i32, original: &str) -> Node {
    let trimmed = merged.trim();
    let (keyword, rest) = match trimmed.find(char::is_whitespace) {
        Some(pos) => (&trimmed[..pos], trimmed[pos..].trim_start()),
        None => (trimmed, ""),
    };

    let kind = InstructionKind::from_keyword(keyword);
    let (flags, body) = split_flags(rest);

    let mut node = Node {
        value: keyword.to_ascii_lowercase(),
        kind,
        args_raw: rest.to_string(),
        args: Vec::new(),
        flags,
        children: Vec::new(),
        attributes: BTreeMap::new(),
        is_valid: true,
        errors: Vec::new(),
        original: original.to_string(),
        start_line,
        end_line,
    };

    match kind {
        InstructionKind::Add | InstructionKind::Copy => {
            parse_string_list(&mut node, body);
            if node.errors.is_empty() && node.args.len() < 2 {
                node.push_error(format!("{} requires at least two arguments", kind.as_str()));
            }
        }
        InstructionKind::Volume => {
            parse_string_list(&mut node, body);
            if node.errors.is_empty() && node.args.is_empty() {
                node.push_error("VOLUME requires at least one argument");
            }
        }
        InstructionKind::Cmd
        | InstructionKind::Entrypoint
        | InstructionKind::Run
        | InstructionKind::Shell => {
            parse_command(&mut node, body);
        }
        InstructionKind::Arg => {
            parse_name_values(&mut node, body);
        }
        InstructionKind::Env => {
            parse_pairs(&mut node, body, "ENV");
        }
        InstructionKind::Label => {
            parse_pairs(&mut node, body, "LABEL");
        }
        InstructionKind::Expose | InstructionKind::From => {
            node.args = body.split_whitespace().map(str::to_string).collect();
            if node.args.is_empty() {
                node.push_error(format!("{} requires at least one argument", kind.as_str()));
            } else if kind == InstructionKind::From {
                validate_from_shape(&mut node);
            }
        }
        InstructionKind::Healthcheck => {
            parse_healthcheck(&mut node, body);
        }
        InstructionKind::Maintainer
        | InstructionKind::Stopsignal
        | InstructionKind::User
        | InstructionKind::Workdir => {
            if body.is_empty() {
                node.push_error(format!("{} requires exactly one argument", kind.as_str()));
            } else {
                node.args.push(body.to_string());
            }
        }
        InstructionKind::Onbuild => {
            parse_onbuild(&mut node, rest, start_line, end_line);
        }
        InstructionKind::Unknown => {
            node.args = body.split_whitespace().map(str::to_string).collect();
            node.push_error(format!("unknown instruction: {}", keyword.to_ascii_uppercase()));
        }
    }

    node
}

/// Strip leading `--flag[=value]` tokens, preserved verbatim.
fn split_flags(rest: &str) -> (Vec<String>, &str) {
    let mut flags = Vec::new();
    let mut body = rest.trim_start();
    while body.starts_with("--") {
        let end = body.find(char::is_whitespace).unwrap_or(body.len());
        flags.push(body[..end].to_string());
        body = body[end..].trim_start();
    }
    (flags, body)
}

/// JSON-array-or-bare-token list (ADD/COPY/VOLUME). Malformed brackets are an error.
fn parse_string_list(node: &mut Node, body: &str) {
    if body.trim_start().starts_with('[') {
        match parse_json_array(body.trim()) {
            Ok((leftover, items)) if leftover.trim().is_empty() => {
                node.args = items;
                node.attributes.insert("json".to_string(), true);
            }
            _ => node.push_error(format!(
                "malformed JSON array in {} arguments",
                node.kind.as_str()
            )),
        }
    } else {
        node.args = body.split_whitespace().map(str::to_string).collect();
    }
}

/// JSON-or-shell string (CMD/ENTRYPOINT/SHELL/RUN). Exec form sets the
/// `json` attribute; anything that fails the JSON parse is shell form.
fn parse_command(node: &mut Node, body: &str) {
    let trimmed = body.trim();
    if trimmed.starts_with('[') {
        if let Ok((leftover, items)) = parse_json_array(trimmed) {
            if leftover.trim().is_empty() {
                node.args = items;
                node.attributes.insert("json".to_string(), true);
                return;
            }
        }
    }
    if !trimmed.is_empty() {
        node.args.push(trimmed.to_string());
    }
}

/// name or name=value tokens (ARG). Values may be quoted.
fn parse_name_values(node: &mut Node, body: &str) {
    if body.is_empty() {
        node.push_error("ARG requires at least one argument");
        return;
    }
    let mut rest = body.trim_start();
    while !rest.is_empty() {
        match next_name_value(rest) {
            Ok((r, token)) => {
                node.args.push(token);
                rest = r.trim_start();
            }
            Err(message) => {
                node.push_error(message);
                return;
            }
        }
    }
}

fn next_name_value(input: &str) -> Result<(&str, String), String> {
    let name_end = input
        .find(|c: char| c == '=' || c.is_whitespace())
        .unwrap_or(input.len());
    if name_end == 0 {
        return Err(format!("malformed name near '{}'", truncate(input)));
    }
    let name = &input[..name_end];
    let rest = &input[name_end..];
    if let Some(rest) = rest.strip_prefix('=') {
        let (rest, value) = parse_value(rest)
            .map_err(|_| format!("malformed value for '{}'", name))?;
        Ok((rest, format!("{}={}", name, value)))
    } else {
        Ok((rest, name.to_string()))
    }
}

/// `K=V` pairs with quoted-value support, or the legacy single `K V` pair.
/// Docker accepts the old space-separated form for both ENV and LABEL, so
/// both take it here. Parsed pairs are flattened into `args` as key, value, ...
fn parse_pairs(node: &mut Node, body: &str, name: &str) {
    if body.is_empty() {
        node.push_error(format!("{} requires at least one argument", name));
        return;
    }

    let first_token_end = body.find(char::is_whitespace).unwrap_or(body.len());
    if !body[..first_token_end].contains('=') {
        // Legacy form: single key with the remainder of the line as value.
        let key = &body[..first_token_end];
        let value = body[first_token_end..].trim();
        if value.is_empty() {
            node.push_error(format!("{} requires at least two arguments", name));
            return;
        }
        node.args.push(key.to_string());
        node.args.push(value.to_string());
        return;
    }

    let mut rest = body.trim_start();
    while !rest.is_empty() {
        match next_pair(rest) {
            Ok((r, key, value)) => {
                node.args.push(key);
                node.args.push(value);
                rest = r.trim_start();
            }
            Err(message) => {
                node.push_error(format!("{}: {}", name, message));
                return;
            }
        }
    }
}

fn next_pair(input: &str) -> Result<(&str, String, String), String> {
    let key_end = input
        .find(|c: char| c == '=' || c.is_whitespace())
        .unwrap_or(input.len());
    let key = &input[..key_end];
    let rest = &input[key_end..];
    let rest = rest
        .strip_prefix('=')
        .ok_or_else(|| format!("expected '=' after '{}'", truncate(key)))?;
    let (rest, value) =
        parse_value(rest).map_err(|_| format!("malformed value for '{}'", key))?;
    Ok((rest, key.to_string(), value))
}

/// A possibly-quoted value: a JSON-style double-quoted string or a bare token.
fn parse_value(input: &str) -> IResult<&str, String> {
    if input.starts_with('"') {
        parse_json_string(input)
    } else {
        let end = input
            .find(char::is_whitespace)
            .unwrap_or(input.len());
        Ok((&input[end..], input[..end].to_string()))
    }
}

/// Structured HEALTHCHECK body: flags were already stripped; what remains is
/// either NONE or a CMD-shaped command.
fn parse_healthcheck(node: &mut Node, body: &str) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        node.push_error("HEALTHCHECK requires either NONE or CMD");
        return;
    }
    let (head, tail) = match trimmed.find(char::is_whitespace) {
        Some(pos) => (&trimmed[..pos], trimmed[pos..].trim_start()),
        None => (trimmed, ""),
    };
    if head.eq_ignore_ascii_case("none") {
        node.args.push("NONE".to_string());
        if !tail.is_empty() {
            node.push_error("HEALTHCHECK NONE takes no arguments");
        }
    } else if head.eq_ignore_ascii_case("cmd") {
        node.args.push("CMD".to_string());
        if tail.is_empty() {
            node.push_error("HEALTHCHECK CMD requires a command");
        } else {
            parse_command(node, tail);
        }
    } else {
        node.push_error("HEALTHCHECK requires either NONE or CMD");
    }
}

/// Recursive sub-parse for ONBUILD. Nested ONBUILD/FROM/MAINTAINER are rejected.
fn parse_onbuild(node: &mut Node, rest: &str, start_line: i32, end_line: i32) {
    if rest.is_empty() {
        node.push_error("ONBUILD requires an instruction argument");
        return;
    }
    let child = parse_line(rest, start_line, end_line, rest);
    match child.kind {
        InstructionKind::Onbuild | InstructionKind::From | InstructionKind::Maintainer => {
            node.push_error(format!(
                "{} is not allowed as an ONBUILD trigger",
                child.kind.as_str()
            ));
        }
        _ => {}
    }
    if !child.is_valid {
        node.is_valid = false;
    }
    node.children.push(child);
}

/// FROM takes either one argument or three (`image AS name`).
fn validate_from_shape(node: &mut Node) {
    match node.args.len() {
        1 => {}
        3 if node.args[1].eq_ignore_ascii_case("as") => {}
        _ => node.push_error("FROM requires one argument, or three: FROM <source> AS <name>"),
    }
}

fn truncate(s: &str) -> &str {
    let end = s
        .char_indices()
        .nth(16)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    &s[..end]
}

/// Parse a JSON array of strings for exec-form arguments.
fn parse_json_array(input: &str) -> IResult<&str, Vec<String>> {
    let (input, _) = char('[')(input)?;
    let (input, _) = space0(input)?;
    let (input, items) =
        separated_list0(tuple((space0, char(','), space0)), parse_json_string)(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = char(']')(input)?;
    Ok((input, items))
}

/// Parse a JSON double-quoted string with standard escapes.
fn parse_json_string(input: &str) -> IResult<&str, String> {
    let (input, _) = char('"')(input)?;
    let mut result = String::new();
    let mut chars = input.chars();
    let mut consumed = 0;

    while let Some(c) = chars.next() {
        consumed += c.len_utf8();
        if c == '"' {
            return Ok((&input[consumed..], result));
        } else if c == '\\' {
            if let Some(next) = chars.next() {
                consumed += next.len_utf8();
                match next {
                    'n' => result.push('\n'),
                    't' => result.push('\t'),
                    'r' => result.push('\r'),
                    '\\' => result.push('\\'),
                    '"' => result.push('"'),
                    _ => {
                        result.push('\\');
                        result.push(next);
                    }
                }
            }
        } else {
            result.push(c);
        }
    }

    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}
