//! `.dockerignore` loading and matching.
//!
//! Patterns follow the gitignore-style dockerignore syntax: one pattern per
//! line, `#` comments, leading `!` re-includes, `*`/`?`/`[...]` globs per
//! path segment and `**` spanning any number of segments. Patterns are
//! anchored at the build-context root. Compiled matchers are built lazily and
//! cached; the public fields stay plain data.

use std::path::Path;

use once_cell::sync::OnceCell;
use serde::Serialize;

/// The `.dockerignore` file of a build context.
#[derive(Debug, Clone, Serialize)]
pub struct Dockerignore {
    /// Where the file was looked for.
    pub location: String,
    pub exists: bool,
    /// Cleaned patterns in file order; a leading `!` marks re-inclusion.
    pub patterns: Vec<String>,
    #[serde(skip)]
    compiled: OnceCell<Vec<CompiledPattern>>,
}

#[derive(Debug, Clone)]
struct CompiledPattern {
    negate: bool,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
enum Segment {
    /// `**` — any number of path segments, including none.
    AnyDepth,
    Glob(glob::Pattern),
}

impl Dockerignore {
    /// Look for `.dockerignore` in the given build-context directory.
    pub fn load(context_dir: &Path) -> Self {
        let path = context_dir.join(".dockerignore");
        let location = path.to_string_lossy().into_owned();
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::from_content(location, &content),
            Err(err) => {
                if err.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("failed to read {}: {}", location, err);
                }
                Dockerignore {
                    location,
                    exists: false,
                    patterns: Vec::new(),
                    compiled: OnceCell::new(),
                }
            }
        }
    }

    /// An absent `.dockerignore` (no build context supplied).
    pub fn missing() -> Self {
        Dockerignore {
            location: String::new(),
            exists: false,
            patterns: Vec::new(),
            compiled: OnceCell::new(),
        }
    }

    /// Build the model from in-memory content.
    pub fn from_content(location: impl Into<String>, content: &str) -> Self {
        let patterns = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(clean_pattern)
            .filter(|p| !p.is_empty() && *p != "!")
            .collect();
        Dockerignore {
            location: location.into(),
            exists: true,
            patterns,
            compiled: OnceCell::new(),
        }
    }

    /// Whether a context-relative path is excluded from the build context.
    ///
    /// Patterns are evaluated in order; the last matching pattern wins, with
    /// `!` re-including. A pattern matching a parent directory matches
    /// everything below it.
    pub fn matches(&self, path: &str) -> bool {
        let normalized = path.trim_start_matches("./").trim_matches('/');
        if normalized.is_empty() {
            return false;
        }
        let segments: Vec<&str> = normalized.split('/').collect();

        let mut ignored = false;
        for pattern in self.compiled() {
            if pattern_matches(&pattern.segments, &segments) {
                ignored = !pattern.negate;
            }
        }
        ignored
    }

    fn compiled(&self) -> &[CompiledPattern] {
        self.compiled
            .get_or_init(|| self.patterns.iter().filter_map(|p| compile(p)).collect())
    }
}

/// Strip the negation marker for cleaning, re-attaching it afterwards.
fn clean_pattern(line: &str) -> String {
    let (negate, body) = match line.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, line),
    };
    let body = body.trim().trim_matches('/');
    if negate {
        format!("!{}", body)
    } else {
        body.to_string()
    }
}

fn compile(pattern: &str) -> Option<CompiledPattern> {
    let (negate, body) = match pattern.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, pattern),
    };

    let mut segments = Vec::new();
    for part in body.split('/') {
        if part == "**" {
            segments.push(Segment::AnyDepth);
        } else {
            match glob::Pattern::new(part) {
                Ok(glob) => segments.push(Segment::Glob(glob)),
                Err(err) => {
                    log::warn!("skipping malformed dockerignore pattern '{}': {}", pattern, err);
                    return None;
                }
            }
        }
    }
    Some(CompiledPattern { negate, segments })
}

/// A pattern matches a path when it matches the whole path or any ancestor
/// directory of it.
fn pattern_matches(pattern: &[Segment], path: &[&str]) -> bool {
    (1..=path.len()).any(|depth| segments_match(pattern, &path[..depth]))
}

fn segments_match(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            (0..=path.len()).any(|skip| segments_match(rest, &path[skip..]))
        }
        Some((Segment::Glob(glob), rest)) => match path.split_first() {
            Some((head, tail)) => glob.matches(head) && segments_match(rest, tail),
            None => false,
        },
    }
}
