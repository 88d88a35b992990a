//! Line-scanning helpers shared by the diagram parsers.

use crate::{ParseWarning, WarningKind};
use serde::{Deserialize, Serialize};

/// Rank direction of a diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "TB", alias = "TD")]
    TopDown,
    #[serde(rename = "BT")]
    BottomUp,
    #[serde(rename = "LR")]
    LeftRight,
    #[serde(rename = "RL")]
    RightLeft,
}

impl Direction {
    pub fn parse(token: &str) -> Option<Self> {
        Some(match token.trim() {
            "TD" | "TB" => Direction::TopDown,
            "BT" => Direction::BottomUp,
            "LR" => Direction::LeftRight,
            "RL" => Direction::RightLeft,
            _ => return None,
        })
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::LeftRight | Direction::RightLeft)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::TopDown => "TB",
            Direction::BottomUp => "BT",
            Direction::LeftRight => "LR",
            Direction::RightLeft => "RL",
        }
    }
}

/// Removes one pair of surrounding double quotes.
pub fn strip_quotes(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s)
}

/// Directives accepted by every diagram type and ignored by the layout.
pub(crate) fn is_ignored_directive(line: &str) -> bool {
    let keyword = line
        .split(|c: char| c.is_whitespace() || c == ':')
        .next()
        .unwrap_or_default();
    matches!(keyword, "title" | "accTitle" | "accDescr")
}

/// Splits on `;` outside of quotes and brackets.
pub(crate) fn split_statements(line: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth: i32 = 0;
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '[' | '(' | '{' if !in_quotes => depth += 1,
            ']' | ')' | '}' if !in_quotes => depth -= 1,
            ';' if !in_quotes && depth <= 0 => {
                out.push(line[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(line[start..].trim());
    out.retain(|s| !s.is_empty());
    out
}

/// Collects skipped-line warnings and mirrors them to `tracing`.
#[derive(Debug, Default)]
pub(crate) struct Warnings {
    items: Vec<ParseWarning>,
}

impl Warnings {
    pub(crate) fn push(&mut self, line: usize, kind: WarningKind, text: &str) {
        tracing::warn!(line, ?kind, text, "skipping diagram line");
        self.items.push(ParseWarning {
            line,
            kind,
            text: text.to_string(),
        });
    }

    pub(crate) fn into_vec(self) -> Vec<ParseWarning> {
        self.items
    }
}
