//! Line normalization and diagram-type detection.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagramKind {
    Flowchart,
    State,
    Sequence,
    Class,
    Er,
}

impl DiagramKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagramKind::Flowchart => "flowchart",
            DiagramKind::State => "state",
            DiagramKind::Sequence => "sequence",
            DiagramKind::Class => "class",
            DiagramKind::Er => "er",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "graph" | "flowchart" | "flowchart-v2" => DiagramKind::Flowchart,
            "stateDiagram" | "stateDiagram-v2" => DiagramKind::State,
            "sequenceDiagram" => DiagramKind::Sequence,
            "classDiagram" | "classDiagram-v2" => DiagramKind::Class,
            "erDiagram" => DiagramKind::Er,
            _ => return None,
        })
    }
}

impl std::fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based line number in the raw source.
    pub number: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedSource {
    pub kind: DiagramKind,
    /// `title:` from a front-matter block, if any.
    pub title: Option<String>,
    pub header_line: usize,
    /// Whatever followed the header keyword (e.g. `TD` in `graph TD`).
    pub header_args: String,
    pub lines: Vec<SourceLine>,
}

fn is_comment(line: &str) -> bool {
    // `%%{init: ...}%%` directives are treated as comments too.
    line.starts_with("%%")
}

/// Splits `source` into trimmed, non-blank, non-comment lines and detects the diagram type.
pub fn normalize(source: &str) -> Result<NormalizedSource> {
    let mut raw = source
        .lines()
        .enumerate()
        .map(|(idx, text)| (idx + 1, text.trim()))
        .filter(|(_, text)| !text.is_empty() && !is_comment(text))
        .peekable();

    let mut title: Option<String> = None;
    if let Some(&(open_line, "---")) = raw.peek() {
        raw.next();
        let mut closed = false;
        for (_, text) in raw.by_ref() {
            if text == "---" {
                closed = true;
                break;
            }
            if let Some(value) = text.strip_prefix("title:") {
                title = Some(crate::common::strip_quotes(value.trim()).to_string());
            }
        }
        if !closed {
            return Err(Error::MalformedFrontMatter { line: open_line });
        }
    }

    let Some((header_line, header)) = raw.next() else {
        return Err(Error::UnrecognizedDiagramType {
            line: 0,
            header: String::new(),
        });
    };

    let header = header.trim_end_matches(';').trim_end();
    let (keyword, args) = match header.split_once(char::is_whitespace) {
        Some((k, rest)) => (k, rest.trim()),
        None => (header, ""),
    };
    let Some(kind) = DiagramKind::from_keyword(keyword) else {
        return Err(Error::UnrecognizedDiagramType {
            line: header_line,
            header: header.to_string(),
        });
    };

    let lines: Vec<SourceLine> = raw
        .map(|(number, text)| SourceLine {
            number,
            text: text.to_string(),
        })
        .collect();

    tracing::debug!(kind = kind.as_str(), lines = lines.len(), "normalized diagram source");
    Ok(NormalizedSource {
        kind,
        title,
        header_line,
        header_args: args.to_string(),
        lines,
    })
}
