use serde::Serialize;

pub type Result<T> = std::result::Result<T, Error>;

/// Fatal parse failures. Line numbers are 1-based positions in the raw source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("line {line}: unrecognized diagram type `{header}`")]
    UnrecognizedDiagramType { line: usize, header: String },

    #[error("line {line}: front-matter opened with `---` is never closed")]
    MalformedFrontMatter { line: usize },

    #[error("line {line}: subgraph `{id}` is never closed with `end`")]
    UnterminatedSubgraph { id: String, line: usize },

    #[error("line {line}: `{kind}` block is never closed")]
    UnterminatedBlock { kind: String, line: usize },

    #[error("line {line}: participant `{participant}` is deactivated but not active")]
    UnbalancedActivation { participant: String, line: usize },

    #[error("line {line}: `{id}` cannot be resolved in this scope")]
    UnresolvedReference { id: String, line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningKind {
    MalformedEdge,
    MalformedRelationship,
    UnsupportedDirective,
    UnrecognizedLine,
    UnmatchedBlockEnd,
}

/// A line the parser skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub line: usize,
    pub kind: WarningKind,
    pub text: String,
}
