//! Sequence diagram syntax tree.
//!
//! Events are numbered by their position in [`SequenceAst::events`]; blocks and activations
//! refer to events by that ordinal.

mod parse;

pub use parse::parse_sequence;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequenceAst {
    /// Participants in order of first appearance.
    pub participants: Vec<Participant>,
    pub events: Vec<SequenceEvent>,
    /// Block arena; `Block::parent` and `Block::children` index into it.
    pub blocks: Vec<Block>,
    pub activations: Vec<Activation>,
    pub autonumber: bool,
}

impl SequenceAst {
    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.events.iter().filter_map(|e| match e {
            SequenceEvent::Message(m) => Some(m),
            SequenceEvent::Note(_) => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParticipantKind {
    Participant,
    Actor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    pub id: String,
    /// Alias from `participant A as Alias`, otherwise the id.
    pub label: String,
    pub kind: ParticipantKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LineStyle {
    Solid,
    Dotted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageHead {
    /// `->` / `-->`
    None,
    /// `->>` / `-->>`
    Arrow,
    /// `-x` / `--x`
    Cross,
    /// `-)` / `--)`
    Async,
    /// `<<->>` / `<<-->>`
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageKind {
    pub line: LineStyle,
    pub head: MessageHead,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub kind: MessageKind,
    pub text: String,
    /// Sequence number when `autonumber` is on.
    pub number: Option<usize>,
    pub line: usize,
}

impl Message {
    pub fn is_self(&self) -> bool {
        self.from == self.to
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NotePlacement {
    LeftOf,
    RightOf,
    Over,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub placement: NotePlacement,
    /// One participant, or two for `Note over A,B`.
    pub participants: Vec<String>,
    pub text: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum SequenceEvent {
    Message(Message),
    Note(Note),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    Loop,
    Alt,
    Opt,
    Par,
    Critical,
    Break,
    Rect,
}

impl BlockKind {
    pub fn keyword(self) -> &'static str {
        match self {
            BlockKind::Loop => "loop",
            BlockKind::Alt => "alt",
            BlockKind::Opt => "opt",
            BlockKind::Par => "par",
            BlockKind::Critical => "critical",
            BlockKind::Break => "break",
            BlockKind::Rect => "rect",
        }
    }

    /// Keyword that starts a further section (`else`, `and`, `option`).
    pub fn section_keyword(self) -> Option<&'static str> {
        match self {
            BlockKind::Alt => Some("else"),
            BlockKind::Par => Some("and"),
            BlockKind::Critical => Some("option"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockSection {
    pub label: String,
    /// Ordinal of the first event in the section.
    pub start: usize,
}

/// A `loop`/`alt`/... span covering events `start..end`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub kind: BlockKind,
    pub sections: Vec<BlockSection>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub start: usize,
    /// Exclusive.
    pub end: usize,
    pub line: usize,
}

impl Block {
    pub fn depth(&self, blocks: &[Block]) -> usize {
        let mut depth = 0;
        let mut parent = self.parent;
        while let Some(p) = parent {
            depth += 1;
            parent = blocks.get(p).and_then(|b| b.parent);
        }
        depth
    }
}

/// One push/pop pair on a participant's activation stack.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activation {
    pub participant: String,
    /// Ordinal of the event that opened the activation.
    pub start: usize,
    /// Ordinal of the event that closed it.
    pub end: usize,
    /// Stack depth when opened; 0 is the outermost.
    pub depth: usize,
}
