use super::{
    Activation, Block, BlockKind, BlockSection, LineStyle, Message, MessageHead, MessageKind, Note,
    NotePlacement, Participant, ParticipantKind, SequenceAst, SequenceEvent,
};
use crate::common::{Warnings, is_ignored_directive, strip_quotes};
use crate::{Error, NormalizedSource, ParseWarning, Result, WarningKind};
use regex::Regex;
use rustc_hash::FxHashMap;

fn participant_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:create\s+)?(participant|actor)\s+(.+?)(?:\s+as\s+(.+))?$")
            .expect("valid regex")
    })
}

fn message_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^([^\s:+<>-][^:]*?)\s*(<<-->>|<<->>|-->>|->>|-->|->|--x|-x|--\)|-\))\s*([+-]?)\s*([^\s:+-][^:]*?)\s*(?::(.*))?$",
        )
        .expect("valid regex")
    })
}

fn note_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^note\s+(left of|right of|over)\s+([^:]+?)\s*:\s*(.*)$")
            .expect("valid regex")
    })
}

fn message_kind(arrow: &str) -> MessageKind {
    let line = if arrow.contains("--") {
        LineStyle::Dotted
    } else {
        LineStyle::Solid
    };
    let head = match arrow {
        "<<->>" | "<<-->>" => MessageHead::Both,
        "->>" | "-->>" => MessageHead::Arrow,
        "-x" | "--x" => MessageHead::Cross,
        "-)" | "--)" => MessageHead::Async,
        _ => MessageHead::None,
    };
    MessageKind { line, head }
}

fn block_kind(keyword: &str) -> Option<BlockKind> {
    Some(match keyword {
        "loop" => BlockKind::Loop,
        "alt" => BlockKind::Alt,
        "opt" => BlockKind::Opt,
        "par" => BlockKind::Par,
        "critical" => BlockKind::Critical,
        "break" => BlockKind::Break,
        "rect" => BlockKind::Rect,
        _ => return None,
    })
}

struct OpenBlock {
    /// `None` for `box` groupings, which only need their `end` matched.
    block: Option<usize>,
    keyword: String,
    line: usize,
}

struct Autonumber {
    next: usize,
    step: usize,
}

struct Builder {
    ast: SequenceAst,
    active: FxHashMap<String, Vec<usize>>,
    open: Vec<OpenBlock>,
    numbering: Option<Autonumber>,
    warnings: Warnings,
}

impl Builder {
    fn new() -> Self {
        Self {
            ast: SequenceAst {
                participants: Vec::new(),
                events: Vec::new(),
                blocks: Vec::new(),
                activations: Vec::new(),
                autonumber: false,
            },
            active: FxHashMap::default(),
            open: Vec::new(),
            numbering: None,
            warnings: Warnings::default(),
        }
    }

    fn ensure_participant(&mut self, id: &str) {
        if self.ast.participant(id).is_none() {
            self.ast.participants.push(Participant {
                id: id.to_string(),
                label: id.to_string(),
                kind: ParticipantKind::Participant,
            });
        }
    }

    fn declare_participant(&mut self, kind: ParticipantKind, id: &str, alias: Option<&str>) {
        let label = alias
            .map(|a| strip_quotes(a.trim()).to_string())
            .unwrap_or_else(|| id.to_string());
        match self.ast.participants.iter_mut().find(|p| p.id == id) {
            Some(existing) => {
                existing.kind = kind;
                existing.label = label;
            }
            None => self.ast.participants.push(Participant {
                id: id.to_string(),
                label,
                kind,
            }),
        }
    }

    fn last_event(&self) -> usize {
        self.ast.events.len().saturating_sub(1)
    }

    fn activate(&mut self, participant: &str, at: usize) {
        let stack = self.active.entry(participant.to_string()).or_default();
        let depth = stack.len();
        stack.push(self.ast.activations.len());
        self.ast.activations.push(Activation {
            participant: participant.to_string(),
            start: at,
            end: at,
            depth,
        });
    }

    fn deactivate(&mut self, participant: &str, at: usize, line: usize) -> Result<()> {
        let popped = self
            .active
            .get_mut(participant)
            .and_then(|stack| stack.pop());
        let Some(idx) = popped else {
            return Err(Error::UnbalancedActivation {
                participant: participant.to_string(),
                line,
            });
        };
        let activation = &mut self.ast.activations[idx];
        activation.end = at.max(activation.start);
        Ok(())
    }

    fn message(&mut self, caps: &regex::Captures<'_>, line: usize) -> Result<()> {
        let from = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        let arrow = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let marker = caps.get(3).map(|m| m.as_str()).unwrap_or_default();
        let to = caps.get(4).map(|m| m.as_str().trim()).unwrap_or_default();
        let text = caps.get(5).map(|m| m.as_str().trim()).unwrap_or_default();

        self.ensure_participant(from);
        self.ensure_participant(to);

        let ordinal = self.ast.events.len();
        let number = self.numbering.as_mut().map(|n| {
            let current = n.next;
            n.next += n.step;
            current
        });
        self.ast.events.push(SequenceEvent::Message(Message {
            from: from.to_string(),
            to: to.to_string(),
            kind: message_kind(arrow),
            text: text.to_string(),
            number,
            line,
        }));

        match marker {
            "+" => self.activate(to, ordinal),
            "-" => self.deactivate(from, ordinal, line)?,
            _ => {}
        }
        Ok(())
    }

    fn note(&mut self, caps: &regex::Captures<'_>, line: usize) {
        let placement = match caps
            .get(1)
            .map(|m| m.as_str().to_ascii_lowercase())
            .as_deref()
        {
            Some("left of") => NotePlacement::LeftOf,
            Some("right of") => NotePlacement::RightOf,
            _ => NotePlacement::Over,
        };
        let participants: Vec<String> = caps
            .get(2)
            .map(|m| m.as_str())
            .unwrap_or_default()
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .take(2)
            .collect();
        for p in &participants {
            self.ensure_participant(p);
        }
        self.ast.events.push(SequenceEvent::Note(Note {
            placement,
            participants,
            text: caps
                .get(3)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
            line,
        }));
    }

    fn open_block(&mut self, kind: BlockKind, label: &str, line: usize) {
        let idx = self.ast.blocks.len();
        let parent = self.open.iter().rev().find_map(|o| o.block);
        let start = self.ast.events.len();
        self.ast.blocks.push(Block {
            kind,
            sections: vec![BlockSection {
                label: label.to_string(),
                start,
            }],
            parent,
            children: Vec::new(),
            start,
            end: start,
            line,
        });
        if let Some(p) = parent {
            self.ast.blocks[p].children.push(idx);
        }
        self.open.push(OpenBlock {
            block: Some(idx),
            keyword: kind.keyword().to_string(),
            line,
        });
    }

    /// `else` / `and` / `option`; false when the innermost block does not take it.
    fn add_section(&mut self, keyword: &str, label: &str) -> bool {
        let Some(idx) = self.open.last().and_then(|o| o.block) else {
            return false;
        };
        let start = self.ast.events.len();
        let block = &mut self.ast.blocks[idx];
        if block.kind.section_keyword() != Some(keyword) {
            return false;
        }
        block.sections.push(BlockSection {
            label: label.to_string(),
            start,
        });
        true
    }

    fn close_block(&mut self) -> bool {
        let Some(open) = self.open.pop() else {
            return false;
        };
        if let Some(idx) = open.block {
            self.ast.blocks[idx].end = self.ast.events.len();
        }
        true
    }

    fn set_autonumber(&mut self, args: &str) {
        if args == "off" {
            self.numbering = None;
            return;
        }
        let mut nums = args.split_whitespace().filter_map(|n| n.parse::<usize>().ok());
        let next = nums.next().unwrap_or(1);
        let step = nums.next().unwrap_or(1).max(1);
        self.numbering = Some(Autonumber { next, step });
        self.ast.autonumber = true;
    }
}

fn split_keyword(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((k, rest)) => (k, rest.trim()),
        None => (text, ""),
    }
}

pub fn parse_sequence(source: &NormalizedSource) -> Result<(SequenceAst, Vec<ParseWarning>)> {
    let mut b = Builder::new();

    for line in &source.lines {
        let text = line.text.as_str();
        let number = line.number;
        let (keyword, rest) = split_keyword(text);

        if let Some(caps) = participant_re().captures(text) {
            let kind = match caps.get(1).map(|m| m.as_str()) {
                Some("actor") => ParticipantKind::Actor,
                _ => ParticipantKind::Participant,
            };
            let id = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
            b.declare_participant(kind, id, caps.get(3).map(|m| m.as_str()));
        } else if let Some(kind) = block_kind(keyword) {
            b.open_block(kind, rest, number);
        } else if matches!(keyword, "else" | "and" | "option") {
            if !b.add_section(keyword, rest) {
                b.warnings.push(number, WarningKind::UnrecognizedLine, text);
            }
        } else if keyword == "box" {
            b.open.push(OpenBlock {
                block: None,
                keyword: "box".to_string(),
                line: number,
            });
        } else if text == "end" {
            if !b.close_block() {
                b.warnings.push(number, WarningKind::UnmatchedBlockEnd, text);
            }
        } else if keyword == "activate" && !rest.is_empty() {
            b.ensure_participant(rest);
            let at = b.last_event();
            b.activate(rest, at);
        } else if keyword == "deactivate" && !rest.is_empty() {
            let at = b.last_event();
            b.deactivate(rest, at, number)?;
        } else if keyword == "autonumber" {
            b.set_autonumber(rest);
        } else if let Some(caps) = note_re().captures(text) {
            b.note(&caps, number);
        } else if let Some(caps) = message_re().captures(text) {
            b.message(&caps, number)?;
        } else if matches!(keyword, "destroy" | "link" | "links" | "properties" | "details")
            || is_ignored_directive(text)
        {
            tracing::debug!(line = number, text, "ignoring sequence directive");
        } else if text.contains("->") || text.contains("--") {
            b.warnings.push(number, WarningKind::MalformedEdge, text);
        } else {
            b.warnings.push(number, WarningKind::UnrecognizedLine, text);
        }
    }

    if let Some(open) = b.open.last() {
        return Err(Error::UnterminatedBlock {
            kind: open.keyword.clone(),
            line: open.line,
        });
    }

    // Activations still open at the end run to the last event.
    let last = b.last_event();
    for stack in b.active.values() {
        for &idx in stack {
            let activation = &mut b.ast.activations[idx];
            activation.end = last.max(activation.start);
        }
    }

    tracing::debug!(
        participants = b.ast.participants.len(),
        events = b.ast.events.len(),
        blocks = b.ast.blocks.len(),
        "parsed sequence diagram"
    );
    Ok((b.ast, b.warnings.into_vec()))
}
