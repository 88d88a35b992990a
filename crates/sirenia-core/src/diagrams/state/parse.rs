use super::{ROOT_REGION, StateAst, StateKind, StateNode, StateRegion, Transition};
use crate::common::{Warnings, is_ignored_directive, strip_quotes};
use crate::{Direction, Error, NormalizedSource, ParseWarning, Result, WarningKind};
use regex::Regex;
use rustc_hash::FxHashMap;

fn state_alias_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^state\s+"([^"]*)"\s+as\s+([\w-]+)\s*(\{)?$"#).expect("valid regex")
    })
}

fn state_stereotype_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^state\s+([\w-]+)\s*<<(fork|join|choice)>>$").expect("valid regex")
    })
}

fn state_decl_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^state\s+([\w-]+)\s*(?::\s*(.*?)\s*)?(\{)?$").expect("valid regex")
    })
}

fn transition_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\S+?)\s*-->\s*(\S+?)\s*(?::\s*(.*?))?\s*$").expect("valid regex")
    })
}

fn description_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([\w-]+)\s*:\s*(.*)$").expect("valid regex"))
}

fn bare_id_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w-]+$").expect("valid regex"))
}

const PSEUDO_STATE: &str = "[*]";

struct OpenRegion {
    region: usize,
    owner: String,
    line: usize,
}

struct Builder {
    regions: Vec<StateRegion>,
    /// Region each state id was declared in. State ids are global to the diagram.
    home: FxHashMap<String, usize>,
    open: Vec<OpenRegion>,
    warnings: Warnings,
}

fn strip_class_suffix(id: &str) -> &str {
    id.split(":::").next().unwrap_or(id)
}

impl Builder {
    fn new() -> Self {
        Self {
            regions: vec![StateRegion {
                owner: None,
                parent: None,
                children: Vec::new(),
                direction: Direction::TopDown,
                states: Vec::new(),
                transitions: Vec::new(),
            }],
            home: FxHashMap::default(),
            open: Vec::new(),
            warnings: Warnings::default(),
        }
    }

    fn current(&self) -> usize {
        self.open.last().map(|o| o.region).unwrap_or(ROOT_REGION)
    }

    fn state_mut(&mut self, region: usize, id: &str) -> Option<&mut StateNode> {
        self.regions[region].states.iter_mut().find(|s| s.id == id)
    }

    /// Declares `id` in the current region, or refines an existing declaration there.
    fn declare(
        &mut self,
        id: &str,
        kind: Option<StateKind>,
        label: Option<String>,
        line: usize,
    ) -> Result<()> {
        let region = self.current();
        match self.home.get(id).copied() {
            Some(home) if home != region => Err(Error::UnresolvedReference {
                id: id.to_string(),
                line,
            }),
            Some(home) => {
                if let Some(state) = self.state_mut(home, id) {
                    if let Some(kind) = kind {
                        if state.kind == StateKind::Simple {
                            state.kind = kind;
                        }
                    }
                    if let Some(label) = label {
                        state.label = label;
                    }
                }
                Ok(())
            }
            None => {
                self.regions[region].states.push(StateNode {
                    id: id.to_string(),
                    label: label.unwrap_or_else(|| id.to_string()),
                    descriptions: Vec::new(),
                    kind: kind.unwrap_or(StateKind::Simple),
                    region: None,
                });
                self.home.insert(id.to_string(), region);
                Ok(())
            }
        }
    }

    fn describe(&mut self, id: &str, text: &str, line: usize) -> Result<()> {
        self.declare(id, None, None, line)?;
        let region = self.current();
        if let Some(state) = self.state_mut(region, id) {
            if state.label == state.id && state.descriptions.is_empty() {
                state.label = text.to_string();
            } else {
                state.descriptions.push(text.to_string());
            }
        }
        Ok(())
    }

    /// Start or end pseudo-state of the current region.
    fn pseudo_state(&mut self, kind: StateKind, line: usize) -> Result<String> {
        let region = self.current();
        let prefix = self.regions[region].owner.as_deref().unwrap_or("root");
        let suffix = if kind == StateKind::Start {
            "start"
        } else {
            "end"
        };
        let id = format!("{prefix}_{suffix}");
        self.declare(&id, Some(kind), Some(String::new()), line)?;
        Ok(id)
    }

    fn open_composite(&mut self, id: &str, label: Option<String>, line: usize) -> Result<()> {
        self.declare(id, Some(StateKind::Composite), label, line)?;
        let parent = self.current();
        let existing = self
            .regions
            .iter()
            .position(|r| r.owner.as_deref() == Some(id));
        let region = match existing {
            Some(region) => region,
            None => {
                let region = self.regions.len();
                let direction = self.regions[parent].direction;
                self.regions.push(StateRegion {
                    owner: Some(id.to_string()),
                    parent: Some(parent),
                    children: Vec::new(),
                    direction,
                    states: Vec::new(),
                    transitions: Vec::new(),
                });
                self.regions[parent].children.push(region);
                region
            }
        };
        if let Some(state) = self.state_mut(parent, id) {
            state.kind = StateKind::Composite;
            state.region = Some(region);
        }
        self.open.push(OpenRegion {
            region,
            owner: id.to_string(),
            line,
        });
        Ok(())
    }

    fn transition(&mut self, from: &str, to: &str, label: Option<&str>, line: usize) -> Result<()> {
        let from = if from == PSEUDO_STATE {
            self.pseudo_state(StateKind::Start, line)?
        } else {
            let id = strip_class_suffix(from);
            self.declare(id, None, None, line)?;
            id.to_string()
        };
        let to = if to == PSEUDO_STATE {
            self.pseudo_state(StateKind::End, line)?
        } else {
            let id = strip_class_suffix(to);
            self.declare(id, None, None, line)?;
            id.to_string()
        };
        let region = self.current();
        self.regions[region].transitions.push(Transition {
            from,
            to,
            label: label
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
            line,
        });
        Ok(())
    }
}

fn keyword_rest<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// Splits `state X { a --> b; b --> c }` written on one line into its logical lines.
fn expand_inline_block(text: &str) -> Vec<String> {
    let Some(brace) = text.find('{') else {
        return vec![text.to_string()];
    };
    let tail = text[brace + 1..].trim();
    if !text.starts_with("state") || tail.is_empty() {
        return vec![text.to_string()];
    }
    let mut out = vec![text[..=brace].trim().to_string()];
    match tail.strip_suffix('}') {
        Some(inner) => {
            for stmt in crate::common::split_statements(inner) {
                out.extend(expand_inline_block(stmt));
            }
            out.push("}".to_string());
        }
        None => out.push(tail.to_string()),
    }
    out
}

pub fn parse_state(source: &NormalizedSource) -> Result<(StateAst, Vec<ParseWarning>)> {
    let mut b = Builder::new();
    if let Some(dir) = Direction::parse(&source.header_args) {
        b.regions[ROOT_REGION].direction = dir;
    }
    let mut open_note: Option<usize> = None;

    for line in &source.lines {
        let number = line.number;
        for piece in expand_inline_block(&line.text) {
            let text = piece.as_str();

            if open_note.is_some() {
                if text == "end note" {
                    open_note = None;
                }
                continue;
            }

            if text == "}" {
                if b.open.pop().is_none() {
                    b.warnings.push(number, WarningKind::UnmatchedBlockEnd, text);
                }
            } else if let Some(caps) = state_alias_re().captures(text) {
                let label = caps.get(1).map(|m| m.as_str().to_string());
                let id = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
                if caps.get(3).is_some() {
                    b.open_composite(id, label, number)?;
                } else {
                    b.declare(id, None, label, number)?;
                }
            } else if let Some(caps) = state_stereotype_re().captures(text) {
                let id = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                let kind = match caps.get(2).map(|m| m.as_str()) {
                    Some("fork") => StateKind::Fork,
                    Some("join") => StateKind::Join,
                    _ => StateKind::Choice,
                };
                b.declare(id, Some(kind), Some(String::new()), number)?;
            } else if let Some(caps) = state_decl_re().captures(text) {
                let id = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                let label = caps
                    .get(2)
                    .map(|m| strip_quotes(m.as_str()).to_string())
                    .filter(|l| !l.is_empty());
                if caps.get(3).is_some() {
                    b.open_composite(id, label, number)?;
                } else {
                    b.declare(id, None, label, number)?;
                }
            } else if let Some(caps) = transition_re().captures(text) {
                let from = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                let to = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
                b.transition(from, to, caps.get(3).map(|m| m.as_str()), number)?;
            } else if let Some(rest) = keyword_rest(text, "direction") {
                match Direction::parse(rest) {
                    Some(dir) => {
                        let region = b.current();
                        b.regions[region].direction = dir;
                    }
                    None => b
                        .warnings
                        .push(number, WarningKind::UnsupportedDirective, text),
                }
            } else if let Some(rest) = keyword_rest(text, "note") {
                if !rest.contains(':') {
                    open_note = Some(number);
                }
            } else if text == "--" {
                b.warnings
                    .push(number, WarningKind::UnsupportedDirective, text);
            } else if ["classDef", "class", "style", "click", "hide", "scale"]
                .iter()
                .any(|k| keyword_rest(text, k).is_some())
                || is_ignored_directive(text)
            {
                tracing::debug!(line = number, text, "ignoring state directive");
            } else if let Some(caps) = description_re().captures(text) {
                let id = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                let desc = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
                b.describe(id, desc, number)?;
            } else if bare_id_re().is_match(text) {
                b.declare(text, None, None, number)?;
            } else {
                b.warnings.push(number, WarningKind::UnrecognizedLine, text);
            }
        }
    }

    if let Some(line) = open_note {
        return Err(Error::UnterminatedBlock {
            kind: "note".to_string(),
            line,
        });
    }
    if let Some(open) = b.open.last() {
        return Err(Error::UnterminatedBlock {
            kind: format!("state {}", open.owner),
            line: open.line,
        });
    }

    tracing::debug!(
        regions = b.regions.len(),
        states = b.home.len(),
        "parsed state diagram"
    );
    Ok((
        StateAst { regions: b.regions },
        b.warnings.into_vec(),
    ))
}
