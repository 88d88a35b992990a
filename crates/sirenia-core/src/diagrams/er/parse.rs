use super::{Cardinality, Entity, EntityAttribute, ErAst, ErRelationship, KeyMarker};
use crate::common::{Warnings, is_ignored_directive, strip_quotes};
use crate::{Error, NormalizedSource, ParseWarning, Result, WarningKind};
use regex::Regex;

const CARDINALITY: &str = r"(\|\||\|o|o\||\}\||\|\{|o\{|\{o|\}o|o\})";

fn relationship_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"^([\w-]+)\s*{CARDINALITY}(--|\.\.){CARDINALITY}\s*([\w-]+)\s*(?::\s*(.*))?$"
        ))
        .expect("valid regex")
    })
}

fn entity_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^([\w-]+)\s*(?:\[\s*"?([^"\]]*)"?\s*\])?\s*(\{)?\s*(\})?$"#)
            .expect("valid regex")
    })
}

fn attribute_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^([\w\-\[\](),.]+)\s+([\w\-*()\[\]]+)((?:\s*,?\s*(?:PK|FK|UK))*)\s*(?:"([^"]*)")?$"#,
        )
        .expect("valid regex")
    })
}

struct OpenEntity {
    entity: usize,
    line: usize,
}

struct Builder {
    ast: ErAst,
    open: Option<OpenEntity>,
    warnings: Warnings,
}

impl Builder {
    fn ensure_entity(&mut self, id: &str) -> usize {
        if let Some(idx) = self.ast.entities.iter().position(|e| e.id == id) {
            return idx;
        }
        self.ast.entities.push(Entity {
            id: id.to_string(),
            label: id.to_string(),
            attributes: Vec::new(),
        });
        self.ast.entities.len() - 1
    }

    fn attribute(&mut self, entity: usize, text: &str, line: usize) {
        let Some(caps) = attribute_re().captures(text) else {
            self.warnings.push(line, WarningKind::UnrecognizedLine, text);
            return;
        };
        let mut keys = Vec::new();
        for key in caps
            .get(3)
            .map(|m| m.as_str())
            .unwrap_or_default()
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter_map(KeyMarker::parse)
        {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        self.ast.entities[entity].attributes.push(EntityAttribute {
            attr_type: caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
            name: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
            keys,
            comment: caps.get(4).map(|m| m.as_str().to_string()),
        });
    }

    fn relationship(&mut self, caps: &regex::Captures<'_>, line: usize) {
        let text = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or_default();
        let (Some(cardinality1), Some(cardinality2)) = (
            Cardinality::from_token(text(2)),
            Cardinality::from_token(text(4)),
        ) else {
            return;
        };
        self.ensure_entity(text(1));
        self.ensure_entity(text(5));
        let label = caps
            .get(6)
            .map(|m| strip_quotes(m.as_str().trim()).to_string())
            .filter(|l| !l.is_empty());
        self.ast.relationships.push(ErRelationship {
            entity1: text(1).to_string(),
            entity2: text(5).to_string(),
            cardinality1,
            cardinality2,
            label,
            identifying: text(3) == "--",
            line,
        });
    }
}

pub fn parse_er(source: &NormalizedSource) -> Result<(ErAst, Vec<ParseWarning>)> {
    let mut b = Builder {
        ast: ErAst {
            entities: Vec::new(),
            relationships: Vec::new(),
        },
        open: None,
        warnings: Warnings::default(),
    };

    for line in &source.lines {
        let text = line.text.as_str();
        let number = line.number;

        if let Some(open) = &b.open {
            let entity = open.entity;
            if text == "}" {
                b.open = None;
            } else {
                b.attribute(entity, text, number);
            }
            continue;
        }

        if let Some(caps) = relationship_re().captures(text) {
            b.relationship(&caps, number);
        } else if let Some(caps) = entity_re().captures(text) {
            let id = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let idx = b.ensure_entity(id);
            if let Some(alias) = caps.get(2).map(|m| m.as_str().trim()) {
                if !alias.is_empty() {
                    b.ast.entities[idx].label = alias.to_string();
                }
            }
            if caps.get(3).is_some() && caps.get(4).is_none() {
                b.open = Some(OpenEntity {
                    entity: idx,
                    line: number,
                });
            }
        } else if text == "}" {
            b.warnings.push(number, WarningKind::UnmatchedBlockEnd, text);
        } else if text.starts_with("direction ") {
            b.warnings.push(number, WarningKind::UnsupportedDirective, text);
        } else if matches!(
            text.split_whitespace().next(),
            Some("classDef" | "class" | "style")
        ) || is_ignored_directive(text)
        {
            tracing::debug!(line = number, text, "ignoring er directive");
        } else if text.contains("--") || text.contains("..") {
            b.warnings.push(number, WarningKind::MalformedRelationship, text);
        } else {
            b.warnings.push(number, WarningKind::UnrecognizedLine, text);
        }
    }

    if let Some(open) = &b.open {
        return Err(Error::UnterminatedBlock {
            kind: format!("entity {}", b.ast.entities[open.entity].id),
            line: open.line,
        });
    }

    tracing::debug!(
        entities = b.ast.entities.len(),
        relationships = b.ast.relationships.len(),
        "parsed er diagram"
    );
    Ok((b.ast, b.warnings.into_vec()))
}
