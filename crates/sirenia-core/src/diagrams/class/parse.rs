use super::{
    ClassAst, ClassMember, ClassNode, Classifier, MemberKind, RelationKind, Relationship,
    Visibility,
};
use crate::common::{Warnings, is_ignored_directive, strip_quotes};
use crate::{Error, NormalizedSource, ParseWarning, Result, WarningKind};
use regex::Regex;

fn class_decl_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^class\s+([\w-]+)(?:~(.+?)~)?(?:\["([^"]*)"\])?(?::::([\w-]+))?\s*(\{)?\s*(\})?$"#,
        )
        .expect("valid regex")
    })
}

fn relationship_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^([\w~]+)\s*(?:"([^"]*)"\s*)?(<\|--|\*--|o--|-->|\.\.\|>|\.\.>)\s*(?:"([^"]*)"\s*)?([\w~]+)\s*(?::\s*(.*))?$"#,
        )
        .expect("valid regex")
    })
}

fn member_line_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([\w-]+)(?:~[^:]*~)?\s*:\s*(.+)$").expect("valid regex"))
}

fn annotation_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^<<\s*([^>]+?)\s*>>(?:\s+([\w-]+))?$").expect("valid regex"))
}

fn namespace_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^namespace\s+[\w.-]+\s*\{$").expect("valid regex"))
}

/// Rewrites `~T~` generic markers as `<T>`; nested forms like `List~List~int~~` are supported.
pub(crate) fn expand_generics(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for (i, &c) in chars.iter().enumerate() {
        if c != '~' {
            out.push(c);
            continue;
        }
        let opens = chars
            .get(i + 1)
            .is_some_and(|n| n.is_alphanumeric() || matches!(n, '_' | '[' | '('));
        let after_word = i > 0 && !chars[i - 1].is_whitespace();
        if opens && after_word {
            depth += 1;
            out.push('<');
        } else if depth > 0 {
            depth -= 1;
            out.push('>');
        } else {
            out.push(c);
        }
    }
    out
}

fn split_visibility(text: &str) -> (Option<Visibility>, &str) {
    match text.chars().next().and_then(Visibility::from_marker) {
        Some(v) => (Some(v), text[1..].trim_start()),
        None => (None, text),
    }
}

fn classifier_of(c: char) -> Option<Classifier> {
    match c {
        '$' => Some(Classifier::Static),
        '*' => Some(Classifier::Abstract),
        _ => None,
    }
}

fn strip_classifier_suffix(text: &str) -> (&str, Option<Classifier>) {
    match text.chars().last().and_then(classifier_of) {
        Some(c) => (text[..text.len() - 1].trim_end(), Some(c)),
        None => (text, None),
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Parses one member row; a row with `(` ... `)` is a method, anything else an attribute.
pub(crate) fn parse_member(text: &str) -> ClassMember {
    let text = text.trim();
    let (visibility, rest) = split_visibility(text);
    let vis = visibility.map(|v| v.marker().to_string()).unwrap_or_default();

    let parens = match (rest.find('('), rest.rfind(')')) {
        (Some(open), Some(close)) if open < close => Some((open, close)),
        _ => None,
    };
    if let Some((open, close)) = parens {
        let name = rest[..open].trim().to_string();
        let parameters = rest[open + 1..close].trim().to_string();
        let mut after = rest[close + 1..].trim();
        let mut classifier = after.chars().next().and_then(classifier_of);
        if classifier.is_some() {
            after = after[1..].trim_start();
        }
        let after = after.strip_prefix(':').unwrap_or(after).trim();
        let (after, suffix) = strip_classifier_suffix(after);
        classifier = classifier.or(suffix);
        let member_type = non_empty(after);

        let mut display_text = format!(
            "{vis}{}({})",
            expand_generics(&name),
            expand_generics(&parameters)
        );
        if let Some(ret) = &member_type {
            display_text.push_str(" : ");
            display_text.push_str(&expand_generics(ret));
        }
        return ClassMember {
            kind: MemberKind::Method,
            visibility,
            name,
            parameters,
            member_type,
            classifier,
            display_text,
        };
    }

    let (rest, classifier) = strip_classifier_suffix(rest);
    let (name, member_type, display_text) = if let Some((name, ty)) = rest.split_once(':') {
        let (name, ty) = (name.trim(), ty.trim());
        let display = format!("{vis}{} : {}", expand_generics(name), expand_generics(ty));
        (name.to_string(), non_empty(ty), display)
    } else if let Some((ty, name)) = rest.rsplit_once(char::is_whitespace) {
        // Mermaid's `Type name` ordering.
        let (ty, name) = (ty.trim(), name.trim());
        let display = format!("{vis}{} {}", expand_generics(ty), expand_generics(name));
        (name.to_string(), non_empty(ty), display)
    } else {
        (rest.to_string(), None, format!("{vis}{}", expand_generics(rest)))
    };

    ClassMember {
        kind: MemberKind::Attribute,
        visibility,
        name,
        parameters: String::new(),
        member_type,
        classifier,
        display_text,
    }
}

enum OpenScope {
    Body { class: usize, line: usize },
    Namespace { line: usize },
}

struct Builder {
    ast: ClassAst,
    open: Vec<OpenScope>,
    warnings: Warnings,
}

impl Builder {
    fn ensure_class(&mut self, id: &str) -> usize {
        if let Some(idx) = self.ast.classes.iter().position(|c| c.id == id) {
            return idx;
        }
        self.ast.classes.push(ClassNode {
            id: id.to_string(),
            label: id.to_string(),
            generic: None,
            annotations: Vec::new(),
            attributes: Vec::new(),
            methods: Vec::new(),
            css_classes: Vec::new(),
        });
        self.ast.classes.len() - 1
    }

    fn declare(&mut self, caps: &regex::Captures<'_>, line: usize) {
        let id = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let idx = self.ensure_class(id);
        let class = &mut self.ast.classes[idx];
        if let Some(generic) = caps.get(2) {
            class.generic = Some(generic.as_str().to_string());
            class.label = format!("{id}<{}>", expand_generics(generic.as_str()));
        }
        if let Some(label) = caps.get(3) {
            class.label = label.as_str().to_string();
        }
        if let Some(css) = caps.get(4) {
            let css = css.as_str().to_string();
            if !class.css_classes.contains(&css) {
                class.css_classes.push(css);
            }
        }
        let opens = caps.get(5).is_some();
        let closes = caps.get(6).is_some();
        if opens && !closes {
            self.open.push(OpenScope::Body { class: idx, line });
        }
    }

    fn add_member(&mut self, class: usize, text: &str) {
        let annotation = annotation_re()
            .captures(text)
            .filter(|caps| caps.get(2).is_none())
            .and_then(|caps| caps.get(1).map(|m| m.as_str().to_string()));
        if let Some(annotation) = annotation {
            self.ast.classes[class].annotations.push(annotation);
            return;
        }
        let member = parse_member(text);
        let target = &mut self.ast.classes[class];
        match member.kind {
            MemberKind::Method => target.methods.push(member),
            MemberKind::Attribute => target.attributes.push(member),
        }
    }

    fn relationship(&mut self, caps: &regex::Captures<'_>, line: usize) {
        let text = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or_default();
        // Generic suffixes on relationship endpoints name the same class.
        let from = text(1).split('~').next().unwrap_or_default().to_string();
        let to = text(5).split('~').next().unwrap_or_default().to_string();
        let Some(kind) = RelationKind::from_token(text(3)) else {
            return;
        };
        self.ensure_class(&from);
        self.ensure_class(&to);
        self.ast.relationships.push(Relationship {
            from,
            to,
            kind,
            label: caps
                .get(6)
                .and_then(|m| non_empty(strip_quotes(m.as_str().trim()))),
            from_cardinality: caps.get(2).map(|m| m.as_str().to_string()),
            to_cardinality: caps.get(4).map(|m| m.as_str().to_string()),
            line,
        });
    }
}

pub fn parse_class(source: &NormalizedSource) -> Result<(ClassAst, Vec<ParseWarning>)> {
    let mut b = Builder {
        ast: ClassAst {
            classes: Vec::new(),
            relationships: Vec::new(),
        },
        open: Vec::new(),
        warnings: Warnings::default(),
    };

    for line in &source.lines {
        let text = line.text.as_str();
        let number = line.number;

        if text == "}" {
            if b.open.pop().is_none() {
                b.warnings.push(number, WarningKind::UnmatchedBlockEnd, text);
            }
            continue;
        }
        if let Some(&OpenScope::Body { class, .. }) = b.open.last() {
            b.add_member(class, text);
            continue;
        }

        if let Some(caps) = class_decl_re().captures(text) {
            b.declare(&caps, number);
        } else if namespace_re().is_match(text) {
            b.open.push(OpenScope::Namespace { line: number });
        } else if let Some(caps) = annotation_re().captures(text) {
            match caps.get(2) {
                Some(id) => {
                    let idx = b.ensure_class(id.as_str());
                    let annotation = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                    b.ast.classes[idx].annotations.push(annotation.to_string());
                }
                None => b.warnings.push(number, WarningKind::UnrecognizedLine, text),
            }
        } else if let Some(caps) = relationship_re().captures(text) {
            b.relationship(&caps, number);
        } else if let Some(caps) = member_line_re().captures(text) {
            let id = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let member = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            let idx = b.ensure_class(id);
            b.add_member(idx, member);
        } else if text.starts_with("direction ") {
            b.warnings.push(number, WarningKind::UnsupportedDirective, text);
        } else if matches!(
            text.split_whitespace().next(),
            Some("cssClass" | "classDef" | "style" | "click" | "link" | "callback" | "note")
        ) || is_ignored_directive(text)
        {
            tracing::debug!(line = number, text, "ignoring class directive");
        } else if text.contains("--") || text.contains("..") {
            b.warnings.push(number, WarningKind::MalformedRelationship, text);
        } else {
            b.warnings.push(number, WarningKind::UnrecognizedLine, text);
        }
    }

    if let Some(open) = b.open.last() {
        let (kind, line) = match *open {
            OpenScope::Body { class, line } => {
                (format!("class {}", b.ast.classes[class].id), line)
            }
            OpenScope::Namespace { line } => ("namespace".to_string(), line),
        };
        return Err(Error::UnterminatedBlock { kind, line });
    }

    tracing::debug!(
        classes = b.ast.classes.len(),
        relationships = b.ast.relationships.len(),
        "parsed class diagram"
    );
    Ok((b.ast, b.warnings.into_vec()))
}
