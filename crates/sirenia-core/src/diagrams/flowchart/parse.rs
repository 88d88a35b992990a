use super::{ArrowHead, EdgeStroke, FlowEdge, FlowNode, FlowchartAst, Subgraph, SubgraphChild};
use crate::common::{Warnings, is_ignored_directive, split_statements, strip_quotes};
use crate::shape::NodeShape;
use crate::{Direction, Error, NormalizedSource, ParseWarning, Result, WarningKind};
use indexmap::IndexMap;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};

fn link_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([<ox])?(-{2,}|={2,}|-\.+-|~{3,})([>ox])?").expect("valid regex")
    })
}

fn inline_link_open_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([<ox])?(--|==|-\.)").expect("valid regex"))
}

fn inline_link_close_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(-{2,}|={2,}|\.-+)([>ox])?").expect("valid regex"))
}

fn subgraph_title_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([^\s\[]+)\s*\[(.*)\]$").expect("valid regex"))
}

/// Opening bracket, then the accepted closers with the shape each one selects.
/// Longer openers come first so `((` wins over `(`.
const SHAPE_TABLE: &[(&str, &[(&str, NodeShape)])] = &[
    ("(((", &[(")))", NodeShape::DoubleCircle)]),
    ("((", &[("))", NodeShape::Circle)]),
    ("([", &[("])", NodeShape::Stadium)]),
    ("(", &[(")", NodeShape::Rounded)]),
    ("[[", &[("]]", NodeShape::Subroutine)]),
    ("[(", &[(")]", NodeShape::Database)]),
    (
        "[/",
        &[("/]", NodeShape::LeanRight), ("\\]", NodeShape::Trapezoid)],
    ),
    (
        "[\\",
        &[("\\]", NodeShape::LeanLeft), ("/]", NodeShape::InverseTrapezoid)],
    ),
    ("[", &[("]", NodeShape::Rectangle)]),
    ("{{", &[("}}", NodeShape::Hexagon)]),
    ("{", &[("}", NodeShape::Diamond)]),
    (">", &[("]", NodeShape::Flag)]),
];

#[derive(Debug, Clone)]
struct NodeRef {
    id: String,
    shape: Option<(NodeShape, String)>,
    classes: Vec<String>,
}

#[derive(Debug, Clone)]
struct Link {
    stroke: EdgeStroke,
    start: ArrowHead,
    end: ArrowHead,
    label: Option<String>,
}

#[derive(Debug, Default)]
struct Statement {
    groups: Vec<Vec<NodeRef>>,
    links: Vec<Link>,
}

struct Cursor<'a> {
    s: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self { s, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.s[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.s.len()
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn advance(&mut self, bytes: usize) {
        self.pos += bytes;
    }
}

fn is_id_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn read_id(cur: &mut Cursor<'_>) -> Option<String> {
    let rest = cur.rest();
    let mut end = 0;
    let mut chars = rest.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let keep = if c == '-' {
            // `my-node` is one id, `A-->B` is not.
            chars.peek().is_some_and(|&(_, next)| is_id_char(next))
        } else {
            is_id_char(c)
        };
        if !keep {
            break;
        }
        end = i + c.len_utf8();
    }
    if end == 0 {
        return None;
    }
    cur.advance(end);
    Some(rest[..end].to_string())
}

fn clean_label(raw: &str) -> String {
    strip_quotes(raw.trim()).trim().to_string()
}

/// `None` when no shape opener follows; `Some(Err)` for an opener without a closer.
fn read_shape(cur: &mut Cursor<'_>) -> Option<std::result::Result<(NodeShape, String), ()>> {
    let rest = cur.rest();
    let (open, closers) = SHAPE_TABLE
        .iter()
        .find(|(open, _)| rest.starts_with(open))?;
    let body = &rest[open.len()..];

    let search_from = if body.trim_start().starts_with('"') {
        let lead = body.len() - body.trim_start().len();
        match body[lead + 1..].find('"') {
            Some(q) => lead + 1 + q + 1,
            None => return Some(Err(())),
        }
    } else {
        0
    };

    let found = closers
        .iter()
        .filter_map(|(close, shape)| {
            body[search_from..]
                .find(close)
                .map(|at| (search_from + at, *close, *shape))
        })
        .min_by_key(|(at, _, _)| *at);
    let Some((at, close, shape)) = found else {
        return Some(Err(()));
    };

    let label = clean_label(&body[..at]);
    cur.advance(open.len() + at + close.len());
    Some(Ok((shape, label)))
}

fn read_node(cur: &mut Cursor<'_>) -> Option<std::result::Result<NodeRef, ()>> {
    cur.skip_ws();
    let id = read_id(cur)?;
    let shape = match read_shape(cur) {
        None => None,
        Some(Ok(shape)) => Some(shape),
        Some(Err(())) => return Some(Err(())),
    };
    let mut classes = Vec::new();
    if cur.eat(":::") {
        match read_id(cur) {
            Some(class) => classes.push(class),
            None => return Some(Err(())),
        }
    }
    Some(Ok(NodeRef { id, shape, classes }))
}

fn read_group(cur: &mut Cursor<'_>) -> Option<std::result::Result<Vec<NodeRef>, ()>> {
    let first = match read_node(cur)? {
        Ok(node) => node,
        Err(()) => return Some(Err(())),
    };
    let mut group = vec![first];
    loop {
        cur.skip_ws();
        if !cur.eat("&") {
            break;
        }
        match read_node(cur) {
            Some(Ok(node)) => group.push(node),
            _ => return Some(Err(())),
        }
    }
    Some(Ok(group))
}

fn head_from(c: Option<&str>, default: ArrowHead) -> ArrowHead {
    match c {
        Some("<") | Some(">") => ArrowHead::Normal,
        Some("o") => ArrowHead::Circle,
        Some("x") => ArrowHead::Cross,
        _ => default,
    }
}

fn stroke_from(body: &str) -> EdgeStroke {
    if body.starts_with('=') {
        EdgeStroke::Thick
    } else if body.starts_with('~') {
        EdgeStroke::Invisible
    } else if body.contains('.') {
        EdgeStroke::Dotted
    } else {
        EdgeStroke::Solid
    }
}

fn read_link(cur: &mut Cursor<'_>) -> Option<std::result::Result<Link, ()>> {
    cur.skip_ws();
    let rest = cur.rest();

    let mut link = None;
    if let Some(caps) = link_re().captures(rest) {
        let body = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let end = caps.get(3).map(|m| m.as_str());
        // A bare `--` or `==` opens the `-- text -->` form instead.
        let opens_inline = end.is_none() && (body == "--" || body == "==");
        if !opens_inline {
            let start = caps.get(1).map(|m| m.as_str());
            link = Some(Link {
                stroke: stroke_from(body),
                start: head_from(start, ArrowHead::None),
                end: head_from(end, ArrowHead::None),
                label: None,
            });
            cur.advance(caps.get(0).map(|m| m.end()).unwrap_or_default());
        }
    }

    if link.is_none() {
        let caps = inline_link_open_re().captures(rest)?;
        let open_end = caps.get(0).map(|m| m.end()).unwrap_or_default();
        let body = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let start = caps.get(1).map(|m| m.as_str());
        let after = &rest[open_end..];
        let Some(close) = inline_link_close_re().captures(after) else {
            return Some(Err(()));
        };
        let Some(close_all) = close.get(0) else {
            return Some(Err(()));
        };
        let text = clean_label(&after[..close_all.start()]);
        link = Some(Link {
            stroke: stroke_from(body),
            start: head_from(start, ArrowHead::None),
            end: head_from(close.get(2).map(|m| m.as_str()), ArrowHead::None),
            label: (!text.is_empty()).then_some(text),
        });
        cur.advance(open_end + close_all.end());
    }

    let mut link = link?;
    cur.skip_ws();
    if cur.eat("|") {
        let rest = cur.rest();
        let Some(close) = rest.find('|') else {
            return Some(Err(()));
        };
        let text = clean_label(&rest[..close]);
        link.label = (!text.is_empty()).then_some(text);
        cur.advance(close + 1);
    }
    Some(Ok(link))
}

fn read_statement(text: &str) -> std::result::Result<Statement, WarningKind> {
    let mut cur = Cursor::new(text);
    let mut stmt = Statement::default();
    match read_group(&mut cur) {
        Some(Ok(group)) => stmt.groups.push(group),
        _ => return Err(WarningKind::UnrecognizedLine),
    }
    loop {
        cur.skip_ws();
        if cur.at_end() {
            break;
        }
        let link = match read_link(&mut cur) {
            Some(Ok(link)) => link,
            Some(Err(())) => return Err(WarningKind::MalformedEdge),
            None if stmt.links.is_empty() => return Err(WarningKind::UnrecognizedLine),
            None => return Err(WarningKind::MalformedEdge),
        };
        match read_group(&mut cur) {
            Some(Ok(group)) => {
                stmt.links.push(link);
                stmt.groups.push(group);
            }
            _ => return Err(WarningKind::MalformedEdge),
        }
    }
    Ok(stmt)
}

struct Builder {
    ast: FlowchartAst,
    node_index: FxHashMap<String, usize>,
    explicit: FxHashSet<String>,
    open: Vec<usize>,
    generated_ids: usize,
    warnings: Warnings,
}

impl Builder {
    fn new(direction: Direction) -> Self {
        Self {
            ast: FlowchartAst {
                direction,
                nodes: Vec::new(),
                edges: Vec::new(),
                subgraphs: Vec::new(),
                root_subgraphs: Vec::new(),
                class_defs: IndexMap::new(),
            },
            node_index: FxHashMap::default(),
            explicit: FxHashSet::default(),
            open: Vec::new(),
            generated_ids: 0,
            warnings: Warnings::default(),
        }
    }

    fn touch_node(&mut self, node: &NodeRef) {
        let idx = match self.node_index.get(&node.id) {
            Some(&idx) => {
                // The first explicit shape/label wins; bare references never override it.
                if let Some((shape, label)) = &node.shape {
                    if self.explicit.insert(node.id.clone()) {
                        let existing = &mut self.ast.nodes[idx];
                        existing.shape = *shape;
                        existing.label = label.clone();
                    }
                }
                idx
            }
            None => {
                let (shape, label) = match &node.shape {
                    Some((shape, label)) => {
                        self.explicit.insert(node.id.clone());
                        (*shape, label.clone())
                    }
                    None => (NodeShape::Rectangle, node.id.clone()),
                };
                let idx = self.ast.nodes.len();
                self.ast.nodes.push(FlowNode {
                    id: node.id.clone(),
                    label,
                    shape,
                    classes: Vec::new(),
                    subgraph: None,
                });
                self.node_index.insert(node.id.clone(), idx);
                idx
            }
        };

        let entry = &mut self.ast.nodes[idx];
        for class in &node.classes {
            if !entry.classes.contains(class) {
                entry.classes.push(class.clone());
            }
        }
        if let Some(&sub) = self.open.last() {
            if entry.subgraph.is_none() {
                entry.subgraph = Some(sub);
                self.ast.subgraphs[sub]
                    .children
                    .push(SubgraphChild::Node(node.id.clone()));
            }
        }
    }

    fn add_statement(&mut self, stmt: Statement, line: usize) {
        for group in &stmt.groups {
            for node in group {
                self.touch_node(node);
            }
        }
        for (i, link) in stmt.links.iter().enumerate() {
            for from in &stmt.groups[i] {
                for to in &stmt.groups[i + 1] {
                    self.ast.edges.push(FlowEdge {
                        from: from.id.clone(),
                        to: to.id.clone(),
                        stroke: link.stroke,
                        start: link.start,
                        end: link.end,
                        label: link.label.clone(),
                        line,
                    });
                }
            }
        }
    }

    fn next_generated_id(&mut self) -> String {
        let id = format!("subGraph{}", self.generated_ids);
        self.generated_ids += 1;
        id
    }

    fn open_subgraph(&mut self, header: &str, line: usize) {
        let header = header.trim();
        let (id, title) = if header.is_empty() {
            (self.next_generated_id(), None)
        } else if header.starts_with('"') {
            (self.next_generated_id(), Some(clean_label(header)))
        } else if let Some(caps) = subgraph_title_re().captures(header) {
            let id = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let title = clean_label(caps.get(2).map(|m| m.as_str()).unwrap_or_default());
            (id.to_string(), Some(title))
        } else if header.contains(char::is_whitespace) {
            (self.next_generated_id(), Some(header.to_string()))
        } else {
            (header.to_string(), None)
        };

        let idx = self.ast.subgraphs.len();
        let parent = self.open.last().copied();
        self.ast.subgraphs.push(Subgraph {
            id,
            title,
            direction: None,
            parent,
            children: Vec::new(),
            line,
        });
        match parent {
            Some(p) => self.ast.subgraphs[p]
                .children
                .push(SubgraphChild::Subgraph(idx)),
            None => self.ast.root_subgraphs.push(idx),
        }
        self.open.push(idx);
    }

    fn class_def(&mut self, rest: &str) {
        let mut parts = rest.trim().splitn(2, char::is_whitespace);
        let names = parts.next().unwrap_or_default();
        let styles: Vec<String> = parts
            .next()
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for name in names.split(',').filter(|n| !n.is_empty()) {
            self.ast
                .class_defs
                .insert(name.to_string(), styles.clone());
        }
    }

    fn apply_class(&mut self, rest: &str) {
        let mut parts = rest.trim().rsplitn(2, char::is_whitespace);
        let class = parts.next().unwrap_or_default().to_string();
        let ids = parts.next().unwrap_or_default();
        for id in ids.split(',').map(str::trim) {
            if let Some(&idx) = self.node_index.get(id) {
                let node = &mut self.ast.nodes[idx];
                if !node.classes.contains(&class) {
                    node.classes.push(class.clone());
                }
            }
        }
    }

    /// Bare references to a subgraph id name the subgraph, not a new node.
    fn drop_subgraph_placeholders(&mut self) {
        let placeholders: FxHashSet<String> = self
            .ast
            .subgraphs
            .iter()
            .enumerate()
            .filter(|(idx, s)| {
                !self.explicit.contains(&s.id) && !self.ast.descendant_nodes(*idx).is_empty()
            })
            .map(|(_, s)| s.id.clone())
            .collect();
        if placeholders.is_empty() {
            return;
        }
        self.ast.nodes.retain(|n| !placeholders.contains(&n.id));
        for sub in &mut self.ast.subgraphs {
            sub.children.retain(|c| match c {
                SubgraphChild::Node(id) => !placeholders.contains(id),
                SubgraphChild::Subgraph(_) => true,
            });
        }
    }
}

fn keyword_rest<'a>(stmt: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = stmt.strip_prefix(keyword)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

pub fn parse_flowchart(source: &NormalizedSource) -> Result<(FlowchartAst, Vec<ParseWarning>)> {
    let direction = Direction::parse(&source.header_args).unwrap_or_default();
    let mut b = Builder::new(direction);

    for line in &source.lines {
        for stmt in split_statements(&line.text) {
            if let Some(rest) = keyword_rest(stmt, "subgraph") {
                b.open_subgraph(rest, line.number);
            } else if stmt == "end" {
                if b.open.pop().is_none() {
                    b.warnings
                        .push(line.number, WarningKind::UnmatchedBlockEnd, stmt);
                }
            } else if let Some(rest) = keyword_rest(stmt, "direction") {
                match (Direction::parse(rest), b.open.last()) {
                    (Some(dir), Some(&sub)) => b.ast.subgraphs[sub].direction = Some(dir),
                    (Some(dir), None) => b.ast.direction = dir,
                    (None, _) => {
                        b.warnings
                            .push(line.number, WarningKind::UnsupportedDirective, stmt)
                    }
                }
            } else if let Some(rest) = keyword_rest(stmt, "classDef") {
                b.class_def(rest);
            } else if let Some(rest) = keyword_rest(stmt, "class") {
                b.apply_class(rest);
            } else if ["style", "linkStyle", "click"]
                .iter()
                .any(|k| keyword_rest(stmt, k).is_some())
                || is_ignored_directive(stmt)
            {
                tracing::debug!(line = line.number, stmt, "ignoring styling directive");
            } else {
                match read_statement(stmt) {
                    Ok(parsed) => b.add_statement(parsed, line.number),
                    Err(kind) => b.warnings.push(line.number, kind, stmt),
                }
            }
        }
    }

    if let Some(&open) = b.open.last() {
        let sub = &b.ast.subgraphs[open];
        return Err(Error::UnterminatedSubgraph {
            id: sub.id.clone(),
            line: sub.line,
        });
    }

    b.drop_subgraph_placeholders();
    tracing::debug!(
        nodes = b.ast.nodes.len(),
        edges = b.ast.edges.len(),
        subgraphs = b.ast.subgraphs.len(),
        "parsed flowchart"
    );
    Ok((b.ast, b.warnings.into_vec()))
}
