//! The positioned diagram handed to renderers.
//!
//! Boxes are given by their top-left corner plus size; paths and anchors are absolute points in
//! the same frame. Nothing here refers back into the syntax tree.

use serde::Serialize;
use sirenia_core::diagrams::class::{ClassMember, RelationKind};
use sirenia_core::diagrams::er::{Cardinality, EntityAttribute};
use sirenia_core::diagrams::flowchart::{ArrowHead, EdgeStroke};
use sirenia_core::diagrams::sequence::{BlockKind, MessageKind, NotePlacement, ParticipantKind};
use sirenia_core::diagrams::state::StateKind;
use sirenia_core::{DiagramKind, Direction, NodeShape};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let mut b = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in it {
            b.include_point(p);
        }
        Some(b)
    }

    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x + width,
            max_y: y + height,
        }
    }

    pub fn include_point(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn union(&mut self, other: &Bounds) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Accumulates the extent of everything drawn.
#[derive(Debug, Default)]
pub(crate) struct Extent(Option<Bounds>);

impl Extent {
    pub(crate) fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let r = Bounds::from_rect(x, y, width, height);
        match &mut self.0 {
            Some(b) => b.union(&r),
            None => self.0 = Some(r),
        }
    }

    pub(crate) fn point(&mut self, p: Point) {
        self.rect(p.x, p.y, 0.0, 0.0);
    }

    pub(crate) fn points(&mut self, points: &[Point]) {
        for p in points {
            self.point(*p);
        }
    }

    /// A label box centered on `anchor`.
    pub(crate) fn label(&mut self, anchor: Option<Point>, size: (f64, f64)) {
        if let Some(a) = anchor {
            self.rect(a.x - size.0 / 2.0, a.y - size.1 / 2.0, size.0, size.1);
        }
    }

    pub(crate) fn bounds(&self) -> Option<Bounds> {
        self.0
    }

    /// Offset that moves the extent's corner to `(padding, padding)`, and the padded frame size.
    pub(crate) fn frame(&self, padding: f64) -> Frame {
        match self.0 {
            Some(b) => Frame {
                dx: padding - b.min_x,
                dy: padding - b.min_y,
                width: b.width() + 2.0 * padding,
                height: b.height() + 2.0 * padding,
            },
            None => Frame {
                dx: 0.0,
                dy: 0.0,
                width: 2.0 * padding,
                height: 2.0 * padding,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Frame {
    pub dx: f64,
    pub dy: f64,
    pub width: f64,
    pub height: f64,
}

/// Moves geometry by a fixed offset.
pub(crate) trait Translate {
    fn translate(&mut self, dx: f64, dy: f64);
}

impl<T: Translate> Translate for Vec<T> {
    fn translate(&mut self, dx: f64, dy: f64) {
        for item in self {
            item.translate(dx, dy);
        }
    }
}

impl<T: Translate> Translate for Option<T> {
    fn translate(&mut self, dx: f64, dy: f64) {
        if let Some(item) = self {
            item.translate(dx, dy);
        }
    }
}

impl<T: Translate> Translate for Box<T> {
    fn translate(&mut self, dx: f64, dy: f64) {
        self.as_mut().translate(dx, dy);
    }
}

macro_rules! translate_xy {
    ($($ty:ty),* $(,)?) => {$(
        impl Translate for $ty {
            fn translate(&mut self, dx: f64, dy: f64) {
                self.x += dx;
                self.y += dy;
            }
        }
    )*};
}

macro_rules! translate_parts {
    ($ty:ty => $($field:ident),+ $(,)?) => {
        impl Translate for $ty {
            fn translate(&mut self, dx: f64, dy: f64) {
                $(self.$field.translate(dx, dy);)+
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedDiagram {
    pub kind: DiagramKind,
    pub title: Option<String>,
    pub width: f64,
    pub height: f64,
    pub layout: DiagramLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DiagramLayout {
    Flowchart(FlowchartLayout),
    State(StateLayout),
    Sequence(SequenceLayout),
    Class(ClassLayout),
    Er(ErLayout),
}

/// Top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn centered(center: Point, width: f64, height: f64) -> Self {
        Self {
            x: center.x - width / 2.0,
            y: center.y - height / 2.0,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowchartLayout {
    pub direction: Direction,
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<PositionedEdge>,
    /// Outer clusters come before the clusters nested in them.
    pub clusters: Vec<PositionedCluster>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedNode {
    pub id: String,
    pub label: String,
    pub shape: NodeShape,
    pub classes: Vec<String>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PositionedNode {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedEdge {
    pub from: String,
    pub to: String,
    /// Set when the edge was written against a subgraph and routed to one of its nodes.
    pub from_cluster: Option<String>,
    pub to_cluster: Option<String>,
    pub stroke: EdgeStroke,
    pub start: ArrowHead,
    pub end: ArrowHead,
    pub label: Option<String>,
    pub label_anchor: Option<Point>,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedCluster {
    pub id: String,
    pub title: Option<String>,
    pub parent: Option<String>,
    pub depth: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateLayout {
    pub direction: Direction,
    /// Extent of this region including its padding.
    pub width: f64,
    pub height: f64,
    pub states: Vec<PositionedState>,
    pub transitions: Vec<PositionedTransition>,
}

impl StateLayout {
    pub fn state(&self, id: &str) -> Option<&PositionedState> {
        self.states.iter().find(|s| s.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedState {
    pub id: String,
    pub label: String,
    pub descriptions: Vec<String>,
    pub kind: StateKind,
    pub shape: NodeShape,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Height of the title band of a composite state.
    pub header_height: f64,
    /// Inner diagram of a composite state, already placed inside this box.
    pub nested: Option<Box<StateLayout>>,
}

impl PositionedState {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedTransition {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    pub label_anchor: Option<Point>,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassLayout {
    pub classes: Vec<PositionedClass>,
    pub relationships: Vec<PositionedRelationship>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedClass {
    pub id: String,
    pub label: String,
    pub annotations: Vec<String>,
    pub attributes: Vec<ClassMember>,
    pub methods: Vec<ClassMember>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub header_height: f64,
    pub row_height: f64,
    /// Offset of the attribute section from the top of the box.
    pub attributes_offset: f64,
    /// Offset of the method section from the top of the box.
    pub methods_offset: f64,
}

impl PositionedClass {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedRelationship {
    pub from: String,
    pub to: String,
    pub kind: RelationKind,
    pub label: Option<String>,
    pub from_cardinality: Option<String>,
    pub to_cardinality: Option<String>,
    pub label_anchor: Option<Point>,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErLayout {
    pub entities: Vec<PositionedEntity>,
    pub relationships: Vec<PositionedErRelationship>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedEntity {
    pub id: String,
    pub label: String,
    pub attributes: Vec<EntityAttribute>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub header_height: f64,
    pub row_height: f64,
    /// Widths of the type, name, key and comment columns; absent columns are zero.
    pub columns: [f64; 4],
}

impl PositionedEntity {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedErRelationship {
    pub entity1: String,
    pub entity2: String,
    pub cardinality1: Cardinality,
    pub cardinality2: Cardinality,
    pub label: Option<String>,
    pub identifying: bool,
    pub label_anchor: Option<Point>,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceLayout {
    pub participants: Vec<PositionedParticipant>,
    pub messages: Vec<PositionedMessage>,
    pub activations: Vec<PositionedActivation>,
    pub notes: Vec<PositionedNote>,
    pub blocks: Vec<PositionedBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedParticipant {
    pub id: String,
    pub label: String,
    pub kind: ParticipantKind,
    /// Box drawn above the first message.
    pub top: Rect,
    /// Box drawn below the last message.
    pub bottom: Rect,
    pub lifeline_x: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedMessage {
    pub from: String,
    pub to: String,
    pub kind: MessageKind,
    pub text: String,
    pub number: Option<usize>,
    /// Two points, or four for a message a participant sends to itself.
    pub points: Vec<Point>,
    pub label_anchor: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedActivation {
    pub participant: String,
    pub depth: usize,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedNote {
    pub placement: NotePlacement,
    pub participants: Vec<String>,
    pub text: String,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedBlock {
    pub kind: BlockKind,
    pub depth: usize,
    pub rect: Rect,
    /// The first section's label sits in the frame header; later ones start at their `y`.
    pub sections: Vec<PositionedSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedSection {
    pub label: String,
    pub y: f64,
}

translate_xy!(
    Point,
    Rect,
    PositionedNode,
    PositionedCluster,
    PositionedClass,
    PositionedEntity,
);

translate_parts!(FlowchartLayout => nodes, edges, clusters);
translate_parts!(PositionedEdge => label_anchor, points);
translate_parts!(StateLayout => states, transitions);
translate_parts!(PositionedTransition => label_anchor, points);
translate_parts!(ClassLayout => classes, relationships);
translate_parts!(PositionedRelationship => label_anchor, points);
translate_parts!(ErLayout => entities, relationships);
translate_parts!(PositionedErRelationship => label_anchor, points);
translate_parts!(SequenceLayout => participants, messages, activations, notes, blocks);
translate_parts!(PositionedMessage => points, label_anchor);
translate_parts!(PositionedActivation => rect);
translate_parts!(PositionedNote => rect);

impl Translate for PositionedState {
    fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
        self.nested.translate(dx, dy);
    }
}

impl Translate for PositionedParticipant {
    fn translate(&mut self, dx: f64, dy: f64) {
        self.top.translate(dx, dy);
        self.bottom.translate(dx, dy);
        self.lifeline_x += dx;
    }
}

impl Translate for PositionedBlock {
    fn translate(&mut self, dx: f64, dy: f64) {
        self.rect.translate(dx, dy);
        for section in &mut self.sections {
            section.y += dy;
        }
    }
}
