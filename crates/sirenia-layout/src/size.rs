//! Box sizes derived from text.

use crate::config::{BoxMetrics, LayoutConfig};
use crate::text::{TextMeasurer, TextMetrics, TextStyle};
use sirenia_core::NodeShape;
use sirenia_core::diagrams::class::ClassNode;
use sirenia_core::diagrams::er::Entity;
use sirenia_core::diagrams::state::{StateKind, StateNode};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 && self.height <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassBox {
    pub size: Size,
    pub header_height: f64,
    pub row_height: f64,
    pub attributes_offset: f64,
    pub methods_offset: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityBox {
    pub size: Size,
    pub header_height: f64,
    pub row_height: f64,
    pub columns: [f64; 4],
}

pub(crate) struct Sizer<'a> {
    pub config: &'a LayoutConfig,
    pub metrics: &'a BoxMetrics,
    pub measurer: &'a dyn TextMeasurer,
}

impl Sizer<'_> {
    fn label_style(&self) -> TextStyle {
        TextStyle::proportional(self.config.font_size)
    }

    fn member_style(&self) -> TextStyle {
        TextStyle::monospace(self.config.font_size * self.metrics.member_font_scale)
    }

    pub(crate) fn text(&self, text: &str) -> TextMetrics {
        self.measurer.measure(text, &self.label_style())
    }

    /// Flowchart node box. Shapes that cannot grow with their text have fixed sizes.
    pub(crate) fn node(&self, shape: NodeShape, label: &str) -> Size {
        let t = self.text(label);
        let (px, py) = (self.config.node_padding_x, self.config.node_padding_y);
        let w = t.width + 2.0 * px;
        let h = t.height + 2.0 * py;
        let m = self.metrics;
        match shape {
            NodeShape::Rectangle | NodeShape::Rounded => Size::new(w, h),
            NodeShape::Stadium => Size::new(w + h / 2.0, h),
            NodeShape::Subroutine => Size::new(w + 2.0 * m.subroutine_frame, h),
            NodeShape::Database => {
                let ry = (w / 2.0) / (m.cylinder_cap_base + w / m.cylinder_cap_width_step);
                Size::new(w, h + 3.0 * ry)
            }
            NodeShape::Circle => {
                let d = w.max(h);
                Size::new(d, d)
            }
            NodeShape::DoubleCircle => {
                let d = w.max(h) + 2.0 * m.double_circle_gap;
                Size::new(d, d)
            }
            NodeShape::Diamond => {
                let s = t.width + t.height + px + py;
                Size::new(s, s)
            }
            NodeShape::Hexagon => Size::new(w + h / 2.0, h),
            NodeShape::Flag => Size::new(w + h / 4.0, h),
            NodeShape::Trapezoid
            | NodeShape::InverseTrapezoid
            | NodeShape::LeanRight
            | NodeShape::LeanLeft => Size::new(w + h, h),
            NodeShape::ForkJoin => Size::new(m.fork_bar_length, m.fork_bar_thickness),
            NodeShape::StateStart | NodeShape::StateEnd => {
                Size::new(m.pseudo_state_diameter, m.pseudo_state_diameter)
            }
        }
    }

    /// Box of a state that is not composite. Bars lie across the rank direction.
    pub(crate) fn state(&self, state: &StateNode, horizontal: bool) -> Size {
        let m = self.metrics;
        match state.kind {
            StateKind::Start | StateKind::End => {
                Size::new(m.pseudo_state_diameter, m.pseudo_state_diameter)
            }
            StateKind::Fork | StateKind::Join => {
                if horizontal {
                    Size::new(m.fork_bar_thickness, m.fork_bar_length)
                } else {
                    Size::new(m.fork_bar_length, m.fork_bar_thickness)
                }
            }
            StateKind::Choice => Size::new(m.choice_size, m.choice_size),
            StateKind::Simple | StateKind::Composite => {
                let mut text = state.label.clone();
                for d in &state.descriptions {
                    text.push('\n');
                    text.push_str(d);
                }
                let t = self.text(&text);
                let divider = if state.descriptions.is_empty() {
                    0.0
                } else {
                    self.config.node_padding_y
                };
                Size::new(
                    t.width + 2.0 * self.config.node_padding_x,
                    t.height + 2.0 * self.config.node_padding_y + divider,
                )
            }
        }
    }

    /// Title band of a composite state.
    pub(crate) fn composite_header(&self, label: &str) -> Size {
        let t = self.text(label);
        Size::new(
            t.width + 2.0 * self.config.node_padding_x,
            t.height.max(self.metrics.composite_header_height),
        )
    }

    /// Room the engine keeps free for an edge label; empty when there is no label.
    pub(crate) fn edge_label(&self, label: Option<&str>) -> Size {
        let Some(text) = label.filter(|t| !t.trim().is_empty()) else {
            return Size::default();
        };
        let t = self.text(text);
        let pad = self.metrics.edge_label_padding;
        Size::new(t.width + 2.0 * pad, t.height + 2.0 * pad)
    }

    pub(crate) fn class_box(&self, class: &ClassNode) -> ClassBox {
        let m = self.metrics;
        let font = self.config.font_size;
        let title_style = self.label_style().bold();
        let member_style = self.member_style();

        let mut text_width: f64 = 0.0;
        let mut header_lines = 0usize;
        for a in &class.annotations {
            let t = self.measurer.measure(&format!("«{a}»"), &self.label_style());
            text_width = text_width.max(t.width);
            header_lines += t.line_count;
        }
        let title = self.measurer.measure(&class.label, &title_style);
        text_width = text_width.max(title.width);
        header_lines += title.line_count;

        for member in class.attributes.iter().chain(&class.methods) {
            let t = self.measurer.measure(&member.display_text, &member_style);
            text_width = text_width.max(t.width);
        }

        let header_height = header_lines as f64 * font * m.line_height + 2.0 * m.header_padding;
        let row_height = font * m.member_font_scale * m.line_height;
        let attributes_height = class.attributes.len() as f64 * row_height + m.section_padding;
        let methods_height = class.methods.len() as f64 * row_height + m.section_padding;
        let width = (text_width + 2.0 * m.row_padding).max(m.min_class_width);

        ClassBox {
            size: Size::new(width, header_height + attributes_height + methods_height),
            header_height,
            row_height,
            attributes_offset: header_height,
            methods_offset: header_height + attributes_height,
        }
    }

    pub(crate) fn entity_box(&self, entity: &Entity) -> EntityBox {
        let m = self.metrics;
        let label = self.measurer.measure(&entity.label, &self.label_style());
        if entity.attributes.is_empty() {
            return EntityBox {
                size: Size::new(
                    (label.width + 2.0 * m.entity_padding).max(m.min_entity_width),
                    (label.height + 2.0 * m.entity_padding).max(m.min_entity_height),
                ),
                header_height: label.height + 2.0 * m.entity_padding,
                row_height: 0.0,
                columns: [0.0; 4],
            };
        }

        let pad = m.entity_padding / 3.0;
        let style = self.member_style();
        let has_keys = entity.attributes.iter().any(|a| !a.keys.is_empty());
        let has_comments = entity.attributes.iter().any(|a| a.comment.is_some());

        let mut widest = [0.0_f64; 4];
        let mut text_height: f64 = 0.0;
        for a in &entity.attributes {
            let keys = a
                .keys
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(",");
            let cells = [
                Some(a.attr_type.as_str()),
                Some(a.name.as_str()),
                has_keys.then_some(keys.as_str()),
                if has_comments {
                    Some(a.comment.as_deref().unwrap_or(""))
                } else {
                    None
                },
            ];
            for (col, cell) in cells.iter().enumerate() {
                if let Some(text) = cell {
                    let t = self.measurer.measure(text, &style);
                    widest[col] = widest[col].max(t.width);
                    text_height = text_height.max(t.height);
                }
            }
        }

        let present = [true, true, has_keys, has_comments];
        let mut columns: [f64; 4] =
            std::array::from_fn(|col| if present[col] { widest[col] + 2.0 * pad } else { 0.0 });
        let used: f64 = columns.iter().sum();
        let width = m
            .min_entity_width
            .max(label.width + 2.0 * m.entity_padding)
            .max(used);
        if used > 0.0 && width > used {
            let stretch = width / used;
            for c in &mut columns {
                *c *= stretch;
            }
        }

        let header_height = label.height + 2.0 * pad;
        let row_height = text_height + 2.0 * pad;
        EntityBox {
            size: Size::new(
                width,
                header_height + row_height * entity.attributes.len() as f64,
            ),
            header_height,
            row_height,
            columns,
        }
    }
}
