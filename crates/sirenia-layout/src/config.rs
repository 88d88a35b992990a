use serde::{Deserialize, Serialize};
use sirenia_core::{DiagramKind, Direction};

/// Caller-facing layout knobs. [`LayoutConfig::default`] is the one published default set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Overrides the parsed direction of flowcharts and of the top level of state diagrams.
    pub direction: Option<Direction>,
    /// Gap between neighbouring nodes of the same rank.
    pub node_spacing: f64,
    /// Gap between neighbouring edge routes of the same rank.
    pub edge_spacing: f64,
    /// Gap between ranks.
    pub rank_spacing: f64,
    /// Empty border around the whole diagram.
    pub diagram_padding: f64,
    pub node_padding_x: f64,
    pub node_padding_y: f64,
    pub font_size: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            direction: None,
            node_spacing: 50.0,
            edge_spacing: 10.0,
            rank_spacing: 50.0,
            diagram_padding: 8.0,
            node_padding_x: 15.0,
            node_padding_y: 10.0,
            font_size: 16.0,
        }
    }
}

impl LayoutConfig {
    pub(crate) fn validate(&self) -> crate::Result<()> {
        let fields = [
            ("nodeSpacing", self.node_spacing),
            ("edgeSpacing", self.edge_spacing),
            ("rankSpacing", self.rank_spacing),
            ("diagramPadding", self.diagram_padding),
            ("nodePaddingX", self.node_padding_x),
            ("nodePaddingY", self.node_padding_y),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(crate::Error::InvalidConfig { field, value });
            }
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(crate::Error::InvalidConfig {
                field: "fontSize",
                value: self.font_size,
            });
        }
        Ok(())
    }
}

/// What a diagram type adds on top of [`LayoutConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagramDefaults {
    /// Rank direction that ignores both the source and the config override.
    pub forced_direction: Option<Direction>,
    /// Whether labeled edges ask the engine to reserve room for the label.
    pub reserve_edge_labels: bool,
    pub min_rank_spacing: f64,
    /// Place unanchored labels at the arc-length midpoint of the final path.
    pub midpoint_labels: bool,
}

impl DiagramDefaults {
    pub fn for_kind(kind: DiagramKind) -> Self {
        match kind {
            DiagramKind::Flowchart | DiagramKind::State | DiagramKind::Sequence => Self {
                forced_direction: None,
                reserve_edge_labels: true,
                min_rank_spacing: 0.0,
                midpoint_labels: false,
            },
            DiagramKind::Class => Self {
                forced_direction: Some(Direction::TopDown),
                reserve_edge_labels: true,
                min_rank_spacing: 0.0,
                midpoint_labels: true,
            },
            DiagramKind::Er => Self {
                forced_direction: Some(Direction::LeftRight),
                reserve_edge_labels: false,
                min_rank_spacing: 80.0,
                midpoint_labels: true,
            },
        }
    }

    pub fn rank_spacing(&self, config: &LayoutConfig) -> f64 {
        config.rank_spacing.max(self.min_rank_spacing)
    }
}

/// Box constants shared by every diagram type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoxMetrics {
    /// Row pitch of class headers and members, as a factor of the font size.
    pub line_height: f64,
    pub member_font_scale: f64,
    /// Vertical padding above and below a class header.
    pub header_padding: f64,
    /// Extra height of each class section (attributes, methods).
    pub section_padding: f64,
    /// Horizontal padding inside class and entity rows.
    pub row_padding: f64,
    pub min_class_width: f64,
    pub entity_padding: f64,
    pub min_entity_width: f64,
    pub min_entity_height: f64,
    /// Padding around an edge label.
    pub edge_label_padding: f64,
    pub pseudo_state_diameter: f64,
    pub fork_bar_length: f64,
    pub fork_bar_thickness: f64,
    pub choice_size: f64,
    pub composite_header_height: f64,
    pub composite_padding: f64,
    pub cluster_padding: f64,
    pub cluster_title_height: f64,
    /// Width added on each side of a subroutine box for its inner frame lines.
    pub subroutine_frame: f64,
    /// Gap between the two rings of a double circle.
    pub double_circle_gap: f64,
    /// The cylinder cap radius is `width / 2 / (cap_base + width / cap_width_step)`.
    pub cylinder_cap_base: f64,
    pub cylinder_cap_width_step: f64,
    pub sequence: SequenceMetrics,
}

impl BoxMetrics {
    pub const STANDARD: BoxMetrics = BoxMetrics {
        line_height: 1.5,
        member_font_scale: 0.875,
        header_padding: 8.0,
        section_padding: 8.0,
        row_padding: 10.0,
        min_class_width: 100.0,
        entity_padding: 15.0,
        min_entity_width: 100.0,
        min_entity_height: 75.0,
        edge_label_padding: 4.0,
        pseudo_state_diameter: 14.0,
        fork_bar_length: 70.0,
        fork_bar_thickness: 10.0,
        choice_size: 28.0,
        composite_header_height: 28.0,
        composite_padding: 8.0,
        cluster_padding: 8.0,
        cluster_title_height: 24.0,
        subroutine_frame: 8.0,
        double_circle_gap: 5.0,
        cylinder_cap_base: 2.5,
        cylinder_cap_width_step: 50.0,
        sequence: SequenceMetrics::STANDARD,
    };
}

impl Default for BoxMetrics {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Spacing of sequence diagrams, which are positioned without the layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SequenceMetrics {
    pub actor_min_width: f64,
    pub actor_min_height: f64,
    /// Free space between neighbouring participant boxes.
    pub actor_margin: f64,
    /// Minimum vertical pitch between messages.
    pub message_margin: f64,
    /// Padding around participant, note and block labels.
    pub wrap_padding: f64,
    /// Distance between a message label and its arrow.
    pub label_gap: f64,
    /// Space above and below block frames and their headers.
    pub box_margin: f64,
    /// Horizontal inset of a block frame per nesting level below it.
    pub block_inset: f64,
    pub note_min_width: f64,
    /// Distance between a note and the lifeline it is attached to.
    pub note_margin: f64,
    pub self_loop_width: f64,
    pub self_loop_height: f64,
    pub activation_width: f64,
}

impl SequenceMetrics {
    pub const STANDARD: SequenceMetrics = SequenceMetrics {
        actor_min_width: 150.0,
        actor_min_height: 65.0,
        actor_margin: 50.0,
        message_margin: 35.0,
        wrap_padding: 10.0,
        label_gap: 4.0,
        box_margin: 10.0,
        block_inset: 11.0,
        note_min_width: 150.0,
        note_margin: 10.0,
        self_loop_width: 30.0,
        self_loop_height: 20.0,
        activation_width: 10.0,
    };
}

impl Default for SequenceMetrics {
    fn default() -> Self {
        Self::STANDARD
    }
}
