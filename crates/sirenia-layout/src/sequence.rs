//! Sequence diagrams are positioned directly: participants on a row, events stacked below in
//! source order. No layout engine is involved.

use crate::model::{
    Extent, Point, PositionedActivation, PositionedBlock, PositionedMessage, PositionedNote,
    PositionedParticipant, PositionedSection, Rect, SequenceLayout, Translate,
};
use crate::config::SequenceMetrics;
use crate::{LayoutContext, Result};
use rustc_hash::FxHashMap;
use sirenia_core::diagrams::sequence::{NotePlacement, SequenceAst, SequenceEvent};

/// Vertical walk order: events interleaved with block boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Open(usize),
    Section(usize, usize),
    Close(usize),
    Event(usize),
}

fn walk_marks(ast: &SequenceAst) -> Vec<Mark> {
    let roots: Vec<usize> = ast
        .blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| b.parent.is_none())
        .map(|(idx, _)| idx)
        .collect();
    let mut out = Vec::with_capacity(ast.events.len() + ast.blocks.len() * 2);
    emit_span(ast, 0, ast.events.len(), &roots, &mut out);
    out
}

fn emit_span(ast: &SequenceAst, start: usize, end: usize, blocks: &[usize], out: &mut Vec<Mark>) {
    let mut k = start;
    for &b in blocks {
        let block = &ast.blocks[b];
        if block.start < k || block.end > end {
            continue;
        }
        out.extend((k..block.start).map(Mark::Event));
        out.push(Mark::Open(b));
        for (s, section) in block.sections.iter().enumerate() {
            let section_end = block
                .sections
                .get(s + 1)
                .map(|next| next.start)
                .unwrap_or(block.end);
            if s > 0 {
                out.push(Mark::Section(b, s));
            }
            // A child opened right at a section boundary counts toward the later section.
            let is_last = s + 1 == block.sections.len();
            let children: Vec<usize> = block
                .children
                .iter()
                .copied()
                .filter(|&c| {
                    let cs = ast.blocks[c].start;
                    cs >= section.start && (cs < section_end || (is_last && cs == section_end))
                })
                .collect();
            emit_span(ast, section.start, section_end, &children, out);
        }
        out.push(Mark::Close(b));
        k = block.end;
    }
    out.extend((k..end).map(Mark::Event));
}

struct OpenFrame {
    top: f64,
    sections: Vec<PositionedSection>,
}

pub(crate) fn layout_sequence(
    ast: &SequenceAst,
    ctx: &LayoutContext<'_>,
) -> Result<(SequenceLayout, f64, f64)> {
    let sizer = &ctx.sizer;
    let sm = ctx.metrics().sequence;
    let n = ast.participants.len();
    let index: FxHashMap<&str, usize> = ast
        .participants
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id.as_str(), i))
        .collect();

    let mut widths = Vec::with_capacity(n);
    let mut actor_height = sm.actor_min_height;
    for p in &ast.participants {
        let t = sizer.text(&p.label);
        widths.push((t.width + 2.0 * sm.wrap_padding).max(sm.actor_min_width));
        actor_height = actor_height.max(t.height + 2.0 * sm.wrap_padding);
    }

    // Distance between neighbouring lifelines, widened for whatever has to fit between them.
    let mut gaps: Vec<f64> = (1..n)
        .map(|i| widths[i - 1] / 2.0 + widths[i] / 2.0 + sm.actor_margin)
        .collect();
    let note_width =
        |text: &str| (sizer.text(text).width + 2.0 * sm.wrap_padding).max(sm.note_min_width);
    for event in &ast.events {
        match event {
            SequenceEvent::Message(m) => {
                let (Some(&a), Some(&b)) = (index.get(m.from.as_str()), index.get(m.to.as_str()))
                else {
                    continue;
                };
                let label_w = sizer.text(&m.text).width;
                if a == b {
                    let need =
                        sm.activation_width + sm.self_loop_width + label_w + 2.0 * sm.wrap_padding;
                    if let Some(g) = gaps.get_mut(a) {
                        *g = g.max(need);
                    }
                    continue;
                }
                let (lo, hi) = (a.min(b), a.max(b));
                let need = label_w + 2.0 * sm.wrap_padding + sm.activation_width;
                let have: f64 = gaps[lo..hi].iter().sum();
                if have < need {
                    gaps[hi - 1] += need - have;
                }
            }
            SequenceEvent::Note(note) => {
                let Some(&p) = note.participants.first().and_then(|id| index.get(id.as_str()))
                else {
                    continue;
                };
                let need = note_width(&note.text) + 2.0 * sm.note_margin;
                let slot = match note.placement {
                    NotePlacement::RightOf => Some(p),
                    NotePlacement::LeftOf => p.checked_sub(1),
                    NotePlacement::Over => None,
                };
                if let Some(g) = slot.and_then(|s| gaps.get_mut(s)) {
                    *g = g.max(need);
                }
            }
        }
    }
    let mut centers = Vec::with_capacity(n);
    let mut x = widths.first().map(|w| w / 2.0).unwrap_or(0.0);
    for i in 0..n {
        centers.push(x);
        if let Some(g) = gaps.get(i) {
            x += g;
        }
    }

    // Activation bar span of participant `p` at event `k`.
    let bar_span = |p: usize, k: usize| -> (f64, f64) {
        let id = ast.participants[p].id.as_str();
        let cx = centers[p];
        let depth = ast
            .activations
            .iter()
            .filter(|a| a.participant == id && a.start <= k && k <= a.end)
            .map(|a| a.depth)
            .max();
        match depth {
            Some(d) => {
                let left = cx - sm.activation_width / 2.0 + d as f64 * sm.activation_width / 2.0;
                (left, left + sm.activation_width)
            }
            None => (cx, cx),
        }
    };

    let body_top = actor_height;
    let mut cursor = body_top;
    let mut event_top = vec![body_top; ast.events.len()];
    let mut event_bottom = vec![body_top; ast.events.len()];
    let mut event_x: Vec<Option<(f64, f64)>> = vec![None; ast.events.len()];
    let mut messages = Vec::new();
    let mut notes = Vec::new();
    let mut open: FxHashMap<usize, OpenFrame> = FxHashMap::default();
    let mut frames: FxHashMap<usize, (f64, f64, Vec<PositionedSection>)> = FxHashMap::default();
    let mut extent = Extent::default();

    for mark in walk_marks(ast) {
        match mark {
            Mark::Open(b) => {
                let block = &ast.blocks[b];
                let label = block.sections.first().map(|s| s.label.as_str()).unwrap_or("");
                cursor += sm.box_margin;
                let top = cursor;
                let title = sizer.text(&format!("{} {label}", block.kind.keyword()));
                cursor += header_height(&sm, title.height);
                open.insert(
                    b,
                    OpenFrame {
                        top,
                        sections: vec![PositionedSection {
                            label: label.to_string(),
                            y: top,
                        }],
                    },
                );
            }
            Mark::Section(b, s) => {
                let label = ast.blocks[b]
                    .sections
                    .get(s)
                    .map(|sec| sec.label.as_str())
                    .unwrap_or("");
                cursor += sm.box_margin / 2.0;
                if let Some(frame) = open.get_mut(&b) {
                    frame.sections.push(PositionedSection {
                        label: label.to_string(),
                        y: cursor,
                    });
                }
                cursor += header_height(&sm, sizer.text(label).height);
            }
            Mark::Close(b) => {
                cursor += sm.box_margin;
                if let Some(frame) = open.remove(&b) {
                    frames.insert(b, (frame.top, cursor, frame.sections));
                }
            }
            Mark::Event(k) => match &ast.events[k] {
                SequenceEvent::Message(m) => {
                    let (Some(&a), Some(&b)) =
                        (index.get(m.from.as_str()), index.get(m.to.as_str()))
                    else {
                        continue;
                    };
                    let text = sizer.text(&m.text);
                    cursor += sm.message_margin.max(text.height + 2.0 * sm.label_gap);
                    let y = cursor;
                    event_top[k] = y;
                    let (points, anchor) = if a == b {
                        let x0 = bar_span(a, k).1;
                        let x1 = x0 + sm.self_loop_width;
                        let points = vec![
                            Point::new(x0, y),
                            Point::new(x1, y),
                            Point::new(x1, y + sm.self_loop_height),
                            Point::new(x0, y + sm.self_loop_height),
                        ];
                        cursor += sm.self_loop_height;
                        let anchor = Point::new(
                            x1 + sm.label_gap + text.width / 2.0,
                            y + sm.self_loop_height / 2.0,
                        );
                        (points, anchor)
                    } else {
                        let (start, end) = if centers[a] < centers[b] {
                            (bar_span(a, k).1, bar_span(b, k).0)
                        } else {
                            (bar_span(a, k).0, bar_span(b, k).1)
                        };
                        let anchor = Point::new(
                            (start + end) / 2.0,
                            y - sm.label_gap - text.height / 2.0,
                        );
                        (vec![Point::new(start, y), Point::new(end, y)], anchor)
                    };
                    event_bottom[k] = cursor;
                    let mut span = Extent::default();
                    span.points(&points);
                    span.label(Some(anchor), (text.width, text.height));
                    event_x[k] = span.bounds().map(|b| (b.min_x, b.max_x));
                    extent.points(&points);
                    extent.label(Some(anchor), (text.width, text.height));
                    messages.push(PositionedMessage {
                        from: m.from.clone(),
                        to: m.to.clone(),
                        kind: m.kind,
                        text: m.text.clone(),
                        number: m.number,
                        points,
                        label_anchor: anchor,
                    });
                }
                SequenceEvent::Note(note) => {
                    let idx: Vec<usize> = note
                        .participants
                        .iter()
                        .filter_map(|id| index.get(id.as_str()).copied())
                        .collect();
                    let Some(&first) = idx.first() else {
                        continue;
                    };
                    let text = sizer.text(&note.text);
                    let height = text.height + 2.0 * sm.wrap_padding;
                    let (x, width) = match note.placement {
                        NotePlacement::LeftOf => {
                            let width = note_width(&note.text);
                            (centers[first] - sm.note_margin - width, width)
                        }
                        NotePlacement::RightOf => {
                            (centers[first] + sm.note_margin, note_width(&note.text))
                        }
                        NotePlacement::Over => {
                            let lo = idx.iter().map(|&i| centers[i]).fold(f64::INFINITY, f64::min);
                            let hi = idx
                                .iter()
                                .map(|&i| centers[i])
                                .fold(f64::NEG_INFINITY, f64::max);
                            // A note spanning two lifelines overhangs both of them.
                            let width = if idx.len() > 1 {
                                note_width(&note.text).max(hi - lo + sm.actor_margin)
                            } else {
                                note_width(&note.text)
                            };
                            ((lo + hi) / 2.0 - width / 2.0, width)
                        }
                    };
                    cursor += sm.note_margin;
                    let rect = Rect {
                        x,
                        y: cursor,
                        width,
                        height,
                    };
                    event_top[k] = cursor;
                    cursor += height;
                    event_bottom[k] = cursor;
                    event_x[k] = Some((rect.x, rect.x + rect.width));
                    extent.rect(rect.x, rect.y, rect.width, rect.height);
                    notes.push(PositionedNote {
                        placement: note.placement,
                        participants: note.participants.clone(),
                        text: note.text.clone(),
                        rect,
                    });
                }
            },
        }
    }

    cursor += sm.message_margin;
    let bottom_y = cursor;
    let mut participants = Vec::with_capacity(n);
    for (i, p) in ast.participants.iter().enumerate() {
        let top = Rect::centered(
            Point::new(centers[i], actor_height / 2.0),
            widths[i],
            actor_height,
        );
        let bottom = Rect {
            y: bottom_y,
            ..top
        };
        extent.rect(top.x, top.y, top.width, top.height);
        extent.rect(bottom.x, bottom.y, bottom.width, bottom.height);
        participants.push(PositionedParticipant {
            id: p.id.clone(),
            label: p.label.clone(),
            kind: p.kind,
            top,
            bottom,
            lifeline_x: centers[i],
        });
    }

    let mut activations = Vec::with_capacity(ast.activations.len());
    for a in &ast.activations {
        let Some(&p) = index.get(a.participant.as_str()) else {
            continue;
        };
        let left =
            centers[p] - sm.activation_width / 2.0 + a.depth as f64 * sm.activation_width / 2.0;
        let top = event_top.get(a.start).copied().unwrap_or(body_top);
        let bottom = event_bottom
            .get(a.end)
            .copied()
            .unwrap_or(top)
            .max(top + sm.activation_width);
        let rect = Rect {
            x: left,
            y: top,
            width: sm.activation_width,
            height: bottom - top,
        };
        extent.rect(rect.x, rect.y, rect.width, rect.height);
        activations.push(PositionedActivation {
            participant: a.participant.clone(),
            depth: a.depth,
            rect,
        });
    }

    let blocks = place_blocks(ast, frames, &event_x, &centers, ctx);
    for b in &blocks {
        extent.rect(b.rect.x, b.rect.y, b.rect.width, b.rect.height);
    }

    let mut layout = SequenceLayout {
        participants,
        messages,
        activations,
        notes,
        blocks,
    };
    let frame = extent.frame(ctx.config.diagram_padding);
    layout.translate(frame.dx, frame.dy);
    tracing::debug!(
        participants = n,
        messages = layout.messages.len(),
        blocks = layout.blocks.len(),
        "sequence positioned"
    );
    Ok((layout, frame.width, frame.height))
}

fn header_height(sm: &SequenceMetrics, text_height: f64) -> f64 {
    text_height + sm.box_margin
}

/// Frames get the horizontal extent of the events they cover, inset once per nesting level
/// below them so inner frames stay inside outer ones.
fn place_blocks(
    ast: &SequenceAst,
    mut frames: FxHashMap<usize, (f64, f64, Vec<PositionedSection>)>,
    event_x: &[Option<(f64, f64)>],
    centers: &[f64],
    ctx: &LayoutContext<'_>,
) -> Vec<PositionedBlock> {
    let mut levels_below = vec![0usize; ast.blocks.len()];
    for idx in (0..ast.blocks.len()).rev() {
        levels_below[idx] = ast.blocks[idx]
            .children
            .iter()
            .filter_map(|&c| levels_below.get(c).map(|l| l + 1))
            .max()
            .unwrap_or(0);
    }
    let sm = ctx.metrics().sequence;
    let all_lo = centers.iter().copied().fold(f64::INFINITY, f64::min);
    let all_hi = centers.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut out = Vec::with_capacity(ast.blocks.len());
    for (idx, block) in ast.blocks.iter().enumerate() {
        let Some((top, bottom, sections)) = frames.remove(&idx) else {
            continue;
        };
        let covered = event_x
            .get(block.start..block.end)
            .unwrap_or_default()
            .iter()
            .flatten()
            .fold(None, |acc: Option<(f64, f64)>, &(lo, hi)| match acc {
                Some((a, b)) => Some((a.min(lo), b.max(hi))),
                None => Some((lo, hi)),
            });
        let (lo, hi) = covered.unwrap_or(if all_lo.is_finite() {
            (all_lo, all_hi)
        } else {
            (0.0, 0.0)
        });
        let inset = sm.block_inset * (1 + levels_below[idx]) as f64;
        let label = format!(
            "{} {}",
            block.kind.keyword(),
            sections.first().map(|s| s.label.as_str()).unwrap_or("")
        );
        let min_width = ctx.sizer.text(&label).width + 2.0 * sm.wrap_padding;
        let width = (hi - lo + 2.0 * inset).max(min_width);
        out.push(PositionedBlock {
            kind: block.kind,
            depth: block.depth(&ast.blocks),
            rect: Rect {
                x: lo - inset,
                y: top,
                width,
                height: bottom - top,
            },
            sections,
        });
    }
    out
}
