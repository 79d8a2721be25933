//! Result excerpts built from match positions.

use super::index::MatchData;
use super::pipeline::Position;

/// Marker wrapped around each highlighted span
pub const MARK: &str = "**";

/// Collect every recorded position of `field` across all matched terms,
/// sorted by start offset
pub fn field_positions(matches: &MatchData, field: &str) -> Vec<Position> {
    let mut positions: Vec<Position> = matches
        .values()
        .filter_map(|fields| fields.get(field))
        .flatten()
        .copied()
        .collect();
    positions.sort_by_key(|p| (p.start, p.len));
    positions.dedup();
    positions
}

/// Cut a window of `text` around the first position and mark every
/// position that falls inside it.
///
/// Without positions the excerpt is the leading `2 * radius` bytes of the
/// text. Whitespace runs collapse to single spaces; an ellipsis marks a cut.
pub fn excerpt(text: &str, positions: &[Position], radius: usize) -> String {
    let (start, end) = match positions.first() {
        Some(first) => (
            floor_boundary(text, first.start.saturating_sub(radius)),
            ceil_boundary(text, first.start + first.len + radius),
        ),
        None => (0, ceil_boundary(text, radius * 2)),
    };

    let mut out = String::new();
    let mut cursor = start;
    for pos in positions {
        let pos_end = pos.start + pos.len;
        if pos.start < cursor || pos_end > end {
            continue;
        }
        if !text.is_char_boundary(pos.start) || !text.is_char_boundary(pos_end) {
            continue;
        }
        out.push_str(&text[cursor..pos.start]);
        out.push_str(MARK);
        out.push_str(&text[pos.start..pos_end]);
        out.push_str(MARK);
        cursor = pos_end;
    }
    out.push_str(&text[cursor..end]);

    let mut collapsed = out.split_whitespace().collect::<Vec<_>>().join(" ");
    if start > 0 {
        collapsed.insert_str(0, "… ");
    }
    if end < text.len() {
        collapsed.push_str(" …");
    }
    collapsed
}

/// Excerpt of a record's body for a hit, falling back to its opening
pub fn body_excerpt(body: &str, matches: &MatchData, radius: usize) -> String {
    excerpt(body, &field_positions(matches, "body"), radius)
}

fn floor_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}
