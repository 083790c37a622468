//! Plain-text outline format ↔ MindMap.
//!
//! ```text
//! Indian Polity
//!   - Parliament
//!     - Lok Sabha
//!     - Rajya Sabha
//!   - Judiciary
//! ```
//!
//! The first non-blank line is the root. Every other line is a `- ` bullet
//! indented by two spaces per level below the root. Blank lines are skipped,
//! except that blank lines followed directly by first-level bullets stand
//! for a root with an empty label. Ids are not part of the format; parsed
//! nodes get fresh ids.

use crate::id::NodeId;
use crate::model::{MindMap, MindNode};
use petgraph::graph::NodeIndex;
use std::fmt::Write;
use winnow::combinator::opt;
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

const INDENT: usize = 2;

#[derive(Debug)]
struct OutlineLine<'a> {
    indent: usize,
    bullet: bool,
    text: &'a str,
}

fn parse_line<'a>(input: &mut &'a str) -> ModalResult<OutlineLine<'a>> {
    (
        take_while(0.., ' '),
        opt("- "),
        take_till(0.., ['\r', '\n']),
    )
        .map(
            |(indent, bullet, text): (&'a str, Option<&'a str>, &'a str)| OutlineLine {
                indent: indent.len(),
                bullet: bullet.is_some(),
                text: text.trim_end(),
            },
        )
        .parse_next(input)
}

/// Parse an outline into a tree.
///
/// # Errors
/// A message naming the 1-based line number for a missing root, an indent
/// that is not a multiple of two, a bullet that skips a level, or a
/// non-root line without a bullet.
#[must_use = "parsing result should be used"]
pub fn parse_outline(input: &str) -> Result<MindMap, String> {
    let mut lines = input
        .lines()
        .enumerate()
        .filter(|(_, raw)| !raw.trim().is_empty())
        .map(|(n, raw)| (n + 1, raw))
        .peekable();

    let &(first_no, first_raw) = lines.peek().ok_or_else(|| "outline is empty".to_string())?;
    let first = read_line(first_raw, first_no)?;
    let root_text = if first.indent == 0 {
        lines.next();
        first.text
    } else if first_no > 1 && first.bullet && first.indent == INDENT {
        // unlabeled root
        ""
    } else {
        return Err(format!("line {first_no}: root must not be indented"));
    };
    let mut map = MindMap::with_root(MindNode::new(NodeId::root(), root_text));

    // stack[d] = most recent node at depth d
    let mut stack: Vec<NodeIndex> = vec![map.root];

    for (line_no, raw) in lines {
        let line = read_line(raw, line_no)?;
        if !line.bullet {
            return Err(format!("line {line_no}: expected `- ` bullet"));
        }
        if line.indent % INDENT != 0 || line.indent == 0 {
            return Err(format!(
                "line {line_no}: indent must be a positive multiple of {INDENT} spaces"
            ));
        }
        let depth = line.indent / INDENT;
        if depth > stack.len() {
            return Err(format!("line {line_no}: indent skips a level"));
        }
        stack.truncate(depth);
        let parent = stack[depth - 1];
        let id = map.fresh_id("node");
        let idx = map
            .add_child(parent, MindNode::new(id, line.text))
            .ok_or_else(|| format!("line {line_no}: could not attach node"))?;
        stack.push(idx);
    }

    Ok(map)
}

fn read_line(raw: &str, line_no: usize) -> Result<OutlineLine<'_>, String> {
    let mut rest = raw;
    parse_line
        .parse_next(&mut rest)
        .map_err(|e| format!("line {line_no}: {e}"))
}

/// Emit a tree as an outline. Round-trips through `parse_outline` for
/// structure and labels, provided no label contains a line break.
#[must_use]
pub fn emit_outline(map: &MindMap) -> String {
    let mut out = String::with_capacity(map.node_count() * 24);
    let _ = writeln!(out, "{}", single_line(&map.root_node().text));
    for &child in map.children(map.root) {
        emit_node(&mut out, map, child, 1);
    }
    out
}

fn emit_node(out: &mut String, map: &MindMap, idx: NodeIndex, depth: usize) {
    let pad = " ".repeat(depth * INDENT);
    let _ = writeln!(out, "{pad}- {}", single_line(&map.graph[idx].text));
    for &child in map.children(idx) {
        emit_node(out, map, child, depth + 1);
    }
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}
