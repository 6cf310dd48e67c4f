//! Forward search: from a source line to the nodes it produced.

use crate::names::{is_equivalent_file_name, is_path_separator, path_is_absolute};
use crate::tree::{NodeId, NodeType, Tree};

/// Find the tag of the input named `name`.
///
/// Tries the name as given, then relative to the directory of `output`,
/// then, for absolute names, every shorter trailing part of the path.
pub(crate) fn resolve_tag(tree: &Tree, output: Option<&str>, name: &str) -> Option<i32> {
    if name.is_empty() || name.bytes().last().is_some_and(is_path_separator) {
        return None;
    }
    if let Some(tag) = exact_tag(tree, name) {
        return Some(tag);
    }

    if let Some(output) = output {
        let common = name
            .bytes()
            .zip(output.bytes())
            .take_while(|(a, b)| a == b)
            .count();
        let relative = name.as_bytes()[..common]
            .iter()
            .rposition(|&c| is_path_separator(c))
            .map_or(0, |pos| pos + 1);
        if relative > 0 {
            if let Some(tag) = exact_tag(tree, &name[relative..]) {
                return Some(tag);
            }
        }
    }

    if path_is_absolute(name) {
        let bytes = name.as_bytes();
        for pos in (0..bytes.len()).rev() {
            if is_path_separator(bytes[pos]) {
                if let Some(tag) = exact_tag(tree, &name[pos + 1..]) {
                    return Some(tag);
                }
            }
        }
    }
    None
}

/// Tag of the most recently declared input with an equivalent name.
fn exact_tag(tree: &Tree, name: &str) -> Option<i32> {
    tree.inputs().iter().rev().find_map(|&id| match tree.get(id).input() {
        Some((tag, input)) if is_equivalent_file_name(name, input) => Some(tag),
        _ => None,
    })
}

/// Nodes produced by `line` of input `tag`, in display order.
///
/// When the line produced nothing, the following lines are tried, at most
/// as many as there are friend buckets, or just the one line when `strong`
/// is set.
pub(crate) fn forward_nodes(tree: &Tree, tag: i32, line: i32, strong: bool) -> Vec<NodeId> {
    let span = if strong {
        1
    } else {
        i32::try_from(tree.friend_bucket_count()).unwrap_or(i32::MAX)
    };
    let end = line.saturating_add(span);
    let mut line = line;
    while line < end {
        let bucket = tree.bucket(tag, line);
        for tier in [NodeType::Boundary, NodeType::Kern, NodeType::Input] {
            let mut found: Vec<NodeId> = tree
                .friends(bucket)
                .filter(|&id| tree.kind(id) >= tier)
                .filter(|&id| {
                    tree.record(id)
                        .is_some_and(|record| record.tag == tag && record.line == line)
                })
                .collect();
            if !found.is_empty() {
                found.reverse();
                log::debug!("forward search hit {} node(s) at line {line}", found.len());
                return collapse_siblings(tree, found);
            }
        }
        line += 1;
    }
    Vec::new()
}

/// Drop nodes that live under the parent of the node kept before them.
fn collapse_siblings(tree: &Tree, nodes: Vec<NodeId>) -> Vec<NodeId> {
    let mut kept: Vec<NodeId> = Vec::with_capacity(nodes.len());
    for id in nodes {
        if let Some(&last) = kept.last() {
            let parent = tree.parent(last);
            let mut ancestor = tree.parent(id);
            let mut shares_parent = false;
            while let Some(current) = ancestor {
                if Some(current) == parent {
                    shares_parent = true;
                    break;
                }
                ancestor = tree.parent(current);
            }
            if shares_parent {
                continue;
            }
        }
        kept.push(id);
    }
    kept
}
