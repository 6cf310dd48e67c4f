//! Backward search: from a point on a page to the nodes that produced it.
//!
//! Distances are measured in engine units. A box splits the page into nine
//! regions along the lines of its edges; the distance from a point to the
//! box is zero inside, the distance to the nearest edge beside it, and the
//! sum of both offsets to the nearest corner otherwise. Glue, math and
//! boundary nodes are points, kerns are horizontal segments.

use crate::tree::{Extent, NodeId, NodeType, Tree};
use crate::types::Point;

/// Distance to nodes without a position, like sheets and inputs.
const FAR: i64 = i64::MAX;

/// Nodes closest to `hit` on `sheet`, best first. At most two nodes are
/// returned, and only when they come from different source lines.
pub(crate) fn backward_nodes(tree: &Tree, sheet: NodeId, hit: Point) -> Vec<NodeId> {
    let container = smallest_hbox_containing(tree, sheet, hit).or_else(|| tree.child(sheet));
    let Some(container) = container else {
        return Vec::new();
    };
    let container = deepest_container(tree, hit, container).unwrap_or(container);
    let closest = closest_children_in_box(tree, hit, container);

    match (closest.left, closest.right) {
        (Some(left), Some(right)) => {
            let (l, r) = (tree.record(left), tree.record(right));
            let same_line = l.map(|l| (l.tag, l.line)) == r.map(|r| (r.tag, r.line));
            let right_first = closest.left_distance > closest.right_distance;
            match (same_line, right_first) {
                (false, true) => vec![right, left],
                (false, false) => vec![left, right],
                (true, true) => vec![right],
                (true, false) => vec![left],
            }
        }
        (Some(node), None) | (None, Some(node)) => vec![node],
        (None, None) => vec![container],
    }
}

/// The narrowest hbox of the sheet whose visible rectangle holds `hit`.
/// Of two boxes of the same size the earlier one in the chain is kept.
fn smallest_hbox_containing(tree: &Tree, sheet: NodeId, hit: Point) -> Option<NodeId> {
    let mut cursor = tree.next_box(sheet);
    while let Some(id) = cursor {
        if point_in_box(tree, hit, id) {
            let mut best = id;
            let mut other = tree.next_box(id);
            while let Some(candidate) = other {
                if point_in_box(tree, hit, candidate) {
                    best = smallest_container(tree, best, candidate);
                }
                other = tree.next_box(candidate);
            }
            return Some(best);
        }
        cursor = tree.next_box(id);
    }
    None
}

/// The smaller of two boxes: narrower first, then shorter. Ties go to
/// `node`.
fn smallest_container(tree: &Tree, node: NodeId, other: NodeId) -> NodeId {
    let (a, b) = (shown_extent(tree, node), shown_extent(tree, other));
    let (wa, wb) = (a.width.unsigned_abs(), b.width.unsigned_abs());
    if wa != wb {
        return if wa < wb { node } else { other };
    }
    let ha = u64::from(a.height.unsigned_abs()) + u64::from(a.depth.unsigned_abs());
    let hb = u64::from(b.height.unsigned_abs()) + u64::from(b.depth.unsigned_abs());
    if hb < ha {
        other
    } else {
        node
    }
}

/// The visible rectangle of an hbox, the real one of anything else.
fn shown_extent(tree: &Tree, id: NodeId) -> Extent {
    if let Some(visible) = tree.visible(id) {
        return *visible;
    }
    let record = tree.record(id).copied().unwrap_or_default();
    Extent {
        horiz: record.horiz,
        vert: record.vert,
        width: record.width,
        height: record.height,
        depth: record.depth,
    }
}

fn point_in_box(tree: &Tree, hit: Point, id: NodeId) -> bool {
    h_distance(tree, hit, id) == 0 && v_distance(tree, hit, id) == 0
}

/// Signed horizontal distance from `hit` to the node: positive when the
/// node is to the right.
pub(crate) fn h_distance(tree: &Tree, hit: Point, id: NodeId) -> i64 {
    let Some(record) = tree.record(id) else {
        return FAR;
    };
    let h = i64::from(hit.h);
    let horiz = i64::from(record.horiz);
    let width = i64::from(record.width);
    match tree.kind(id) {
        NodeType::HBox | NodeType::VBox | NodeType::VoidVBox | NodeType::VoidHBox => {
            let extent = shown_extent(tree, id);
            let min = i64::from(extent.horiz);
            let max = min + i64::from(extent.width).abs();
            if h < min {
                min - h
            } else if h > max {
                max - h
            } else {
                0
            }
        }
        NodeType::Kern => {
            let (min, max) = kern_span(horiz, width);
            let med = (min + max) / 2;
            // Kerns lose ties against overlapping nodes.
            if h < min {
                min - h + 1
            } else if h > max {
                max - h - 1
            } else if h > med {
                max - h + 1
            } else {
                min - h - 1
            }
        }
        NodeType::Glue | NodeType::Math | NodeType::Boundary => horiz - h,
        NodeType::Input | NodeType::Sheet => FAR,
    }
}

/// Signed vertical distance from `hit` to the node: positive when the node
/// is below.
pub(crate) fn v_distance(tree: &Tree, hit: Point, id: NodeId) -> i64 {
    let Some(record) = tree.record(id) else {
        return FAR;
    };
    let v = i64::from(hit.v);
    match tree.kind(id) {
        NodeType::HBox | NodeType::VBox | NodeType::VoidVBox | NodeType::VoidHBox => {
            let extent = shown_extent(tree, id);
            let vert = i64::from(extent.vert);
            let min = vert - i64::from(extent.height).abs();
            let max = vert + i64::from(extent.depth).abs();
            if v < min {
                min - v
            } else if v > max {
                max - v
            } else {
                0
            }
        }
        NodeType::Kern | NodeType::Glue | NodeType::Math | NodeType::Boundary => {
            i64::from(record.vert) - v
        }
        NodeType::Input | NodeType::Sheet => FAR,
    }
}

/// Unsigned distance from `hit` to the node, using real dimensions.
pub(crate) fn distance_to_point(tree: &Tree, hit: Point, id: NodeId) -> i64 {
    let Some(record) = tree.record(id) else {
        return FAR;
    };
    let (h, v) = (i64::from(hit.h), i64::from(hit.v));
    let horiz = i64::from(record.horiz);
    let vert = i64::from(record.vert);
    match tree.kind(id) {
        NodeType::HBox | NodeType::VBox | NodeType::VoidVBox | NodeType::VoidHBox => {
            let min_h = horiz;
            let max_h = horiz + i64::from(record.width).abs();
            let min_v = vert - i64::from(record.height).abs();
            let max_v = vert + i64::from(record.depth).abs();
            let dh = if h < min_h {
                min_h - h
            } else if h > max_h {
                h - max_h
            } else {
                0
            };
            let dv = if v < min_v {
                min_v - v
            } else if v > max_v {
                v - max_v
            } else {
                0
            };
            dh + dv
        }
        NodeType::Kern => {
            let (min_h, max_h) = kern_span(horiz, i64::from(record.width));
            let dh = if h < min_h {
                min_h - h
            } else if h > max_h {
                h - max_h
            } else {
                0
            };
            dh + (v - vert).abs()
        }
        NodeType::Glue | NodeType::Math | NodeType::Boundary => (h - horiz).abs() + (v - vert).abs(),
        NodeType::Input | NodeType::Sheet => FAR,
    }
}

/// Horizontal span of a kern: it ends at its position when its width is
/// positive and starts there otherwise.
fn kern_span(horiz: i64, width: i64) -> (i64, i64) {
    if width < 0 {
        (horiz, horiz - width)
    } else {
        (horiz - width, horiz)
    }
}

/// The innermost box under `node` that holds `hit`.
///
/// Inside a vbox the child with children closest to the point is preferred
/// over the vbox itself.
fn deepest_container(tree: &Tree, hit: Point, node: NodeId) -> Option<NodeId> {
    let kind = tree.kind(node);
    if kind != NodeType::VBox && kind != NodeType::HBox {
        return None;
    }
    for child in tree.children(node) {
        if let Some(found) = deepest_container(tree, hit, child) {
            return Some(found);
        }
    }
    if !point_in_box(tree, hit, node) {
        return None;
    }
    if kind == NodeType::VBox {
        let mut best = node;
        let mut best_distance = FAR;
        for child in tree.children(node) {
            if tree.child(child).is_some() {
                let distance = distance_to_point(tree, hit, child);
                if distance < best_distance {
                    best_distance = distance;
                    best = child;
                }
            }
        }
        return Some(best);
    }
    Some(node)
}

/// Closest children of a box on each side of the hit point.
#[derive(Debug, Clone, Copy)]
struct Closest {
    left: Option<NodeId>,
    right: Option<NodeId>,
    left_distance: i64,
    right_distance: i64,
}

/// Find the children of `node` closest to `hit` along the box axis, then
/// narrow each side that was found down to a leaf.
fn closest_children_in_box(tree: &Tree, hit: Point, node: NodeId) -> Closest {
    let mut closest = Closest {
        left: None,
        right: None,
        left_distance: FAR,
        right_distance: FAR,
    };
    let distance: fn(&Tree, Point, NodeId) -> i64 = match tree.kind(node) {
        NodeType::HBox => h_distance,
        NodeType::VBox => v_distance,
        _ => return closest,
    };

    let (mut left_found, mut right_found) = (false, false);
    for child in tree.children(node) {
        let offset = distance(tree, hit, child);
        if offset > 0 {
            if wins(tree, child, offset, closest.right, closest.right_distance) {
                closest.right = Some(child);
                closest.right_distance = offset;
                right_found = true;
            }
        } else if offset == 0 {
            closest.left = Some(child);
            closest.right = None;
            closest.left_distance = 0;
            closest.right_distance = 0;
            left_found = true;
        } else {
            let offset = -offset;
            if wins(tree, child, offset, closest.left, closest.left_distance) {
                closest.left = Some(child);
                closest.left_distance = offset;
                left_found = true;
            }
        }
    }

    if left_found {
        closest.left = closest.left.map(|n| narrow(tree, hit, n));
    }
    if right_found {
        closest.right = closest.right.map(|n| narrow(tree, hit, n));
    }
    closest
}

/// Whether `candidate` at `distance` beats the current best. Equal
/// distances go to the earlier line of the same input.
fn wins(tree: &Tree, candidate: NodeId, distance: i64, best: Option<NodeId>, best_distance: i64) -> bool {
    if distance < best_distance {
        return true;
    }
    if distance > best_distance {
        return false;
    }
    match (best.and_then(|b| tree.record(b)), tree.record(candidate)) {
        (Some(best), Some(candidate)) => candidate.tag == best.tag && candidate.line < best.line,
        _ => false,
    }
}

fn narrow(tree: &Tree, hit: Point, node: NodeId) -> NodeId {
    let node = deepest_container(tree, hit, node).unwrap_or(node);
    closest_child(tree, hit, node).unwrap_or(node)
}

/// The descendant of `node` closest to `hit`. When that is a box with
/// children, the closest of its direct children after the first one.
fn closest_child(tree: &Tree, hit: Point, node: NodeId) -> Option<NodeId> {
    let mut best_distance = FAR;
    let mut best = closest_descendant(tree, hit, node, &mut best_distance)?;
    if matches!(tree.kind(best), NodeType::VBox | NodeType::HBox) {
        let mut children = tree.children(best);
        if let Some(first) = children.next() {
            let mut best_distance = distance_to_point(tree, hit, first);
            for child in children {
                let distance = distance_to_point(tree, hit, child);
                if distance <= best_distance {
                    best_distance = distance;
                    best = child;
                }
            }
        }
    }
    Some(best)
}

/// Depth first walk keeping the last node at the smallest distance seen.
fn closest_descendant(tree: &Tree, hit: Point, node: NodeId, best_distance: &mut i64) -> Option<NodeId> {
    let mut best = None;
    for child in tree.children(node) {
        let distance = distance_to_point(tree, hit, child);
        if distance <= *best_distance {
            *best_distance = distance;
            best = Some(child);
        }
        if matches!(tree.kind(child), NodeType::VBox | NodeType::HBox) {
            if let Some(candidate) = closest_descendant(tree, hit, child, best_distance) {
                best = Some(candidate);
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::parser::parse;
    use crate::reader::SyncReader;

    const HEAD: &str = "SyncTeX Version:1\nInput:1:/a.tex\nOutput:pdf\nMagnification:1000\nUnit:1\nX Offset:0\nY Offset:0\nContent:\n";

    fn tree(content: &str) -> Tree {
        let data = format!("{HEAD}{content}Postamble:\nCount:1\n");
        let mut reader = SyncReader::new(Box::new(Cursor::new(data.into_bytes())));
        parse(&mut reader, 1024).unwrap().0
    }

    fn first(tree: &Tree) -> NodeId {
        tree.child(tree.sheets()[0]).unwrap()
    }

    fn at(h: i32, v: i32) -> Point {
        Point { h, v }
    }

    fn lines(tree: &Tree, nodes: &[NodeId]) -> Vec<i32> {
        nodes.iter().map(|&id| tree.record(id).unwrap().line).collect()
    }

    #[test]
    fn test_box_distances() {
        let tree = tree("{1\n(1,1:100,200:50,20,5\n)\n}\n");
        let hbox = first(&tree);
        assert_eq!(h_distance(&tree, at(90, 200), hbox), 10);
        assert_eq!(h_distance(&tree, at(160, 200), hbox), -10);
        assert_eq!(h_distance(&tree, at(120, 0), hbox), 0);
        assert_eq!(v_distance(&tree, at(120, 170), hbox), 10);
        assert_eq!(v_distance(&tree, at(120, 210), hbox), -5);
        assert!(point_in_box(&tree, at(150, 205), hbox));
        // Corner regions add both offsets.
        assert_eq!(distance_to_point(&tree, at(90, 170), hbox), 20);
        assert_eq!(distance_to_point(&tree, at(160, 200), hbox), 10);
        assert_eq!(distance_to_point(&tree, at(120, 190), hbox), 0);
    }

    #[test]
    fn test_kern_distances() {
        let tree = tree("{1\n(1,1:0,0:100,10,0\nk1,2:50,0:10\n)\n}\n");
        let kern = tree.child(first(&tree)).unwrap();
        // The kern spans [40, 50], its middle is 45.
        assert_eq!(h_distance(&tree, at(30, 0), kern), 11);
        assert_eq!(h_distance(&tree, at(60, 0), kern), -11);
        assert_eq!(h_distance(&tree, at(48, 0), kern), 3);
        assert_eq!(h_distance(&tree, at(42, 0), kern), -3);
        assert_eq!(distance_to_point(&tree, at(45, 7), kern), 7);
        assert_eq!(distance_to_point(&tree, at(30, -2), kern), 12);
    }

    #[test]
    fn test_points_and_sheets() {
        let tree = tree("{1\n(1,1:0,0:100,10,0\ng1,2:50,5\n)\n}\n");
        let glue = tree.child(first(&tree)).unwrap();
        assert_eq!(h_distance(&tree, at(40, 0), glue), 10);
        assert_eq!(v_distance(&tree, at(40, 8), glue), -3);
        assert_eq!(distance_to_point(&tree, at(40, 8), glue), 13);
        let sheet = tree.sheets()[0];
        assert_eq!(distance_to_point(&tree, at(0, 0), sheet), FAR);
    }

    #[test]
    fn test_hit_between_words() {
        let tree = tree(
            "{1\n(1,1:0,100:1000,10,2\ng1,3:100,100\ng1,4:200,100\ng1,5:300,100\n)\n}\n",
        );
        let found = backward_nodes(&tree, tree.sheets()[0], at(190, 100));
        assert_eq!(lines(&tree, &found), vec![4, 3]);
        let found = backward_nodes(&tree, tree.sheets()[0], at(110, 100));
        assert_eq!(lines(&tree, &found), vec![3, 4]);
    }

    #[test]
    fn test_hit_prefers_innermost_box() {
        let tree = tree(
            "{1\n[1,1:0,0:1000,0,500\n(1,2:0,100:1000,10,2\ng1,2:100,100\n)\n(1,7:0,200:1000,10,2\n(1,8:400,200:100,10,2\ng1,8:450,200\n)\n)\n]\n}\n",
        );
        let found = backward_nodes(&tree, tree.sheets()[0], at(460, 198));
        assert_eq!(lines(&tree, &found), vec![8]);
    }

    #[test]
    fn test_hit_outside_every_box() {
        let tree = tree("{1\n(1,1:0,100:100,10,2\ng1,6:50,100\n)\n}\n");
        let found = backward_nodes(&tree, tree.sheets()[0], at(500, 500));
        assert_eq!(lines(&tree, &found), vec![6]);
    }

    #[test]
    fn test_empty_sheet() {
        let tree = tree("{1\n}\n");
        assert!(backward_nodes(&tree, tree.sheets()[0], at(0, 0)).is_empty());
    }

    #[test]
    fn test_identical_boxes_keep_the_first() {
        let tree = tree("{1\n(1,1:0,100:100,10,2\ng1,11:50,100\n)\n(1,2:0,100:100,10,2\ng1,22:50,100\n)\n}\n");
        let found = backward_nodes(&tree, tree.sheets()[0], at(50, 100));
        assert_eq!(lines(&tree, &found), vec![11]);
    }

    #[test]
    fn test_same_line_on_both_sides_keeps_closer() {
        let tree = tree("{1\n(1,1:0,100:1000,10,2\ng1,3:100,100\ng1,3:300,100\n)\n}\n");
        let found = backward_nodes(&tree, tree.sheets()[0], at(250, 100));
        assert_eq!(found.len(), 1);
        assert_eq!(tree.record(found[0]).unwrap().horiz, 300);

        let found = backward_nodes(&tree, tree.sheets()[0], at(150, 100));
        assert_eq!(found.len(), 1);
        assert_eq!(tree.record(found[0]).unwrap().horiz, 100);
    }

    #[test]
    fn test_equal_distance_prefers_earlier_line() {
        let tree = tree("{1\n(1,1:0,100:1000,10,2\ng1,5:100,100\ng1,4:100,100\ng1,6:100,100\n)\n}\n");
        let found = backward_nodes(&tree, tree.sheets()[0], at(300, 100));
        assert_eq!(lines(&tree, &found), vec![4]);
    }

    #[test]
    fn test_smallest_container_prefers_narrow_then_short() {
        let tree = tree(
            "{1\n(1,1:0,0:100,10,10\n)\n(1,2:0,0:50,10,10\n)\n(1,3:0,0:50,5,5\n)\n(1,4:0,0:50,5,5\n)\n}\n",
        );
        let boxes: Vec<NodeId> = tree.children(tree.sheets()[0]).collect();
        assert_eq!(smallest_container(&tree, boxes[0], boxes[1]), boxes[1]);
        assert_eq!(smallest_container(&tree, boxes[1], boxes[2]), boxes[2]);
        assert_eq!(smallest_container(&tree, boxes[2], boxes[3]), boxes[2]);
    }
}
