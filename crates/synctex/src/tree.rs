use std::fmt;

use crate::types::Geometry;

/// Number of friend buckets unless configured otherwise.
pub const DEFAULT_FRIEND_BUCKETS: usize = 1024;

// === Node types ===

/// Index of a node in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The kinds of node a synctex file describes.
///
/// The declaration order matters: forward queries prefer nodes of the
/// highest kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeType {
    Input,
    Sheet,
    VBox,
    VoidVBox,
    HBox,
    VoidHBox,
    Kern,
    Glue,
    Math,
    Boundary,
}

/// Static description of a node type.
#[derive(Debug)]
pub struct NodeClass {
    pub isa: &'static str,
    /// Integer fields of the record line, tag and line included.
    pub fields: usize,
    pub has_parent: bool,
    pub has_child: bool,
    pub has_friend: bool,
    pub has_next_box: bool,
}

const fn class(
    isa: &'static str,
    fields: usize,
    has_parent: bool,
    has_child: bool,
    has_friend: bool,
    has_next_box: bool,
) -> NodeClass {
    NodeClass {
        isa,
        fields,
        has_parent,
        has_child,
        has_friend,
        has_next_box,
    }
}

static CLASSES: [NodeClass; 10] = [
    class("input", 1, false, false, false, false),
    class("sheet", 1, false, true, false, true),
    class("vbox", 7, true, true, true, false),
    class("void vbox", 7, true, false, true, false),
    class("hbox", 7, true, true, true, true),
    class("void hbox", 7, true, false, true, false),
    class("kern", 5, true, false, true, false),
    class("glue", 4, true, false, true, false),
    class("math", 4, true, false, true, false),
    class("boundary", 4, true, false, true, false),
];

impl NodeType {
    pub fn class(self) -> &'static NodeClass {
        &CLASSES[self as usize]
    }

    pub fn isa(self) -> &'static str {
        self.class().isa
    }

    pub fn is_box(self) -> bool {
        matches!(
            self,
            NodeType::VBox | NodeType::VoidVBox | NodeType::HBox | NodeType::VoidHBox
        )
    }
}

/// Integer fields of a box, kern, glue, math or boundary record.
///
/// Fields a record type does not carry stay zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Record {
    pub tag: i32,
    pub line: i32,
    pub horiz: i32,
    pub vert: i32,
    pub width: i32,
    pub height: i32,
    pub depth: i32,
}

impl Record {
    /// Build a record from the decoded fields, in file order.
    pub fn from_fields(fields: &[i32]) -> Self {
        let at = |i: usize| fields.get(i).copied().unwrap_or(0);
        Self {
            tag: at(0),
            line: at(1),
            horiz: at(2),
            vert: at(3),
            width: at(4),
            height: at(5),
            depth: at(6),
        }
    }
}

/// The visible rectangle of an hbox, grown to cover its content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extent {
    pub horiz: i32,
    pub vert: i32,
    pub width: i32,
    pub height: i32,
    pub depth: i32,
}

impl Extent {
    fn of(record: &Record) -> Self {
        Self {
            horiz: record.horiz,
            vert: record.vert,
            width: record.width,
            height: record.height,
            depth: record.depth,
        }
    }

    /// Widen the horizontal span so that it covers `h`.
    fn cover(&mut self, h: i32) {
        if self.width < 0 {
            let top = self.horiz.saturating_sub(self.width);
            if h < self.horiz {
                self.horiz = h;
                self.width = h.saturating_sub(top);
            } else if h > top {
                self.width = self.horiz.saturating_sub(h);
            }
        } else {
            let top = self.horiz.saturating_add(self.width);
            if h < self.horiz {
                self.horiz = h;
                self.width = top.saturating_sub(h);
            } else if h > top {
                self.width = h.saturating_sub(self.horiz);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Payload {
    Sheet { page: i32 },
    Input { tag: i32, name: String },
    Record(Record),
    HBox { record: Record, visible: Extent },
}

#[derive(Debug, Clone, Default)]
struct Links {
    parent: Option<NodeId>,
    child: Option<NodeId>,
    sibling: Option<NodeId>,
    friend: Option<NodeId>,
    next_box: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    kind: NodeType,
    payload: Payload,
    links: Links,
}

impl Node {
    fn record(&self) -> Option<&Record> {
        match &self.payload {
            Payload::Record(record) | Payload::HBox { record, .. } => Some(record),
            _ => None,
        }
    }

    pub(crate) fn input(&self) -> Option<(i32, &str)> {
        match &self.payload {
            Payload::Input { tag, name } => Some((*tag, name.as_str())),
            _ => None,
        }
    }
}

// === Tree ===

/// Every node of a parsed synctex file.
///
/// Nodes are stored in an arena and refer to each other by [`NodeId`].
/// Sheets and inputs are kept in file order.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    sheets: Vec<NodeId>,
    inputs: Vec<NodeId>,
    friends: Vec<Option<NodeId>>,
}

impl Tree {
    pub fn new(friend_buckets: usize) -> Self {
        Self {
            nodes: Vec::new(),
            sheets: Vec::new(),
            inputs: Vec::new(),
            friends: vec![None; friend_buckets.max(1)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `id` belongs to this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn sheets(&self) -> &[NodeId] {
        &self.sheets
    }

    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn friend_bucket_count(&self) -> usize {
        self.friends.len()
    }

    /// Bucket of the friend index that holds nodes for `(tag, line)`.
    pub fn bucket(&self, tag: i32, line: i32) -> usize {
        let n = self.friends.len() as i64;
        (i64::from(tag) + i64::from(line)).rem_euclid(n) as usize
    }

    /// Nodes of one friend bucket, most recently added first.
    pub fn friends(&self, bucket: usize) -> Friends<'_> {
        Friends {
            tree: self,
            next: self.friends.get(bucket).copied().flatten(),
        }
    }

    pub(crate) fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> NodeType {
        self.get(id).kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).links.parent
    }

    pub fn child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).links.child
    }

    pub fn sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).links.sibling
    }

    pub fn friend(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).links.friend
    }

    pub fn next_box(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).links.next_box
    }

    /// Direct children of a node, in file order.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.child(id),
        }
    }

    /// The record of a box, kern, glue, math or boundary node.
    pub fn record(&self, id: NodeId) -> Option<&Record> {
        self.get(id).record()
    }

    /// The visible rectangle of an hbox.
    pub fn visible(&self, id: NodeId) -> Option<&Extent> {
        match &self.get(id).payload {
            Payload::HBox { visible, .. } => Some(visible),
            _ => None,
        }
    }

    // === Construction ===

    pub(crate) fn add_input(&mut self, tag: i32, name: String) -> NodeId {
        let id = self.push(NodeType::Input, Payload::Input { tag, name });
        self.inputs.push(id);
        id
    }

    /// Create a sheet. It becomes visible once [`Tree::commit_sheet`] is called.
    pub(crate) fn new_sheet(&mut self, page: i32) -> NodeId {
        self.push(NodeType::Sheet, Payload::Sheet { page })
    }

    pub(crate) fn commit_sheet(&mut self, sheet: NodeId) {
        self.sheets.push(sheet);
    }

    pub(crate) fn new_record(&mut self, kind: NodeType, record: Record) -> NodeId {
        let payload = match kind {
            NodeType::HBox => Payload::HBox {
                visible: Extent::of(&record),
                record,
            },
            _ => Payload::Record(record),
        };
        self.push(kind, payload)
    }

    pub(crate) fn set_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.index()].links.child = Some(child);
        self.nodes[child.index()].links.parent = Some(parent);
    }

    pub(crate) fn set_sibling(&mut self, node: NodeId, sibling: NodeId) {
        let parent = self.parent(node);
        self.nodes[node.index()].links.sibling = Some(sibling);
        self.nodes[sibling.index()].links.parent = parent;
    }

    pub(crate) fn set_next_box(&mut self, node: NodeId, next: NodeId) {
        self.nodes[node.index()].links.next_box = Some(next);
    }

    /// Put a node at the head of its friend bucket.
    pub(crate) fn add_friend(&mut self, id: NodeId) {
        let Some(record) = self.record(id) else {
            return;
        };
        let bucket = self.bucket(record.tag, record.line);
        self.nodes[id.index()].links.friend = self.friends[bucket];
        self.friends[bucket] = Some(id);
    }

    /// Grow the visible span of `hbox` to cover `h`. Other nodes are left alone.
    pub(crate) fn cover_visible(&mut self, hbox: NodeId, h: i32) {
        if let Payload::HBox { visible, .. } = &mut self.nodes[hbox.index()].payload {
            visible.cover(h);
        }
    }

    fn push(&mut self, kind: NodeType, payload: Payload) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            payload,
            links: Links::default(),
        });
        id
    }

    // === Display ===

    /// Write every input and sheet using the record syntax of the file,
    /// one node per line, indented by depth.
    pub fn dump(&self, out: &mut impl fmt::Write) -> fmt::Result {
        for &input in &self.inputs {
            writeln!(out, "{}", self.line_of(input))?;
        }
        for &sheet in &self.sheets {
            self.dump_node(out, sheet, 0)?;
        }
        Ok(())
    }

    fn dump_node(&self, out: &mut impl fmt::Write, id: NodeId, depth: usize) -> fmt::Result {
        writeln!(out, "{:indent$}{}", "", self.line_of(id), indent = depth * 2)?;
        for child in self.children(id) {
            self.dump_node(out, child, depth + 1)?;
        }
        let close = match self.kind(id) {
            NodeType::Sheet => "}",
            NodeType::VBox => "]",
            NodeType::HBox => ")",
            _ => return Ok(()),
        };
        writeln!(out, "{:indent$}{close}", "", indent = depth * 2)
    }

    fn line_of(&self, id: NodeId) -> String {
        let node = self.get(id);
        let record = match &node.payload {
            Payload::Sheet { page } => return format!("{{{page}"),
            Payload::Input { tag, name } => return format!("Input:{tag}:{name}"),
            Payload::Record(record) | Payload::HBox { record, .. } => record,
        };
        let Record {
            tag,
            line,
            horiz,
            vert,
            width,
            height,
            depth,
        } = *record;
        let prefix = match node.kind {
            NodeType::VBox => "[",
            NodeType::VoidVBox => "v",
            NodeType::HBox => "(",
            NodeType::VoidHBox => "h",
            NodeType::Kern => "k",
            NodeType::Glue => "g",
            NodeType::Math => "$",
            _ => "x",
        };
        let mut text = match node.kind.class().fields {
            7 => format!("{prefix}{tag},{line}:{horiz},{vert}:{width},{height},{depth}"),
            5 => format!("{prefix}{tag},{line}:{horiz},{vert}:{width}"),
            _ => format!("{prefix}{tag},{line}:{horiz},{vert}"),
        };
        if let Payload::HBox { visible, .. } = &node.payload {
            if *visible != Extent::of(record) {
                text.push_str(&format!(" /{},{}:{}", visible.horiz, visible.vert, visible.width));
            }
        }
        text
    }
}

/// Iterator over the direct children of a node.
pub struct Children<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.sibling(id);
        Some(id)
    }
}

/// Iterator along a friend chain.
pub struct Friends<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Friends<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.friend(id);
        Some(id)
    }
}

// === Node accessors ===

/// A node together with the tree and geometry it belongs to.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a Tree,
    geometry: Geometry,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn new(tree: &'a Tree, geometry: Geometry, id: NodeId) -> Self {
        Self { tree, geometry, id }
    }

    fn with(&self, id: Option<NodeId>) -> Option<NodeRef<'a>> {
        id.map(|id| NodeRef { id, ..*self })
    }

    fn record(&self) -> Record {
        self.tree.record(self.id).copied().unwrap_or_default()
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node_type(&self) -> NodeType {
        self.tree.kind(self.id)
    }

    pub fn isa(&self) -> &'static str {
        self.node_type().isa()
    }

    // --- Navigation ---

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.with(self.tree.parent(self.id))
    }

    pub fn child(&self) -> Option<NodeRef<'a>> {
        self.with(self.tree.child(self.id))
    }

    pub fn sibling(&self) -> Option<NodeRef<'a>> {
        self.with(self.tree.sibling(self.id))
    }

    pub fn friend(&self) -> Option<NodeRef<'a>> {
        self.with(self.tree.friend(self.id))
    }

    pub fn next_box(&self) -> Option<NodeRef<'a>> {
        self.with(self.tree.next_box(self.id))
    }

    /// The sheet this node belongs to.
    pub fn sheet(&self) -> Option<NodeRef<'a>> {
        let mut id = Some(self.id);
        while let Some(current) = id {
            if self.tree.kind(current) == NodeType::Sheet {
                return self.with(Some(current));
            }
            id = self.tree.parent(current);
        }
        None
    }

    /// The next node in depth first order, staying inside the sheet.
    pub fn next(&self) -> Option<NodeRef<'a>> {
        if let Some(child) = self.tree.child(self.id) {
            return self.with(Some(child));
        }
        let mut id = self.id;
        loop {
            if let Some(sibling) = self.tree.sibling(id) {
                return self.with(Some(sibling));
            }
            id = self.tree.parent(id)?;
            if self.tree.kind(id) == NodeType::Sheet {
                return None;
            }
        }
    }

    // --- Source side ---

    pub fn tag(&self) -> i32 {
        match &self.tree.get(self.id).payload {
            Payload::Input { tag, .. } => *tag,
            _ => self.record().tag,
        }
    }

    pub fn line(&self) -> i32 {
        self.record().line
    }

    /// Always -1: the file format records no columns.
    pub fn column(&self) -> i32 {
        -1
    }

    /// The name of an input node.
    pub fn name(&self) -> Option<&'a str> {
        match &self.tree.get(self.id).payload {
            Payload::Input { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    /// Page number of the enclosing sheet, or -1.
    pub fn page(&self) -> i32 {
        match self.sheet().map(|sheet| &sheet.tree.get(sheet.id).payload) {
            Some(Payload::Sheet { page }) => *page,
            _ => -1,
        }
    }

    // --- Engine units ---

    pub fn h(&self) -> i32 {
        self.record().horiz
    }

    pub fn v(&self) -> i32 {
        self.record().vert
    }

    pub fn width(&self) -> i32 {
        self.record().width
    }

    /// The node if it is a box, otherwise its enclosing box.
    fn enclosing_box(&self) -> Option<NodeRef<'a>> {
        if self.node_type().is_box() {
            return Some(*self);
        }
        self.parent().filter(|parent| parent.node_type().is_box())
    }

    pub fn box_h(&self) -> i32 {
        self.enclosing_box().map_or(0, |b| b.record().horiz)
    }

    pub fn box_v(&self) -> i32 {
        self.enclosing_box().map_or(0, |b| b.record().vert)
    }

    pub fn box_width(&self) -> i32 {
        self.enclosing_box().map_or(0, |b| b.record().width)
    }

    pub fn box_height(&self) -> i32 {
        self.enclosing_box().map_or(0, |b| b.record().height)
    }

    pub fn box_depth(&self) -> i32 {
        self.enclosing_box().map_or(0, |b| b.record().depth)
    }

    // --- Device units ---

    pub fn visible_h(&self) -> f32 {
        self.h() as f32 * self.geometry.unit + self.geometry.x_offset
    }

    pub fn visible_v(&self) -> f32 {
        self.v() as f32 * self.geometry.unit + self.geometry.y_offset
    }

    pub fn visible_width(&self) -> f32 {
        self.width() as f32 * self.geometry.unit
    }

    /// Extent of the enclosing box as displayed. Hboxes report their
    /// visible rectangle.
    fn box_extent(&self) -> Option<Extent> {
        let b = self.enclosing_box()?;
        Some(match self.tree.visible(b.id) {
            Some(visible) => *visible,
            None => Extent::of(&b.record()),
        })
    }

    pub fn box_visible_h(&self) -> f32 {
        self.box_extent().map_or(0.0, |e| {
            e.horiz as f32 * self.geometry.unit + self.geometry.x_offset
        })
    }

    pub fn box_visible_v(&self) -> f32 {
        self.box_extent().map_or(0.0, |e| {
            e.vert as f32 * self.geometry.unit + self.geometry.y_offset
        })
    }

    pub fn box_visible_width(&self) -> f32 {
        self.box_extent()
            .map_or(0.0, |e| e.width as f32 * self.geometry.unit)
    }

    pub fn box_visible_height(&self) -> f32 {
        self.box_extent()
            .map_or(0.0, |e| e.height as f32 * self.geometry.unit)
    }

    pub fn box_visible_depth(&self) -> f32 {
        self.box_extent()
            .map_or(0.0, |e| e.depth as f32 * self.geometry.unit)
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tree.line_of(self.id))
    }
}

impl fmt::Display for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tree.line_of(self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> Geometry {
        Geometry {
            unit: 1.0,
            x_offset: 0.0,
            y_offset: 0.0,
        }
    }

    fn hbox(tree: &mut Tree, horiz: i32, width: i32) -> NodeId {
        tree.new_record(
            NodeType::HBox,
            Record::from_fields(&[1, 1, horiz, 100, width, 10, 2]),
        )
    }

    #[test]
    fn test_class_table() {
        assert_eq!(NodeType::VoidVBox.isa(), "void vbox");
        assert_eq!(NodeType::Kern.class().fields, 5);
        assert_eq!(NodeType::Glue.class().fields, 4);
        assert!(NodeType::HBox.class().has_next_box);
        assert!(!NodeType::VoidHBox.class().has_child);
        assert!(NodeType::Boundary > NodeType::Kern);
        assert!(NodeType::Kern > NodeType::VoidHBox);
    }

    #[test]
    fn test_cover_visible_grows_both_ways() {
        let mut tree = Tree::new(8);
        let id = hbox(&mut tree, 100, 50);
        tree.cover_visible(id, 120);
        assert_eq!(tree.visible(id).unwrap().width, 50);
        tree.cover_visible(id, 200);
        assert_eq!(tree.visible(id).unwrap().horiz, 100);
        assert_eq!(tree.visible(id).unwrap().width, 100);
        tree.cover_visible(id, 40);
        assert_eq!(tree.visible(id).unwrap().horiz, 40);
        assert_eq!(tree.visible(id).unwrap().width, 160);
        // The real rectangle is untouched.
        assert_eq!(tree.record(id).unwrap().width, 50);
    }

    #[test]
    fn test_cover_visible_negative_width() {
        let mut tree = Tree::new(8);
        let id = hbox(&mut tree, 100, -50);
        tree.cover_visible(id, 200);
        assert_eq!(tree.visible(id).unwrap().width, -100);
        tree.cover_visible(id, 90);
        assert_eq!(tree.visible(id).unwrap().horiz, 90);
        assert_eq!(tree.visible(id).unwrap().width, -110);
    }

    #[test]
    fn test_cover_visible_ignores_vbox() {
        let mut tree = Tree::new(8);
        let id = tree.new_record(NodeType::VBox, Record::from_fields(&[1, 1, 0, 0, 5, 5, 5]));
        tree.cover_visible(id, 1000);
        assert!(tree.visible(id).is_none());
        assert_eq!(tree.record(id).unwrap().width, 5);
    }

    #[test]
    fn test_friends_most_recent_first() {
        let mut tree = Tree::new(4);
        let a = tree.new_record(NodeType::Glue, Record::from_fields(&[1, 2, 0, 0]));
        let b = tree.new_record(NodeType::Glue, Record::from_fields(&[2, 1, 0, 0]));
        let c = tree.new_record(NodeType::Glue, Record::from_fields(&[1, 3, 0, 0]));
        tree.add_friend(a);
        tree.add_friend(b);
        tree.add_friend(c);
        assert_eq!(tree.bucket(1, 2), 3);
        assert_eq!(tree.friends(3).collect::<Vec<_>>(), vec![b, a]);
        assert_eq!(tree.friends(0).collect::<Vec<_>>(), vec![c]);
        assert_eq!(tree.friends(1).count(), 0);
    }

    #[test]
    fn test_navigation() {
        let mut tree = Tree::new(8);
        let sheet = tree.new_sheet(3);
        let outer = hbox(&mut tree, 0, 100);
        let inner = hbox(&mut tree, 10, 20);
        let glue = tree.new_record(NodeType::Glue, Record::from_fields(&[1, 5, 50, 60]));
        tree.set_child(sheet, outer);
        tree.set_child(outer, inner);
        tree.set_sibling(inner, glue);
        tree.commit_sheet(sheet);

        let node = NodeRef::new(&tree, geometry(), glue);
        assert_eq!(node.page(), 3);
        assert_eq!(node.parent().unwrap().id(), outer);
        assert_eq!(node.box_h(), 0);
        assert_eq!(node.box_width(), 100);
        assert_eq!(node.column(), -1);

        let order: Vec<NodeId> = std::iter::successors(
            Some(NodeRef::new(&tree, geometry(), sheet)),
            |n| n.next(),
        )
        .map(|n| n.id())
        .collect();
        assert_eq!(order, vec![sheet, outer, inner, glue]);
    }

    #[test]
    fn test_device_units() {
        let mut tree = Tree::new(8);
        let sheet = tree.new_sheet(1);
        let id = hbox(&mut tree, 100, 50);
        tree.set_child(sheet, id);
        tree.cover_visible(id, 300);
        let geometry = Geometry {
            unit: 0.5,
            x_offset: 10.0,
            y_offset: 20.0,
        };
        let node = NodeRef::new(&tree, geometry, id);
        assert_eq!(node.visible_h(), 60.0);
        assert_eq!(node.visible_v(), 70.0);
        assert_eq!(node.visible_width(), 25.0);
        assert_eq!(node.box_visible_width(), 100.0);
        assert_eq!(node.box_visible_height(), 5.0);
        assert_eq!(node.box_visible_depth(), 1.0);
    }
}
