use crate::preamble::{self, expect, expect_line, Header};
use crate::reader::SyncReader;
use crate::tree::{NodeId, NodeType, Record, Tree};
use crate::types::{ParseError, Scan};

// Record prefixes inside a sheet.
const BEGIN_SHEET: u8 = b'{';
const END_SHEET: u8 = b'}';
const BEGIN_VBOX: u8 = b'[';
const END_VBOX: u8 = b']';
const BEGIN_HBOX: u8 = b'(';
const END_HBOX: u8 = b')';
const VOID_VBOX: u8 = b'v';
const VOID_HBOX: u8 = b'h';
const KERN: u8 = b'k';
const GLUE: u8 = b'g';
const MATH: u8 = b'$';
const BOUNDARY: u8 = b'x';
const ANCHOR: u8 = b'!';

/// Parse a whole synctex stream into a tree and its header.
///
/// The stream is consumed in one pass. On error nothing is returned, the
/// partial tree is dropped.
pub(crate) fn parse(reader: &mut SyncReader, friend_buckets: usize) -> Result<(Tree, Header), ParseError> {
    let mut tree = Tree::new(friend_buckets);
    let mut header = Header::default();
    preamble::scan_preamble(reader, &mut tree, &mut header)?;
    scan_content(reader, &mut tree, &mut header)?;
    log::debug!(
        "synctex content: {} sheet(s), {} node(s), count {}",
        tree.sheets().len(),
        tree.len(),
        header.count
    );
    Ok((tree, header))
}

/// Where the next node goes relative to the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    /// Start of a sheet: only boxes are accepted.
    Top,
    /// The next node is the first child of `parent`.
    Parent,
    /// The next node follows `child`.
    Sibling,
}

struct SheetBuilder<'a> {
    reader: &'a mut SyncReader,
    tree: &'a mut Tree,
    sheet: NodeId,
    parent: NodeId,
    child: Option<NodeId>,
    /// The hbox closed last, or the sheet.
    last_box: NodeId,
    level: Level,
}

fn scan_content(reader: &mut SyncReader, tree: &mut Tree, header: &mut Header) -> Result<(), ParseError> {
    while !reader.match_literal("Content:")?.is_ok() {
        expect_line(reader, "content")?;
    }
    expect_line(reader, "content")?;

    loop {
        if reader.peek()? == Some(BEGIN_SHEET) {
            reader.bump();
            let page = expect(reader.decode_int()?, "sheet page")?;
            expect_line(reader, "sheet")?;
            let sheet = tree.new_sheet(page);
            SheetBuilder::new(reader, tree, sheet).scan()?;
            tree.commit_sheet(sheet);
            log::trace!("sheet {page} done");
            while preamble::scan_input(reader, tree)? == Scan::Ok(()) {}
            continue;
        }
        if preamble::scan_postamble(reader, header)?.is_ok() {
            return Ok(());
        }
        expect_line(reader, "postamble")?;
    }
}

impl<'a> SheetBuilder<'a> {
    fn new(reader: &'a mut SyncReader, tree: &'a mut Tree, sheet: NodeId) -> Self {
        Self {
            reader,
            tree,
            sheet,
            parent: sheet,
            child: None,
            last_box: sheet,
            level: Level::Top,
        }
    }

    /// Read records up to and including the closing `}` of the sheet.
    fn scan(mut self) -> Result<(), ParseError> {
        loop {
            let Some(prefix) = self.reader.peek()? else {
                return Err(ParseError::UnexpectedEof("sheet"));
            };
            match prefix {
                END_SHEET => {
                    if self.parent != self.sheet {
                        return Err(ParseError::Malformed("unexpected end of sheet".into()));
                    }
                    self.reader.next_line()?;
                    return Ok(());
                }
                BEGIN_SHEET => self.skip_nested_sheet()?,
                BEGIN_VBOX => self.begin_box(NodeType::VBox)?,
                BEGIN_HBOX => self.begin_box(NodeType::HBox)?,
                _ if self.level == Level::Top => self.skip_line()?,
                END_VBOX => self.end_vbox()?,
                END_HBOX => self.end_hbox()?,
                VOID_VBOX => self.leaf(NodeType::VoidVBox)?,
                VOID_HBOX => self.leaf(NodeType::VoidHBox)?,
                KERN => self.leaf(NodeType::Kern)?,
                GLUE => self.leaf(NodeType::Glue)?,
                MATH => self.leaf(NodeType::Math)?,
                BOUNDARY => self.leaf(NodeType::Boundary)?,
                ANCHOR => self.skip_line()?,
                other => {
                    log::trace!("ignored record starting with {:?}", other as char);
                    self.skip_line()?;
                }
            }
        }
    }

    fn begin_box(&mut self, kind: NodeType) -> Result<(), ParseError> {
        let id = self.record(kind)?;
        if kind == NodeType::HBox {
            let record = self.record_of(id);
            self.tree.cover_visible(self.parent, record.horiz);
            self.tree
                .cover_visible(self.parent, record.horiz.saturating_add(record.width.saturating_abs()));
        }
        self.attach(id);
        self.parent = id;
        self.child = None;
        self.level = Level::Parent;
        Ok(())
    }

    fn end_vbox(&mut self) -> Result<(), ParseError> {
        if self.tree.kind(self.parent) == NodeType::VBox {
            if self.tree.child(self.parent).is_none() {
                self.tree.add_friend(self.parent);
            }
            self.close_box();
        } else {
            log::warn!("unexpected end of vbox, ignored");
        }
        self.level = Level::Sibling;
        expect_line(self.reader, "sheet")
    }

    fn end_hbox(&mut self) -> Result<(), ParseError> {
        if self.tree.kind(self.parent) == NodeType::HBox {
            if self.child.is_none() {
                self.tree.add_friend(self.parent);
            }
            self.tree.set_next_box(self.last_box, self.parent);
            self.last_box = self.parent;
            self.close_box();
        } else {
            log::warn!("unexpected end of hbox, ignored");
        }
        self.level = Level::Sibling;
        expect_line(self.reader, "sheet")
    }

    fn close_box(&mut self) {
        self.child = Some(self.parent);
        self.parent = self.tree.parent(self.parent).unwrap_or(self.sheet);
    }

    fn leaf(&mut self, kind: NodeType) -> Result<(), ParseError> {
        let id = self.record(kind)?;
        let record = self.record_of(id);
        match kind {
            NodeType::VoidHBox => {
                self.tree.cover_visible(self.parent, record.horiz);
                self.tree
                    .cover_visible(self.parent, record.horiz.saturating_add(record.width.saturating_abs()));
            }
            NodeType::Kern => {
                self.tree.cover_visible(self.parent, record.horiz);
                self.tree
                    .cover_visible(self.parent, record.horiz.saturating_sub(record.width));
            }
            NodeType::Glue | NodeType::Math | NodeType::Boundary => {
                self.tree.cover_visible(self.parent, record.horiz);
            }
            _ => {}
        }
        self.attach(id);
        self.tree.add_friend(id);
        self.child = Some(id);
        self.level = Level::Sibling;
        Ok(())
    }

    /// Link a new node into the tree at the current position.
    fn attach(&mut self, id: NodeId) {
        match (self.level, self.child) {
            (Level::Sibling, Some(child)) => self.tree.set_sibling(child, id),
            _ => self.tree.set_child(self.parent, id),
        }
    }

    /// Decode the record under the cursor, prefix included, and the line end.
    fn record(&mut self, kind: NodeType) -> Result<NodeId, ParseError> {
        self.reader.bump();
        let mut fields = [0i32; 7];
        for field in fields.iter_mut().take(kind.class().fields) {
            *field = match self.reader.decode_int()? {
                Scan::Ok(value) => value,
                Scan::NotOk => {
                    return Err(ParseError::Malformed(format!("bad {} record", kind.isa())))
                }
                Scan::Eof => return Err(ParseError::UnexpectedEof("record")),
            };
        }
        expect_line(self.reader, "record")?;
        Ok(self.tree.new_record(kind, Record::from_fields(&fields)))
    }

    fn record_of(&self, id: NodeId) -> Record {
        self.tree.record(id).copied().unwrap_or_default()
    }

    fn skip_line(&mut self) -> Result<(), ParseError> {
        expect_line(self.reader, "sheet")
    }

    /// Skip a `{ ... }` block nested in a sheet, nested blocks included.
    fn skip_nested_sheet(&mut self) -> Result<(), ParseError> {
        let mut depth = 0usize;
        loop {
            match self.reader.peek()? {
                Some(BEGIN_SHEET) => depth += 1,
                Some(END_SHEET) => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.reader.next_line()?;
                        return Ok(());
                    }
                }
                Some(_) => {}
                None => return Err(ParseError::UnexpectedEof("nested sheet")),
            }
            expect_line(self.reader, "nested sheet")?;
        }
    }
}
