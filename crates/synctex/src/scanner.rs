use std::cell::Cell;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::backward::backward_nodes;
use crate::config::ScannerConfig;
use crate::forward::{forward_nodes, resolve_tag};
use crate::parser;
use crate::preamble::Header;
use crate::reader::SyncReader;
use crate::source::{self, SyncTexFile};
use crate::tree::{NodeId, NodeRef, NodeType, Tree};
use crate::types::{Geometry, OpenError, ParseError, Point, QueryError};

/// Lifecycle of a [`Scanner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    /// The stream is open and nothing was read yet.
    Created,
    Parsed,
    /// Parsing failed. The scanner holds no nodes.
    Failed,
}

/// A parsed synctex file and the result set of the last query.
///
/// Queries on a scanner that was not parsed yet parse it first. Accessors
/// never parse: they report an empty document until [`Scanner::parse`] has
/// succeeded.
pub struct Scanner {
    output: Option<String>,
    synctex: Option<PathBuf>,
    reader: Option<SyncReader>,
    config: ScannerConfig,
    state: ScannerState,
    tree: Tree,
    header: Header,
    geometry: Geometry,
    results: Vec<NodeId>,
    cursor: Cell<usize>,
}

impl Scanner {
    /// Open the synctex file that belongs to `output`, e.g. the pdf file.
    ///
    /// With `parse` set, the file is parsed right away and a parse failure
    /// is reported as an error.
    pub fn new_with_output_file(
        output: impl AsRef<Path>,
        build_directory: Option<&Path>,
        parse: bool,
    ) -> Result<Self, OpenError> {
        let config = ScannerConfig {
            build_directory: build_directory.map(Path::to_path_buf),
            ..ScannerConfig::default()
        };
        Self::with_config(output, &config, parse)
    }

    /// Like [`Scanner::new_with_output_file`], with all tunables.
    pub fn with_config(output: impl AsRef<Path>, config: &ScannerConfig, parse: bool) -> Result<Self, OpenError> {
        let output = output.as_ref();
        let file = source::locate(output, config.build_directory.as_deref())?;
        let mut scanner = Self::from_file(&file, config)?;
        scanner.output = Some(output.to_string_lossy().into_owned());
        if parse {
            scanner.parse()?;
        }
        Ok(scanner)
    }

    /// Open a synctex file given by its own path. It is not parsed yet.
    pub fn open(path: impl AsRef<Path>, config: &ScannerConfig) -> Result<Self, OpenError> {
        Self::from_file(&SyncTexFile::new(path.as_ref()), config)
    }

    fn from_file(file: &SyncTexFile, config: &ScannerConfig) -> Result<Self, OpenError> {
        let mut scanner = Self::from_reader(file.open()?, config);
        scanner.synctex = Some(file.path.clone());
        Ok(scanner)
    }

    /// Wrap an uncompressed synctex stream. It is not parsed yet.
    pub fn from_reader(source: impl Read + 'static, config: &ScannerConfig) -> Self {
        Self::from_boxed(Box::new(source), config)
    }

    fn from_boxed(source: Box<dyn Read>, config: &ScannerConfig) -> Self {
        Self {
            output: None,
            synctex: None,
            reader: Some(SyncReader::with_capacity(source, config.buffer_size)),
            config: config.clone(),
            state: ScannerState::Created,
            tree: Tree::new(config.friend_buckets),
            header: Header::default(),
            geometry: Header::default().resolve(),
            results: Vec::new(),
            cursor: Cell::new(0),
        }
    }

    /// Read the whole file. Calling it again after success does nothing.
    pub fn parse(&mut self) -> Result<&mut Self, ParseError> {
        match self.state {
            ScannerState::Parsed => return Ok(self),
            ScannerState::Failed => {
                return Err(ParseError::Malformed("the synctex file could not be parsed".into()))
            }
            ScannerState::Created => {}
        }
        let Some(mut reader) = self.reader.take() else {
            self.state = ScannerState::Failed;
            return Err(ParseError::UnexpectedEof("no synctex stream"));
        };
        match parser::parse(&mut reader, self.config.friend_buckets) {
            Ok((tree, mut header)) => {
                self.geometry = header.resolve();
                self.tree = tree;
                self.header = header;
                self.state = ScannerState::Parsed;
                Ok(self)
            }
            Err(err) => {
                log::error!("could not parse {}: {err}", self.display_name());
                self.state = ScannerState::Failed;
                Err(err)
            }
        }
    }

    pub fn state(&self) -> ScannerState {
        self.state
    }

    fn ensure_parsed(&mut self) -> Result<(), QueryError> {
        match self.state {
            ScannerState::Parsed => Ok(()),
            ScannerState::Failed => Err(QueryError::NotParsed),
            ScannerState::Created => self.parse().map(|_| ()).map_err(|_| QueryError::NotParsed),
        }
    }

    fn display_name(&self) -> String {
        match (&self.synctex, &self.output) {
            (Some(path), _) => path.display().to_string(),
            (None, Some(output)) => output.clone(),
            (None, None) => "synctex stream".to_string(),
        }
    }

    // === Queries ===

    /// Find the output nodes produced by `line` of the input `name`.
    ///
    /// `column` is accepted for symmetry with editors and ignored: the
    /// file format only records lines. Returns the number of results,
    /// which are then available through [`Scanner::next_result`].
    pub fn forward_query(&mut self, name: &str, line: i32, _column: i32) -> Result<usize, QueryError> {
        self.clear_results();
        self.ensure_parsed()?;
        let Some(tag) = resolve_tag(&self.tree, self.output.as_deref(), name) else {
            log::warn!("no tag for {name}");
            return Err(QueryError::UnknownInput(name.to_string()));
        };
        self.results = forward_nodes(&self.tree, tag, line, self.config.strong_forward);
        Ok(self.results.len())
    }

    /// Find the source nodes closest to the point `(x, y)` of `page`, in
    /// device units.
    pub fn backward_query(&mut self, page: i32, x: f32, y: f32) -> Result<usize, QueryError> {
        self.clear_results();
        self.ensure_parsed()?;
        let Geometry {
            unit,
            x_offset,
            y_offset,
        } = self.geometry;
        if !(unit > 0.0) {
            return Err(QueryError::InvalidUnit(unit));
        }
        let hit = Point {
            h: ((x - x_offset) / unit) as i32,
            v: ((y - y_offset) / unit) as i32,
        };
        let sheet = self.sheet_id(page).ok_or(QueryError::UnknownPage(page))?;
        self.results = backward_nodes(&self.tree, sheet, hit);
        Ok(self.results.len())
    }

    /// The next node of the last query's result set.
    pub fn next_result(&self) -> Option<NodeRef<'_>> {
        let index = self.cursor.get();
        let id = *self.results.get(index)?;
        self.cursor.set(index + 1);
        Some(self.node_ref(id))
    }

    /// Every node of the last query's result set, regardless of the cursor.
    pub fn results(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        self.results.iter().map(|&id| self.node_ref(id))
    }

    fn clear_results(&mut self) {
        self.results.clear();
        self.cursor.set(0);
    }

    // === Accessors ===

    /// The node `id` of this scanner's tree, `None` for ids it never handed out.
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        self.tree.contains(id).then(|| self.node_ref(id))
    }

    fn node_ref(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef::new(&self.tree, self.geometry, id)
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The output file this scanner was opened for.
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn synctex_path(&self) -> Option<&Path> {
        self.synctex.as_deref()
    }

    pub fn version(&self) -> i32 {
        self.header.version
    }

    pub fn output_format(&self) -> Option<&str> {
        self.header.output_format.as_deref()
    }

    /// Device units per engine unit.
    pub fn magnification(&self) -> f32 {
        self.geometry.unit
    }

    pub fn x_offset(&self) -> f32 {
        self.geometry.x_offset
    }

    pub fn y_offset(&self) -> f32 {
        self.geometry.y_offset
    }

    pub fn pre_magnification(&self) -> i32 {
        self.header.magnification
    }

    pub fn pre_unit(&self) -> i32 {
        self.header.unit
    }

    pub fn pre_x_offset(&self) -> i32 {
        self.header.x_offset
    }

    pub fn pre_y_offset(&self) -> i32 {
        self.header.y_offset
    }

    /// Record count announced by the postamble, -1 before parsing.
    pub fn count(&self) -> i32 {
        self.header.count
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Name of the input with the given tag.
    pub fn get_name(&self, tag: i32) -> Option<&str> {
        self.inputs().find(|input| input.tag() == tag)?.name()
    }

    /// Tag of the input matching `name`, see [`Scanner::forward_query`].
    pub fn get_tag(&self, name: &str) -> Option<i32> {
        resolve_tag(&self.tree, self.output.as_deref(), name)
    }

    /// Input nodes, most recently declared first.
    pub fn inputs(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        self.tree.inputs().iter().rev().map(|&id| self.node_ref(id))
    }

    /// The last sheet numbered `page`.
    fn sheet_id(&self, page: i32) -> Option<NodeId> {
        self.tree
            .sheets()
            .iter()
            .rev()
            .copied()
            .find(|&id| self.node_ref(id).page() == page)
    }

    /// The sheet of `page`. When a page number repeats, the last sheet wins.
    pub fn sheet(&self, page: i32) -> Option<NodeRef<'_>> {
        self.sheet_id(page).map(|id| self.node_ref(id))
    }

    /// The first node inside the sheet of `page`.
    pub fn sheet_content(&self, page: i32) -> Option<NodeRef<'_>> {
        self.sheet(page)?.child()
    }

    /// Sheets in file order.
    pub fn sheets(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        self.tree.sheets().iter().map(|&id| self.node_ref(id))
    }

    /// Whether any parsed node is of the given type.
    pub fn has_nodes_of(&self, kind: NodeType) -> bool {
        self.sheets()
            .flat_map(|sheet| std::iter::successors(Some(sheet), |node| node.next()))
            .any(|node| node.node_type() == kind)
    }
}

impl fmt::Display for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "output: {}", self.output.as_deref().unwrap_or("-"))?;
        writeln!(f, "synctex: {}", self.display_name())?;
        writeln!(f, "version: {}", self.version())?;
        writeln!(f, "output format: {}", self.output_format().unwrap_or("-"))?;
        writeln!(
            f,
            "unit: {} x offset: {} y offset: {}",
            self.geometry.unit, self.geometry.x_offset, self.geometry.y_offset
        )?;
        writeln!(f, "count: {}", self.count())?;
        self.tree.dump(f)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use assert_matches::assert_matches;

    use super::*;

    const FILE: &str = "SyncTeX Version:1\n\
        Input:1:/doc/a.tex\n\
        Output:pdf\n\
        Magnification:1000\n\
        Unit:1\n\
        X Offset:0\n\
        Y Offset:0\n\
        Content:\n\
        {1\n\
        (1,10:100,200:50,20,5\n\
        )\n\
        }\n\
        Postamble:\n\
        Count:1\n";

    fn scanner(data: &str) -> Scanner {
        Scanner::from_reader(Cursor::new(data.as_bytes().to_vec()), &ScannerConfig::default())
    }

    #[test]
    fn test_parse_is_idempotent() {
        let mut scanner = scanner(FILE);
        assert_eq!(scanner.state(), ScannerState::Created);
        assert_eq!(scanner.count(), -1);
        scanner.parse().unwrap();
        assert_eq!(scanner.state(), ScannerState::Parsed);
        let sheets = scanner.sheets().count();
        scanner.parse().unwrap();
        assert_eq!(scanner.sheets().count(), sheets);
        assert_eq!(scanner.count(), 1);
        assert_eq!(scanner.get_name(1), Some("/doc/a.tex"));
        assert_eq!(scanner.get_tag("/doc/a.tex"), Some(1));
    }

    #[test]
    fn test_query_parses_first() {
        let mut scanner = scanner(FILE);
        assert_eq!(scanner.forward_query("/doc/a.tex", 10, 0), Ok(1));
        let node = scanner.next_result().unwrap();
        assert_eq!((node.page(), node.line()), (1, 10));
        assert!(scanner.next_result().is_none());
    }

    #[test]
    fn test_new_query_resets_cursor() {
        let mut scanner = scanner(FILE);
        scanner.forward_query("/doc/a.tex", 10, 0).unwrap();
        assert_eq!(scanner.forward_query("/doc/b.tex", 10, 0), Err(QueryError::UnknownInput("/doc/b.tex".into())));
        assert!(scanner.next_result().is_none());
        assert_eq!(scanner.backward_query(2, 0.0, 0.0), Err(QueryError::UnknownPage(2)));
        assert_eq!(scanner.results().count(), 0);
    }

    #[test]
    fn test_failed_parse_leaves_nothing() {
        let truncated = &FILE[..FILE.find("(1,10").unwrap() + 12];
        let mut scanner = scanner(truncated);
        let err = scanner.parse().map(|_| ()).unwrap_err();
        assert_eq!(err.status(), crate::types::Status::Error);
        assert_eq!(scanner.state(), ScannerState::Failed);
        assert_eq!(scanner.sheets().count(), 0);
        assert!(scanner.sheet(1).is_none());
        assert_matches!(scanner.backward_query(1, 0.0, 0.0), Err(QueryError::NotParsed));
        assert!(scanner.parse().is_err());
    }

    #[test]
    fn test_cursor_does_not_lock_the_scanner() {
        let mut scanner = scanner(FILE);
        scanner.forward_query("/doc/a.tex", 10, 0).unwrap();
        let node = scanner.next_result().unwrap();
        assert_eq!(scanner.get_name(node.tag()), Some("/doc/a.tex"));
        assert_eq!(node.visible_width(), 50.0 * scanner.magnification());
        assert!(scanner.next_result().is_none());
    }

    #[test]
    fn test_repeated_page_uses_last_sheet() {
        let data = FILE.replace("}
Postamble:", "}
{1
(1,9:0,0:10,10,0
)
}
Postamble:");
        let mut scanner = scanner(&data);
        scanner.parse().unwrap();
        assert_eq!(scanner.sheets().count(), 2);
        assert_eq!(scanner.sheet_content(1).unwrap().line(), 9);
        let unit = scanner.magnification();
        assert_eq!(scanner.backward_query(1, 5.0 * unit, 0.0), Ok(1));
        assert_eq!(scanner.next_result().unwrap().line(), 9);
    }

    #[test]
    fn test_node_of_another_tree() {
        let mut parsed = scanner(FILE);
        parsed.parse().unwrap();
        let hbox = parsed.sheet_content(1).unwrap().id();
        assert_eq!(parsed.node(hbox).map(|n| n.line()), Some(10));

        let unparsed = scanner(FILE);
        assert!(unparsed.node(hbox).is_none());
    }

    #[test]
    fn test_display() {
        let mut scanner = scanner(FILE);
        scanner.parse().unwrap();
        let text = scanner.to_string();
        assert!(text.contains("version: 1"));
        assert!(text.contains("(1,10:100,200:50,20,5"));
        assert!(scanner.has_nodes_of(NodeType::HBox));
        assert!(!scanner.has_nodes_of(NodeType::Kern));
    }
}
