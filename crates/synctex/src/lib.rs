//! Parser and query engine for SyncTeX files.
//!
//! A synctex file, written by TeX engines next to the pdf they produce,
//! maps positions in the typeset pages back to the lines of the input
//! files and the other way around. This crate reads the file (plain or
//! gzip compressed), builds the tree of pages and boxes it describes and
//! answers two kinds of queries:
//!
//! - forward: which boxes did `file.tex:line` produce?
//! - backward: which input line produced what is drawn at a point of a page?
//!
//! # Format
//!
//! The file is line oriented text:
//!
//! ```text
//! SyncTeX Version:1
//! Input:1:/home/me/main.tex
//! Output:pdf
//! Magnification:1000
//! Unit:1
//! X Offset:0
//! Y Offset:0
//! Content:
//! {1
//! [1,10:0,0:500,600,0
//! (1,12:100,200:300,10,2
//! k1,12:150,200:20
//! )
//! ]
//! }1
//! Postamble:
//! Count:4
//! Post scriptum:
//! ```
//!
//! Every record carries `tag,line:h,v` followed by type specific sizes, in
//! engine units. `{`/`}` delimit a sheet (a page), `[`/`]` a vertical box
//! and `(`/`)` a horizontal box. `v` and `h` are void boxes, `k` kerns,
//! `g` glue, `$` math and `x` boundaries.
//!
//! # Usage
//!
//! ```no_run
//! use synctex::Scanner;
//!
//! let mut scanner = Scanner::new_with_output_file("main.pdf", None, true)?;
//! scanner.forward_query("main.tex", 42, 0)?;
//! while let Some(node) = scanner.next_result() {
//!     println!("page {} at {},{}", node.page(), node.box_visible_h(), node.box_visible_v());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod names;
pub mod source;
pub mod tree;
pub mod types;
pub mod updater;

mod backward;
mod forward;
mod parser;
mod preamble;
mod reader;
mod scanner;

pub use config::{ConfigError, ScannerConfig};
pub use preamble::Header;
pub use scanner::{Scanner, ScannerState};
pub use source::{locate, SyncTexFile};
pub use tree::{NodeId, NodeRef, NodeType, Tree};
pub use types::{Geometry, OpenError, ParseError, Point, QueryError, Scan, Status};
pub use updater::Updater;
