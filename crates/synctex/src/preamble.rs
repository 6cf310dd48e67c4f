use crate::reader::SyncReader;
use crate::tree::Tree;
use crate::types::{Geometry, ParseError, Scan};

/// Engine units per big point, times 65536.
const SCALED_POINTS_PER_DEVICE_UNIT: f64 = 65781.76;

const DEFAULT_UNIT: i32 = 8192;
const DEFAULT_MAGNIFICATION: i32 = 1000;
const DEFAULT_OFFSET: i32 = 578;

/// Metadata read from the preamble, the postamble and the optional post
/// scriptum.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub version: i32,
    pub output_format: Option<String>,
    pub magnification: i32,
    pub unit: i32,
    pub x_offset: i32,
    pub y_offset: i32,
    /// Number of records announced by the postamble, -1 if not read yet.
    pub count: i32,
    pub post_magnification: Option<f64>,
    pub post_x_offset: Option<f64>,
    pub post_y_offset: Option<f64>,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            version: 0,
            output_format: None,
            magnification: DEFAULT_MAGNIFICATION,
            unit: DEFAULT_UNIT,
            x_offset: DEFAULT_OFFSET,
            y_offset: DEFAULT_OFFSET,
            count: -1,
            post_magnification: None,
            post_x_offset: None,
            post_y_offset: None,
        }
    }
}

impl Header {
    /// Replace unusable preamble values and compute the device geometry.
    pub fn resolve(&mut self) -> Geometry {
        if self.unit <= 0 {
            self.unit = DEFAULT_UNIT;
        }
        if self.magnification <= 0 {
            self.magnification = DEFAULT_MAGNIFICATION;
        }
        let pre_unit = f64::from(self.unit);
        let unit = self.post_magnification.unwrap_or(1.0) * pre_unit
            / SCALED_POINTS_PER_DEVICE_UNIT
            * f64::from(self.magnification)
            / 1000.0;
        let offset = |post: Option<f64>, pre: i32| match post {
            Some(post) => post / SCALED_POINTS_PER_DEVICE_UNIT,
            None => f64::from(pre) * pre_unit / SCALED_POINTS_PER_DEVICE_UNIT,
        };
        Geometry {
            unit: unit as f32,
            x_offset: offset(self.post_x_offset, self.x_offset) as f32,
            y_offset: offset(self.post_y_offset, self.y_offset) as f32,
        }
    }
}

/// Read the preamble, from the version line through `Y Offset:`.
pub(crate) fn scan_preamble(
    reader: &mut SyncReader,
    tree: &mut Tree,
    header: &mut Header,
) -> Result<(), ParseError> {
    header.version = expect(
        scan_named(reader, "SyncTeX Version:", SyncReader::decode_int)?,
        "version",
    )?;
    expect_line(reader, "preamble")?;

    loop {
        match scan_input(reader, tree)? {
            Scan::Ok(()) => {}
            Scan::NotOk => break,
            Scan::Eof => return Err(ParseError::UnexpectedEof("preamble")),
        }
    }

    header.output_format = Some(expect(
        scan_named(reader, "Output:", SyncReader::decode_string)?,
        "output",
    )?);
    expect_line(reader, "preamble")?;

    let mut int_field = |name: &'static str, what: &'static str| -> Result<i32, ParseError> {
        let value = expect(scan_named(reader, name, SyncReader::decode_int)?, what)?;
        expect_line(reader, "preamble")?;
        Ok(value)
    };
    header.magnification = int_field("Magnification:", "magnification")?;
    header.unit = int_field("Unit:", "unit")?;
    header.x_offset = int_field("X Offset:", "x offset")?;
    header.y_offset = int_field("Y Offset:", "y offset")?;

    log::debug!(
        "synctex preamble: version {}, {} input(s)",
        header.version,
        tree.inputs().len()
    );
    Ok(())
}

/// Read one `Input:<tag>:<name>` record.
pub(crate) fn scan_input(reader: &mut SyncReader, tree: &mut Tree) -> Result<Scan<()>, ParseError> {
    match reader.match_literal("Input:")? {
        Scan::Ok(()) => {}
        other => return Ok(other),
    }
    let tag = expect(reader.decode_int()?, "input tag")?;
    // The separator between tag and name.
    if reader.peek()?.is_some() {
        reader.bump();
    }
    let name = expect(reader.decode_string()?, "input name")?;
    log::trace!("input {tag}: {name}");
    tree.add_input(tag, name);
    reader.next_line()
}

/// Read the postamble and the post scriptum that may follow it.
///
/// Reports `NotOk` when the stream is not at `Postamble:`.
pub(crate) fn scan_postamble(
    reader: &mut SyncReader,
    header: &mut Header,
) -> Result<Scan<()>, ParseError> {
    match reader.match_literal("Postamble:")? {
        Scan::Ok(()) => {}
        other => return Ok(other),
    }
    expect_line(reader, "postamble")?;
    header.count = expect(
        scan_named(reader, "Count:", SyncReader::decode_int)?,
        "postamble count",
    )?;
    scan_post_scriptum(reader, header)?;
    Ok(Scan::Ok(()))
}

/// Read the optional override block. Running out of input is fine here.
fn scan_post_scriptum(reader: &mut SyncReader, header: &mut Header) -> Result<(), ParseError> {
    loop {
        if reader.match_literal("Post scriptum:")?.is_ok() {
            break;
        }
        if reader.next_line()? == Scan::Eof {
            return Ok(());
        }
    }

    while reader.next_line()? == Scan::Ok(()) {
        if reader.match_literal("Magnification:")?.is_ok() {
            match reader.decode_float()? {
                Scan::Ok(value) if value > 0.0 => header.post_magnification = Some(value),
                _ => {
                    return Err(ParseError::Malformed(
                        "bad magnification in the post scriptum".into(),
                    ))
                }
            }
        } else if reader.match_literal("X Offset:")?.is_ok() {
            header.post_x_offset = Some(reader.decode_dimension()?);
        } else if reader.match_literal("Y Offset:")?.is_ok() {
            header.post_y_offset = Some(reader.decode_dimension()?);
        }
    }
    Ok(())
}

// === Internal helpers ===

/// Skip lines until one starts with `name`, then decode what follows it.
fn scan_named<T>(
    reader: &mut SyncReader,
    name: &str,
    decode: impl FnOnce(&mut SyncReader) -> Result<Scan<T>, ParseError>,
) -> Result<Scan<T>, ParseError> {
    loop {
        match reader.match_literal(name)? {
            Scan::Ok(()) => return decode(reader),
            Scan::Eof => return Ok(Scan::Eof),
            Scan::NotOk => {
                if reader.next_line()? == Scan::Eof {
                    return Ok(Scan::Eof);
                }
            }
        }
    }
}

pub(crate) fn expect<T>(scan: Scan<T>, what: &'static str) -> Result<T, ParseError> {
    match scan {
        Scan::Ok(value) => Ok(value),
        Scan::NotOk => Err(ParseError::Malformed(format!("bad {what}"))),
        Scan::Eof => Err(ParseError::UnexpectedEof(what)),
    }
}

/// Move to the next line, which must exist.
pub(crate) fn expect_line(reader: &mut SyncReader, what: &'static str) -> Result<(), ParseError> {
    match reader.next_line()? {
        Scan::Ok(()) => Ok(()),
        _ => Err(ParseError::UnexpectedEof(what)),
    }
}
