//! File name helpers shared by tag lookup and synctex file location.

/// Whether `c` separates path components on this platform.
pub fn is_path_separator(c: u8) -> bool {
    c == b'/' || (cfg!(windows) && c == b'\\')
}

/// Strip any number of leading `./` components.
pub fn ignore_leading_dot_slash(name: &str) -> &str {
    let mut bytes = name.as_bytes();
    while bytes.len() > 1 && bytes[0] == b'.' && is_path_separator(bytes[1]) {
        bytes = &bytes[2..];
        while let Some((&c, rest)) = bytes.split_first() {
            if !is_path_separator(c) {
                break;
            }
            bytes = rest;
        }
    }
    &name[name.len() - bytes.len()..]
}

/// Whether two file names denote the same input, ignoring leading `./`.
/// The comparison is case insensitive on Windows.
pub fn is_equivalent_file_name(lhs: &str, rhs: &str) -> bool {
    let lhs = ignore_leading_dot_slash(lhs).as_bytes();
    let rhs = ignore_leading_dot_slash(rhs).as_bytes();
    lhs.len() == rhs.len()
        && lhs.iter().zip(rhs).all(|(&a, &b)| {
            if cfg!(windows) {
                (is_path_separator(a) && is_path_separator(b)) || a.eq_ignore_ascii_case(&b)
            } else {
                a == b
            }
        })
}

/// Whether `name` starts at the file system root.
pub fn path_is_absolute(name: &str) -> bool {
    let bytes = name.as_bytes();
    match bytes {
        [first, ..] if is_path_separator(*first) => true,
        [drive, b':', sep, ..] if cfg!(windows) => drive.is_ascii_alphabetic() && is_path_separator(*sep),
        _ => false,
    }
}

/// Byte offset where the last path component starts.
fn last_component_start(name: &str) -> usize {
    name.bytes()
        .rposition(is_path_separator)
        .map_or(0, |pos| pos + 1)
}

/// The last path component of `name`.
pub fn last_path_component(name: &str) -> &str {
    &name[last_component_start(name)..]
}

/// Remove the extension of the last path component, if it has one.
///
/// A leading dot does not start an extension.
pub fn strip_last_path_extension(name: &str) -> &str {
    let start = last_component_start(name);
    match name[start..].rfind('.') {
        Some(dot) if dot > 0 => &name[..start + dot],
        _ => name,
    }
}

/// Quote the last path component when it contains a space, the way TeX
/// engines name their outputs for such jobs.
pub fn quoted_last_component(name: &str) -> Option<String> {
    let start = last_component_start(name);
    let last = &name[start..];
    if !last.contains(' ') || last.starts_with('"') {
        return None;
    }
    Some(format!("{}\"{}\"", &name[..start], last))
}
