//! Line-prefix filtering of structure files.
//!
//! The proxy never parses individual fields. It checks that a response looks
//! like a structure file at all, then keeps only the coordinate-bearing lines.

/// Marker that must appear somewhere in a usable structure file.
pub const ATOM_MARKER: &str = "ATOM";

/// Shortest body accepted from upstream, in characters.
pub const MIN_STRUCTURE_LEN: usize = 100;

/// Line prefixes retained by [`filter_records`], in no particular order.
pub const RETAINED_PREFIXES: [&str; 3] = ["ATOM", "HETATM", "TER"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    /// The body has no atom records or is too short to be a structure file.
    InvalidFormat,
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::InvalidFormat => write!(f, "Invalid PDB data received"),
        }
    }
}

impl std::error::Error for FormatError {}

/// Minimal shape check on an upstream body.
pub fn validate_structure(text: &str) -> Result<(), FormatError> {
    if !text.contains(ATOM_MARKER) || text.chars().count() < MIN_STRUCTURE_LEN {
        return Err(FormatError::InvalidFormat);
    }
    Ok(())
}

pub fn is_retained_line(line: &str) -> bool {
    RETAINED_PREFIXES.iter().any(|p| line.starts_with(p))
}

/// Keeps atom, heteroatom and chain-terminator lines in their original order.
///
/// Lines are split on `\n` and re-joined with `\n`; everything else about a
/// kept line (including a trailing `\r`) is passed through untouched.
pub fn filter_records(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split('\n').filter(|l| is_retained_line(l)) {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}

/// Validates then filters: the full proxy transform.
pub fn sanitize_structure(text: &str) -> Result<String, FormatError> {
    validate_structure(text)?;
    Ok(filter_records(text))
}
