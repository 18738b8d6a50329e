/// Shown when no identifier can be recovered from the text.
pub const UNKNOWN_STRUCTURE_ID: &str = "Unknown";

const HEADER_TAG: &str = "HEADER";

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Recovers the 4-character code from the first `HEADER` line that ends with
/// one, e.g. `HEADER    PLANT PROTEIN    30-APR-81   1CRN` yields `1CRN`.
///
/// The code must be separated from the preceding text by whitespace and be
/// the last token on the line.
pub fn extract_structure_id(text: &str) -> Option<String> {
    text.lines().find_map(header_code)
}

/// [`extract_structure_id`] with the display fallback applied.
///
/// Bodies served through the proxy have already been through
/// [`filter_records`](crate::filter::filter_records), which drops `HEADER`,
/// so they always display as [`UNKNOWN_STRUCTURE_ID`].
pub fn display_structure_id(text: &str) -> String {
    extract_structure_id(text).unwrap_or_else(|| UNKNOWN_STRUCTURE_ID.to_string())
}

fn header_code(line: &str) -> Option<String> {
    let start = line.find(HEADER_TAG)?;
    let rest = line[start + HEADER_TAG.len()..].trim_end();
    let (_, code) = rest.rsplit_once(char::is_whitespace)?;
    if code.chars().count() == 4 && code.chars().all(is_word_char) {
        Some(code.to_string())
    } else {
        None
    }
}
