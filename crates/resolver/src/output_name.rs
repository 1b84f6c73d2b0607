//! Output file name suffix handling.

/// The part of `name` before its last `.`, or the whole name if it has none.
pub fn stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

/// Replace the suffix of `name` with `extension`, keeping the stem.
///
/// A name without a dot gets the extension appended.
pub fn with_extension(name: &str, extension: &str) -> String {
    format!("{}.{}", stem(name), extension)
}
