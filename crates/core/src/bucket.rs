//! Bucket names

/// Stem of the roots index file; no bucket may take it.
pub const RESERVED_BUCKET_NAME: &str = "roots";

/// Bucket names become file names: non-empty `[a-z0-9_-]+`, and never
/// [`RESERVED_BUCKET_NAME`].
pub fn is_bucket_name(name: &str) -> bool {
    !name.is_empty()
        && name != RESERVED_BUCKET_NAME
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
}
