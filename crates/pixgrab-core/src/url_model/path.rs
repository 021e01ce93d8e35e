//! Filename extraction from URL path.

use percent_encoding::percent_decode_str;

/// Last path segment of `url`, percent-decoded.
///
/// Returns `None` if the URL cannot be parsed or the path is empty/root.
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = percent_decode_str(segment).decode_utf8_lossy();
    if decoded.is_empty() || decoded == "." || decoded == ".." {
        return None;
    }
    Some(decoded.into_owned())
}
