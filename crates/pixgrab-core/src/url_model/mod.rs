//! Local file naming for downloaded media.
//!
//! Files are named after the last URL path segment (e.g. `12345_p0.png`),
//! sanitized for Linux filesystems. Every name starts with `{id}_p{index}`,
//! so two pages never share a file.

mod path;
mod sanitize;

pub use path::filename_from_url_path;
pub use sanitize::sanitize_filename_for_linux;

use crate::model::Identifier;

/// Derives a safe filename for page `index` of artwork `id` served at `url`.
///
/// Falls back to `{id}_p{index}.bin` when the URL has no usable path segment.
/// A segment that does not already start with `{id}_p{index}` gets it prepended.
///
/// # Examples
///
/// - `derive_filename(&"1".into(), 0, "https://i.pximg.net/img/1_p0.png")` → `"1_p0.png"`
/// - `derive_filename(&"1".into(), 2, "https://i.pximg.net/")` → `"1_p2.bin"`
/// - `derive_filename(&"1".into(), 1, "https://i.pximg.net/img/cover.png")` → `"1_p1_cover.png"`
pub fn derive_filename(id: &Identifier, index: usize, url: &str) -> String {
    let fallback = || sanitize_filename_for_linux(&format!("{}_p{}.bin", id, index));
    let Some(raw) = filename_from_url_path(url) else {
        return fallback();
    };
    let sanitized = sanitize_filename_for_linux(&raw);
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return fallback();
    }
    let prefix = format!("{}_p{}", id, index);
    let owned = sanitized
        .strip_prefix(&prefix)
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_ascii_digit()));
    if owned {
        sanitized
    } else {
        sanitize_filename_for_linux(&format!("{}_{}", prefix, sanitized))
    }
}

/// Directory name for a keyword's downloads.
pub fn keyword_dirname(keyword: &str) -> String {
    let sanitized = sanitize_filename_for_linux(keyword);
    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        "keyword".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_filename_from_url_path() {
        assert_eq!(
            derive_filename(
                &Identifier::from("1"),
                0,
                "https://i.pximg.net/img-original/img/2024/01/01/00/00/00/1_p0.png"
            ),
            "1_p0.png"
        );
    }

    #[test]
    fn derive_filename_fallback() {
        assert_eq!(
            derive_filename(&Identifier::from("9"), 3, "https://i.pximg.net/"),
            "9_p3.bin"
        );
        assert_eq!(derive_filename(&Identifier::from("9"), 0, "not a url"), "9_p0.bin");
    }

    #[test]
    fn derive_filename_prefixes_foreign_names() {
        let a = derive_filename(&Identifier::from("7"), 0, "https://x/img/cover.png");
        let b = derive_filename(&Identifier::from("8"), 0, "https://y/img/cover.png");
        assert_eq!(a, "7_p0_cover.png");
        assert_eq!(b, "8_p0_cover.png");
        // Another artwork's page name is not taken over as-is.
        assert_eq!(
            derive_filename(&Identifier::from("1"), 1, "https://x/11_p1.png"),
            "1_p1_11_p1.png"
        );
        assert_eq!(
            derive_filename(&Identifier::from("1"), 1, "https://x/1_p10.png"),
            "1_p1_1_p10.png"
        );
    }

    #[test]
    fn keyword_dir_is_sanitized() {
        assert_eq!(keyword_dirname("cat/dog"), "cat_dog");
        assert_eq!(keyword_dirname(".."), "keyword");
        assert_eq!(keyword_dirname("猫"), "猫");
    }
}
