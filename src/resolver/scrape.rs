//! HTML image extraction helpers shared by the resolver and the reader.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Compiles a regex at static init; panics on invalid pattern.
fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Matches `<img ... src="...">` in document order, either quote style.
static IMG_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#"(?is)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#)
});

/// Resolves a possibly relative URL string against a base URL.
///
/// Returns the value as-is if it already starts with `http://` or
/// `https://`; normalizes `//...` to `https:...`; otherwise joins with
/// `base_url`.
#[must_use]
pub fn absolutize_url(value: &str, base_url: &Url) -> Option<String> {
    if value.starts_with("http://") || value.starts_with("https://") {
        return Some(value.to_string());
    }
    if value.starts_with("//") {
        return Some(format!("https:{value}"));
    }
    base_url.join(value).ok().map(|url| url.to_string())
}

/// Returns true if the URL's path ends in one of the given lowercase
/// extensions.
#[must_use]
pub fn has_image_extension(url: &str, extensions: &[String]) -> bool {
    let path = Url::parse(url).map_or_else(|_| url.to_string(), |u| u.path().to_string());
    let Some((_, ext)) = path.rsplit_once('.') else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    extensions.iter().any(|candidate| *candidate == ext)
}

/// Returns the first `<img src>` in `html` whose URL extension matches the
/// raster heuristic, absolutized against `base_url`.
#[must_use]
pub fn first_raster_image(html: &str, base_url: &Url, extensions: &[String]) -> Option<String> {
    IMG_SRC_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|src| !src.is_empty())
        .filter_map(|src| absolutize_url(src, base_url))
        .find(|url| has_image_extension(url, extensions))
}

/// Returns every `<img src>` in `html` in document order, absolutized,
/// with blanks and duplicates removed.
#[must_use]
pub fn all_images(html: &str, base_url: &Url) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    IMG_SRC_RE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|src| !src.is_empty())
        .filter_map(|src| absolutize_url(src, base_url))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
