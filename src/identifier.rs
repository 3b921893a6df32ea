//! Sound id extraction from page URLs.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Tried in order; first match wins.
    static ref ID_PATTERNS: Vec<Regex> = vec![
        // https://www.missevan.com/sound/12345
        Regex::new(r"/sound/(\d+)").unwrap(),
        // https://www.missevan.com/sound/player?id=12345
        Regex::new(r"id=(\d+)").unwrap(),
    ];
}

/// Return the numeric sound id embedded in `url`, or None if no pattern matches.
pub fn extract_id(url: &str) -> Option<&str> {
    ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Substitute `id` for every `{id}` in `template`.
pub fn download_url(template: &str, id: &str) -> String {
    template.replace("{id}", id)
}
