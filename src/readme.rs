//! Cache-busting rewrite of the profile README.
//!
//! GitHub's camo proxy caches embedded images aggressively, so the README
//! references the rendered SVGs with a `?v=` query parameter that changes
//! every run.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::warn;

const STAMP_FORMAT: &str = "%Y-%m-%d-%H%M";

/// Rewrite every reference to the output images, bare or already carrying a
/// `?v=` suffix, to point at `stamp`. No other text is touched.
pub fn bust_cache(content: &str, stamp: &str) -> String {
    let pattern = Regex::new(r#"(dark_mode\.svg|light_mode\.svg)(\?v=[^)\s"'<>]*)?"#)
        .expect("hard-coded pattern compiles");

    pattern
        .replace_all(content, |caps: &regex::Captures| {
            format!("{}?v={stamp}", &caps[1])
        })
        .into_owned()
}

/// Refresh the `?v=` parameters in the README at `path`, stamped to the
/// minute. A missing README is a warning, not a failure.
pub fn refresh_readme(path: &Path, now: DateTime<Utc>) -> io::Result<bool> {
    if !path.exists() {
        warn!(path = %path.display(), "README not found, skipping cache-busting rewrite");
        return Ok(false);
    }

    let content = fs::read_to_string(path)?;
    let stamp = now.format(STAMP_FORMAT).to_string();
    fs::write(path, bust_cache(&content, &stamp))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn stamps_bare_and_already_stamped_references() {
        let content = "![dark](dark_mode.svg)\n![light](light_mode.svg?v=old)\nplain text\n";

        let updated = bust_cache(content, "2024-01-01-0000");

        assert_eq!(
            updated,
            "![dark](dark_mode.svg?v=2024-01-01-0000)\n\
             ![light](light_mode.svg?v=2024-01-01-0000)\nplain text\n"
        );
    }

    #[test]
    fn unrelated_text_is_untouched_without_references() {
        let content = "# Profile\nnothing to see here\n";
        assert_eq!(bust_cache(content, "2024-01-01-0000"), content);
    }

    #[test]
    fn restamping_is_idempotent() {
        let once = bust_cache("dark_mode.svg?v=2023-12-31-2359", "2024-01-01-0000");
        let twice = bust_cache(&once, "2024-01-01-0000");
        assert_eq!(once, "dark_mode.svg?v=2024-01-01-0000");
        assert_eq!(once, twice);
    }

    #[test]
    fn refresh_rewrites_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("README.md");
        fs::write(&path, "<img src=\"light_mode.svg\">").unwrap();

        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let rewritten = refresh_readme(&path, now).unwrap();

        assert!(rewritten);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "<img src=\"light_mode.svg?v=2024-01-01-0000\">"
        );
    }

    #[test]
    fn missing_readme_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("README.md");

        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let rewritten = refresh_readme(&path, now).unwrap();

        assert!(!rewritten);
        assert!(!path.exists());
    }
}
