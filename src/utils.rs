//! Utility functions for filename handling

use std::path::Path;

/// Characters that must not appear in a delivered filename
const HOSTILE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Fallback stem when neither the requested name nor the source yields one
const FALLBACK_STEM: &str = "audio";

/// Sanitize a requester-chosen filename for filesystem use
///
/// Replaces path separators and other filesystem-hostile characters with
/// `_` and trims surrounding whitespace. An input that sanitizes to an
/// empty string falls back to `"audio"`.
///
/// # Examples
///
/// ```
/// use tunedrop::utils::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("my/song: remix?"), "my_song_ remix_");
/// assert_eq!(sanitize_file_name("   "), "audio");
/// ```
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if HOSTILE_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Derive a filename stem from a source locator
///
/// Used when the converter produced a file whose name is unusable as a
/// delivery filename. Takes the last URL path segment (minus extension),
/// falling back to `"audio"` when the URL has no useful path.
///
/// # Examples
///
/// ```
/// use tunedrop::utils::name_from_source;
///
/// assert_eq!(name_from_source("https://youtu.be/dQw4w9WgXcQ"), "dQw4w9WgXcQ");
/// assert_eq!(name_from_source("https://example.com/"), "audio");
/// ```
#[must_use]
pub fn name_from_source(source: &str) -> String {
    if let Ok(parsed) = url::Url::parse(source)
        && let Some(mut segments) = parsed.path_segments()
        && let Some(last) = segments.next_back()
        && !last.is_empty()
    {
        if let Some(stem) = Path::new(last).file_stem()
            && let Some(stem_str) = stem.to_str()
            && !stem_str.is_empty()
        {
            return sanitize_file_name(stem_str);
        }
        return sanitize_file_name(last);
    }

    FALLBACK_STEM.to_string()
}
