//! Field rules mirroring the backend's domain constructors.
//!
//! Generated records must pass `Username::new`, `Title::new`, `Content::new`,
//! `Tags::new` and `CommentBody::new` in `backend/src/domain`. Keeping the
//! limits here lets the generator clamp its output before it reaches the
//! backend.
//!
//! Usernames are stricter than the backend requires: ASCII alphanumerics
//! and underscores only, so the same string also works as an email local
//! part.

/// Maximum username length accepted by the backend.
pub const USERNAME_MAX: usize = 100;

/// Maximum post title length accepted by the backend.
pub const TITLE_MAX: usize = 100;

/// Maximum post body length accepted by the backend.
pub const CONTENT_MAX: usize = 200;

/// Maximum comment length accepted by the backend.
pub const COMMENT_MAX: usize = 200;

/// Maximum single tag length accepted by the backend.
pub const TAG_MAX: usize = 50;

/// Maximum number of tags on one post.
pub const TAGS_MAX: usize = 10;

/// Validates a generated username.
///
/// # Examples
///
/// ```
/// use example_data::is_valid_username;
///
/// assert!(is_valid_username("ada_lovelace7"));
/// assert!(!is_valid_username("O'Brien"));
/// assert!(!is_valid_username(""));
/// ```
#[must_use]
pub fn is_valid_username(name: &str) -> bool {
    let length = name.chars().count();
    (1..=USERNAME_MAX).contains(&length) && name.chars().all(is_valid_username_char)
}

/// Returns `true` when `text` is non-blank once trimmed and at most `max`
/// characters long.
///
/// # Examples
///
/// ```
/// use example_data::{TITLE_MAX, is_valid_text};
///
/// assert!(is_valid_text("Morning walk", TITLE_MAX));
/// assert!(!is_valid_text("   ", TITLE_MAX));
/// ```
#[must_use]
pub fn is_valid_text(text: &str, max: usize) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed.chars().count() <= max
}

const fn is_valid_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Lower-cases a raw name and replaces disallowed characters with
/// underscores. Length is not enforced.
#[must_use]
pub(crate) fn sanitize_username(name: &str) -> String {
    name.chars()
        .map(|c| c.to_ascii_lowercase())
        .map(|c| if is_valid_username_char(c) { c } else { '_' })
        .collect()
}

/// Truncates `text` to at most `max` characters, dropping trailing
/// whitespace left by the cut.
#[must_use]
pub(crate) fn clamp_text(text: &str, max: usize) -> String {
    let truncated: String = text.trim().chars().take(max).collect();
    truncated.trim_end().to_owned()
}

#[cfg(test)]
mod tests {
    //! Covers username and free-text rules.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("ada", true)]
    #[case("user_123", true)]
    #[case("ABC", true)]
    #[case("", false)]
    #[case("ada lovelace", false)]
    #[case("O'Brien", false)]
    #[case("marie-claire", false)]
    #[case("user@email", false)]
    fn username_rules(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_valid_username(name), expected);
    }

    #[test]
    fn usernames_are_bounded() {
        assert!(is_valid_username(&"a".repeat(USERNAME_MAX)));
        assert!(!is_valid_username(&"a".repeat(USERNAME_MAX + 1)));
    }

    #[rstest]
    #[case("O'Brien", "o_brien")]
    #[case("Marie-Claire", "marie_claire")]
    #[case("Ada Lovelace", "ada_lovelace")]
    fn sanitize_lowercases_and_replaces(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitize_username(raw), expected);
    }

    #[test]
    fn clamp_text_never_ends_in_whitespace() {
        let clamped = clamp_text("ab cd", 3);
        assert_eq!(clamped, "ab");
        assert!(is_valid_text(&clamped, 3));
    }

    #[rstest]
    #[case("hello", 5, true)]
    #[case("hello!", 5, false)]
    #[case("  hello  ", 5, true)]
    #[case("\t", 5, false)]
    fn text_rules(#[case] text: &str, #[case] max: usize, #[case] expected: bool) {
        assert_eq!(is_valid_text(text, max), expected);
    }
}
