//! Form input normalisation.

/// Normalise a raw form value.
///
/// Leading and trailing whitespace is removed, internal whitespace runs
/// collapse to a single space, and the result is cut to `max_chars`
/// characters (not bytes). A cut that lands after a space drops that space so
/// stored values stay trimmed.
///
/// # Examples
/// ```
/// use user_admin::domain::clean_string;
///
/// assert_eq!(clean_string("  Ada \t\n Lovelace ", 80), "Ada Lovelace");
/// assert_eq!(clean_string("   ", 80), "");
/// assert_eq!(clean_string("Ünïcödé", 3), "Ünï");
/// ```
pub fn clean_string(raw: &str, max_chars: usize) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut truncated: String = collapsed.chars().take(max_chars).collect();
    let kept = truncated.trim_end().len();
    truncated.truncate(kept);
    truncated
}
