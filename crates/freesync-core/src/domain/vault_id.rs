//! Remote resource key derived from the vault display name

/// Derives the vault id used in `/vault/{id}` from a display name
///
/// Lower-cases, trims spaces, collapses every run of spaces to a single
/// `-`, then drops every character outside `[a-z-]`. Only U+0020 counts as a
/// space; tabs and other whitespace are stripped like any other character. The server keys vaults by
/// this string, so the rules must not drift.
pub fn vault_id(display_name: &str) -> String {
    display_name
        .to_lowercase()
        .split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || *c == '-')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vault_id_examples() {
        assert_eq!(vault_id("My Notes!"), "my-notes");
        assert_eq!(vault_id("  "), "");
        assert_eq!(vault_id("ABC-123"), "abc-");
    }

    #[test]
    fn test_vault_id_collapses_space_runs() {
        assert_eq!(vault_id("Work   Journal\t2024"), "work-journal");
        assert_eq!(vault_id("  padded name  "), "padded-name");
    }

    #[test]
    fn test_vault_id_strips_other_whitespace() {
        assert_eq!(vault_id("Work\tNotes"), "worknotes");
        assert_eq!(vault_id("Work\u{a0}Notes"), "worknotes");
        assert_eq!(vault_id("Work\nNotes"), "worknotes");
        assert_eq!(vault_id("Work \t Notes"), "work--notes");
    }

    #[test]
    fn test_vault_id_strips_non_ascii() {
        assert_eq!(vault_id("Café Notes"), "caf-notes");
        assert_eq!(vault_id("ノート"), "");
    }

    #[test]
    fn test_vault_id_is_deterministic() {
        let name = "Second Brain (old)";
        assert_eq!(vault_id(name), vault_id(name));
        assert_eq!(vault_id(name), "second-brain-old");
    }
}
