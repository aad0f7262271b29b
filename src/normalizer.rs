// 🔤 Name Normalizer - Canonical comparison key for free-text person names
//
// "  garcía,  Ana " → "GARCÍA ANA"
//
// Accents are NOT folded: "GARCÍA" and "GARCIA" stay different keys.

/// Punctuation removed outright (never replaced by a space)
pub const STRIPPED_PUNCTUATION: [char; 6] = ['.', ',', ';', ':', '\'', '"'];

/// Normalize a person name for cross-source comparison
///
/// Steps:
/// 1. Uppercase (full Unicode mapping)
/// 2. Drop `. , ; : ' "`
/// 3. Trim and collapse every whitespace run into one space
///
/// Punctuation goes before whitespace handling so `"A . B"` yields `"A B"`,
/// which keeps the function idempotent.
pub fn normalize_name(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }

    let upper: String = name
        .to_uppercase()
        .chars()
        .filter(|c| !STRIPPED_PUNCTUATION.contains(c))
        .collect();

    upper.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// TESTS
// ============================================================================
