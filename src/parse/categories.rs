//! Category name to numeric id lookup.

// Canonical names plus the older labels used by legacy watch pages.
const CATEGORIES: &[(&str, u32)] = &[
    ("film & animation", 1),
    ("film", 1),
    ("autos & vehicles", 2),
    ("autos", 2),
    ("music", 10),
    ("pets & animals", 15),
    ("animals", 15),
    ("sports", 17),
    ("short movies", 18),
    ("travel & events", 19),
    ("travel & places", 19),
    ("gaming", 20),
    ("videoblogging", 21),
    ("people & blogs", 22),
    ("people", 22),
    ("comedy", 23),
    ("entertainment", 24),
    ("news & politics", 25),
    ("news", 25),
    ("howto & style", 26),
    ("howto & diy", 26),
    ("education", 27),
    ("science & technology", 28),
    ("science & tech", 28),
    ("nonprofits & activism", 29),
    ("nonprofit", 29),
    ("movies", 30),
    ("anime/animation", 31),
    ("action/adventure", 32),
    ("classics", 33),
    ("documentary", 35),
    ("drama", 36),
    ("family", 37),
    ("foreign", 38),
    ("horror", 39),
    ("sci-fi/fantasy", 40),
    ("thriller", 41),
    ("shorts", 42),
    ("shows", 43),
    ("trailers", 44),
];

/// Maps a category name to its numeric id; unknown names yield `None`.
///
/// Matching ignores case, surrounding whitespace and `and` versus `&`.
pub fn category_id(name: &str) -> Option<u32> {
    let normalized = name
        .trim()
        .to_lowercase()
        .replace(" and ", " & ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    CATEGORIES
        .iter()
        .find(|(known, _)| *known == normalized)
        .map(|(_, id)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_categories() {
        assert_eq!(category_id("Comedy"), Some(23));
        assert_eq!(category_id("  Music "), Some(10));
        assert_eq!(category_id("Science & Technology"), Some(28));
        assert_eq!(category_id("Pets and Animals"), Some(15));
        assert_eq!(category_id("Howto & DIY"), Some(26));
    }

    #[test]
    fn test_unknown_category_is_not_guessed() {
        assert_eq!(category_id("Cooking"), None);
        assert_eq!(category_id(""), None);
    }
}
