//! File name normalization
//!
//! File names are compared in database-key form: surrounding whitespace
//! trimmed, runs of spaces and underscores collapsed to a single `_`,
//! first character uppercased.

/// Namespace holding file description pages
pub const NS_FILE: i64 = 6;

/// Canonical namespace names recognized in page locators
const NAMESPACES: &[(&str, i64)] = &[
    ("Talk", 1),
    ("User", 2),
    ("User_talk", 3),
    ("Project", 4),
    ("Project_talk", 5),
    ("File", NS_FILE),
    ("Image", NS_FILE),
    ("File_talk", 7),
    ("MediaWiki", 8),
    ("MediaWiki_talk", 9),
    ("Template", 10),
    ("Template_talk", 11),
    ("Help", 12),
    ("Help_talk", 13),
    ("Category", 14),
    ("Category_talk", 15),
];

/// Split a page locator such as `MediaWiki:Bad image list` into
/// namespace id and database-key title
///
/// An unrecognized prefix is part of a main-namespace title.
pub fn parse_page_locator(locator: &str) -> (i64, String) {
    if let Some((prefix, rest)) = locator.split_once(':') {
        let prefix = normalize_file_name(prefix);
        if let Some((_, ns)) = NAMESPACES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&prefix))
        {
            return (*ns, normalize_file_name(rest));
        }
    }
    (0, normalize_file_name(locator))
}

/// Normalize a file name (without namespace prefix) to database-key form
pub fn normalize_file_name(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut pending_separator = false;
    for ch in name.trim().chars() {
        if ch == ' ' || ch == '_' {
            pending_separator = true;
            continue;
        }
        if pending_separator && !key.is_empty() {
            key.push('_');
        }
        pending_separator = false;
        key.push(ch);
    }

    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spaces_become_underscores() {
        assert_eq!(normalize_file_name("foo bar.jpg"), "Foo_bar.jpg");
    }

    #[test]
    fn test_collapses_and_trims_separators() {
        assert_eq!(normalize_file_name("  _Foo __ bar_.png_ "), "Foo_bar_.png");
    }

    #[test]
    fn test_only_first_character_uppercased() {
        assert_eq!(normalize_file_name("éclair CAKE.svg"), "Éclair_CAKE.svg");
    }

    #[test]
    fn test_parse_page_locator_with_namespace() {
        assert_eq!(
            parse_page_locator("MediaWiki:Bad image list"),
            (8, "Bad_image_list".to_string())
        );
        assert_eq!(parse_page_locator("file:lead.jpg"), (NS_FILE, "Lead.jpg".to_string()));
    }

    #[test]
    fn test_parse_page_locator_main_namespace() {
        assert_eq!(parse_page_locator("Main Page"), (0, "Main_Page".to_string()));
        assert_eq!(parse_page_locator("Star Wars: A New Hope"), (0, "Star_Wars:_A_New_Hope".to_string()));
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(normalize_file_name("   "), "");
    }
}
