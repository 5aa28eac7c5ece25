use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Character that stands in for spaces inside a node identifier
pub const TITLE_JOINER: char = '_';

/// Normalized page title, the node key of the link graph.
///
/// Case-sensitive. Two titles that differ only in using spaces or `_` are the same node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Title(String);

/// Replaces every space with [`TITLE_JOINER`] and leaves everything else untouched.
pub fn normalize(raw: &str) -> Title {
    Title(raw.replace(' ', "_"))
}

impl Title {
    pub fn new(raw: &str) -> Self {
        normalize(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Empty or made only of joiners/whitespace, i.e. "no title".
    pub fn is_blank(&self) -> bool {
        self.0
            .chars()
            .all(|c| c == TITLE_JOINER || c.is_whitespace())
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Title {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Title {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Title {
    fn from(raw: &str) -> Self {
        normalize(raw)
    }
}

impl From<String> for Title {
    fn from(raw: String) -> Self {
        if raw.contains(' ') {
            normalize(&raw)
        } else {
            Title(raw)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spaces_become_joiners() {
        assert_eq!(normalize("Rust (programming language)").as_str(), "Rust_(programming_language)");
    }

    #[test]
    fn everything_else_is_untouched() {
        assert_eq!(normalize("C++").as_str(), "C++");
        assert_eq!(normalize("AC/DC").as_str(), "AC/DC");
        assert_eq!(normalize("Ödön von Horváth").as_str(), "Ödön_von_Horváth");
        assert_eq!(normalize("a\tb").as_str(), "a\tb");
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "",
            " ",
            "Plain",
            "Two words",
            "Already_joined",
            "Mixed joined and spaced_title",
            "  leading and trailing  ",
            "Émile Zola",
            "Category:Programming languages",
        ];
        for raw in samples {
            let once = normalize(raw);
            let twice = normalize(once.as_str());
            assert_eq!(once, twice, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn space_and_joiner_forms_are_the_same_node() {
        assert_eq!(Title::from("New York City"), Title::from("New_York_City"));
        assert_eq!(Title::from("New York City".to_string()), Title::from("New_York_City"));
    }

    #[test]
    fn titles_are_case_sensitive() {
        assert_ne!(normalize("Rust"), normalize("rust"));
    }

    #[test]
    fn empty_and_whitespace_titles_are_blank() {
        assert!(normalize("").is_blank());
        assert!(normalize("   ").is_blank());
        assert!(normalize("_ _").is_blank());
        assert!(!normalize(" x ").is_blank());
    }

    #[test]
    fn titles_order_lexicographically() {
        let mut titles = vec![normalize("b"), normalize("B"), normalize("a")];
        titles.sort();
        let sorted: Vec<&str> = titles.iter().map(Title::as_str).collect();
        assert_eq!(sorted, vec!["B", "a", "b"]);
    }
}
