use crate::title::{normalize, Title};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::info;

/// Seed titles of a run. Sorted, so seeds are always expanded in the same order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSet {
    titles: BTreeSet<Title>,
}

impl SeedSet {
    /// Parses a seed list: one title per line, blank lines and `#` comments ignored.
    pub fn parse(text: &str) -> Self {
        let titles = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(normalize)
            .filter(|title| !title.is_blank())
            .collect();
        Self { titles }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed list: {:?}", path))?;
        let seeds = Self::parse(&text);
        info!(seeds = seeds.len(), path = ?path, "Seed list loaded");
        Ok(seeds)
    }

    pub fn from_titles(titles: impl IntoIterator<Item = Title>) -> Self {
        Self {
            titles: titles.into_iter().filter(|t| !t.is_blank()).collect(),
        }
    }

    pub fn contains<Q: AsRef<str> + ?Sized>(&self, title: &Q) -> bool {
        self.titles.contains(title.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Title> {
        self.titles.iter()
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Keeps only the first `limit` seeds in sorted order.
    pub fn truncate(&mut self, limit: usize) {
        if limit < self.titles.len() {
            self.titles = std::mem::take(&mut self.titles)
                .into_iter()
                .take(limit)
                .collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn names(seeds: &SeedSet) -> Vec<&str> {
        seeds.iter().map(Title::as_str).collect()
    }

    #[test]
    fn parse_skips_blanks_and_comments() {
        let seeds = SeedSet::parse("# topics\nRust\n\n   \n# Python\nGraph theory\n");
        assert_eq!(names(&seeds), vec!["Graph_theory", "Rust"]);
    }

    #[test]
    fn duplicates_collapse() {
        let seeds = SeedSet::parse("New York\nNew_York\n  New York  \n");
        assert_eq!(seeds.len(), 1);
        assert!(seeds.contains("New_York"));
    }

    #[test]
    fn membership_uses_normalized_form() {
        let seeds = SeedSet::parse("Graph theory");
        assert!(seeds.contains("Graph_theory"));
        assert!(!seeds.contains("Graph theory"));
        assert!(!seeds.contains("graph_theory"));
    }

    #[test]
    fn membership_accepts_titles_and_strs() {
        let seeds = SeedSet::parse("Graph theory\n");
        assert!(seeds.contains(&Title::from("Graph theory")));
        assert!(seeds.contains("Graph_theory"));
        assert!(!seeds.contains(&Title::from("Rust")));
    }

    #[test]
    fn from_titles_drops_blank_titles() {
        let seeds = SeedSet::from_titles(vec![Title::from(""), Title::from("A")]);
        assert_eq!(names(&seeds), vec!["A"]);
    }

    #[test]
    fn truncate_keeps_first_sorted() {
        let mut seeds = SeedSet::parse("C\nA\nB\n");
        seeds.truncate(2);
        assert_eq!(names(&seeds), vec!["A", "B"]);
        seeds.truncate(10);
        assert_eq!(seeds.len(), 2);
    }

    #[test]
    fn load_reads_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "Rust").unwrap();
        writeln!(tmp, "Python").unwrap();
        tmp.flush().unwrap();

        let seeds = SeedSet::load(tmp.path()).unwrap();
        assert_eq!(names(&seeds), vec!["Python", "Rust"]);
    }

    #[test]
    fn load_fails_for_missing_file() {
        assert!(SeedSet::load(Path::new("/nonexistent/seeds.txt")).is_err());
    }
}
