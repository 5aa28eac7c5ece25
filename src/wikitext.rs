use once_cell::sync::Lazy;
use regex::Regex;

/// Captures the target of a `[[...]]` link up to the first `|`, `#`, `/`, bracket, brace or newline.
pub static LINK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\[\]{}|#/\n]*)").unwrap());

/// Yields the raw target of every closed wikilink in `body`, in order of appearance.
///
/// Duplicates, non-article namespaces and unresolved redirects are all passed through;
/// the resolver filters them. Calling again restarts the scan.
pub fn extract_links(body: &str) -> impl Iterator<Item = &str> + '_ {
    LINK_REGEX.captures_iter(body).filter_map(move |caps| {
        let target = caps.get(1)?;
        if !closes_on_line(&body[target.end()..]) {
            return None;
        }
        let target = target.as_str().trim();
        (!target.is_empty()).then_some(target)
    })
}

/// A link counts only if `]]` follows before the end of its line.
fn closes_on_line(rest: &str) -> bool {
    rest.split('\n').next().is_some_and(|line| line.contains("]]"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(body: &str) -> Vec<&str> {
        extract_links(body).collect()
    }

    #[test]
    fn plain_link() {
        assert_eq!(links("See [[Rust]]."), vec!["Rust"]);
    }

    #[test]
    fn alias_is_dropped() {
        assert_eq!(links("[[C++|C plus plus]]"), vec!["C++"]);
    }

    #[test]
    fn section_anchor_is_dropped() {
        assert_eq!(links("[[Rust (programming language)#History|history]]"), vec![
            "Rust (programming language)"
        ]);
    }

    #[test]
    fn subpage_is_dropped() {
        assert_eq!(links("[[Portal:Science/Featured]]"), vec!["Portal:Science"]);
    }

    #[test]
    fn order_follows_body_and_keeps_duplicates() {
        let body = "[[B]] then [[A]] and [[B|again]]";
        assert_eq!(links(body), vec!["B", "A", "B"]);
    }

    #[test]
    fn namespaced_links_pass_through() {
        let body = "[[File:Logo.svg|thumb|A logo]] [[Category:Science]] [[Talk:Rust]]";
        assert_eq!(links(body), vec!["File:Logo.svg", "Category:Science", "Talk:Rust"]);
    }

    #[test]
    fn nested_link_inside_file_caption() {
        let body = "[[File:Map.png|thumb|Map of [[France]]]]";
        assert_eq!(links(body), vec!["File:Map.png", "France"]);
    }

    #[test]
    fn section_only_link_is_skipped() {
        assert!(links("[[#Early life|see above]]").is_empty());
    }

    #[test]
    fn template_inside_link_stops_extraction() {
        assert_eq!(links("[[Foo{{!}}Bar]]"), vec!["Foo"]);
        assert!(links("[[{{PAGENAME}}]]").is_empty());
    }

    #[test]
    fn unclosed_links_are_skipped() {
        assert!(links("text [[Dangling").is_empty());
        assert!(links("[[Broken|alias\ncontinues]]").is_empty());
        assert!(links("[[").is_empty());
        assert!(links("[[\n]]").is_empty());
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(links("[[  Spaced out  ]]"), vec!["Spaced out"]);
    }

    #[test]
    fn no_links() {
        assert!(links("Just a paragraph with {{a template}} and [http://x.org ext].").is_empty());
    }

    #[test]
    fn extraction_is_restartable() {
        let body = "[[A]] [[B]]";
        let first: Vec<&str> = extract_links(body).collect();
        let second: Vec<&str> = extract_links(body).collect();
        assert_eq!(first, second);
    }
}
