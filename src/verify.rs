//! Replays an edge stream against an exported degree table.

use crate::config::{degrees_path, edges_path};
use crate::degree::DegreeRow;
use crate::models::Edge;
use crate::output::{read_degrees, read_edges};
use crate::title::Title;
use anyhow::Result;
use rustc_hash::FxHashMap;
use std::fmt;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    SelfEdge(Title),
    InDegree { page: Title, table: u32, edges: u32 },
    OutDegree { page: Title, table: u32, edges: u32 },
    /// Node appears in the edge stream but has no row
    MissingRow(Title),
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::SelfEdge(page) => write!(f, "self-edge on {}", page),
            Mismatch::InDegree { page, table, edges } => {
                write!(f, "{}: inDegree {} in table, {} in edges", page, table, edges)
            }
            Mismatch::OutDegree { page, table, edges } => {
                write!(f, "{}: outDegree {} in table, {} in edges", page, table, edges)
            }
            Mismatch::MissingRow(page) => write!(f, "{}: no row in degree table", page),
        }
    }
}

#[derive(Debug, Default)]
pub struct VerifyReport {
    pub edges: usize,
    pub rows: usize,
    pub mismatches: Vec<Mismatch>,
}

impl VerifyReport {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Counts in/out degrees from `edges` and compares them to `rows`.
pub fn check(edges: &[Edge], rows: &[DegreeRow]) -> VerifyReport {
    let mut counted: FxHashMap<&Title, (u32, u32)> = FxHashMap::default();
    let mut mismatches = Vec::new();

    for edge in edges {
        if edge.source == edge.target {
            mismatches.push(Mismatch::SelfEdge(edge.source.clone()));
        }
        counted.entry(&edge.source).or_default().1 += 1;
        counted.entry(&edge.target).or_default().0 += 1;
    }

    let by_page: FxHashMap<&Title, &DegreeRow> = rows.iter().map(|r| (&r.page, r)).collect();

    for row in rows {
        let (in_edges, out_edges) = counted.get(&row.page).copied().unwrap_or((0, 0));
        if row.in_degree != in_edges {
            mismatches.push(Mismatch::InDegree {
                page: row.page.clone(),
                table: row.in_degree,
                edges: in_edges,
            });
        }
        if row.out_degree != out_edges {
            mismatches.push(Mismatch::OutDegree {
                page: row.page.clone(),
                table: row.out_degree,
                edges: out_edges,
            });
        }
    }

    let mut missing: Vec<&Title> = counted
        .keys()
        .filter(|page| !by_page.contains_key(*page))
        .copied()
        .collect();
    missing.sort();
    mismatches.extend(missing.into_iter().cloned().map(Mismatch::MissingRow));

    VerifyReport {
        edges: edges.len(),
        rows: rows.len(),
        mismatches,
    }
}

/// Reads `edges.tsv` and `degrees.tsv` from `output_dir` and checks them.
pub fn verify_output(output_dir: &Path) -> Result<VerifyReport> {
    let edges = read_edges(&edges_path(output_dir))?;
    let rows = read_degrees(&degrees_path(output_dir))?;
    let report = check(&edges, &rows);
    info!(
        edges = report.edges,
        rows = report.rows,
        mismatches = report.mismatches.len(),
        "Verification complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(source: &str, target: &str) -> Edge {
        Edge {
            source: Title::from(source),
            target: Title::from(target),
        }
    }

    fn row(page: &str, in_degree: u32, out_degree: u32) -> DegreeRow {
        DegreeRow {
            page: Title::from(page),
            seed: false,
            links_from_seed: 0,
            links_to_seed: 0,
            in_degree,
            out_degree,
            outlink_count_when_expanded: 0,
        }
    }

    #[test]
    fn consistent_table() {
        let edges = vec![edge("A", "B"), edge("A", "C"), edge("B", "A")];
        let rows = vec![row("A", 1, 2), row("B", 1, 1), row("C", 1, 0)];
        let report = check(&edges, &rows);
        assert!(report.is_consistent(), "{:?}", report.mismatches);
    }

    #[test]
    fn detects_degree_mismatch() {
        let edges = vec![edge("A", "B")];
        let rows = vec![row("A", 0, 2), row("B", 1, 0)];
        let report = check(&edges, &rows);
        assert_eq!(
            report.mismatches,
            vec![Mismatch::OutDegree {
                page: Title::from("A"),
                table: 2,
                edges: 1
            }]
        );
    }

    #[test]
    fn detects_missing_rows_and_self_edges() {
        let edges = vec![edge("A", "A"), edge("A", "B")];
        let rows = vec![row("A", 1, 2)];
        let report = check(&edges, &rows);
        assert!(report.mismatches.contains(&Mismatch::SelfEdge(Title::from("A"))));
        assert!(report.mismatches.contains(&Mismatch::MissingRow(Title::from("B"))));
    }
}
