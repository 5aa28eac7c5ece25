use crate::seeds::SeedSet;
use crate::title::Title;
use anyhow::{Context, Result};
use csv::{QuoteStyle, WriterBuilder};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DegreeRecord {
    pub is_seed: bool,
    pub links_from_seed: u32,
    pub links_to_seed: u32,
    pub in_degree: u32,
    pub out_degree: u32,
    pub outlink_count_when_expanded: u32,
}

/// One row of the exported degree table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DegreeRow {
    #[serde(rename = "Page")]
    pub page: Title,
    pub seed: bool,
    pub links_from_seed: u32,
    pub links_to_seed: u32,
    pub in_degree: u32,
    pub out_degree: u32,
    pub outlink_count_when_expanded: u32,
}

impl DegreeRow {
    fn new(page: &Title, record: &DegreeRecord) -> Self {
        Self {
            page: page.clone(),
            seed: record.is_seed,
            links_from_seed: record.links_from_seed,
            links_to_seed: record.links_to_seed,
            in_degree: record.in_degree,
            out_degree: record.out_degree,
            outlink_count_when_expanded: record.outlink_count_when_expanded,
        }
    }
}

/// Per-node statistics, aggregated as edges are discovered.
#[derive(Debug, Default)]
pub struct DegreeTable {
    records: FxHashMap<Title, DegreeRecord>,
}

impl DegreeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-insert-default; flags the record as a seed when `title` is one.
    pub fn entry(&mut self, title: &Title, seeds: &SeedSet) -> &mut DegreeRecord {
        let record = self.records.entry(title.clone()).or_default();
        if seeds.contains(title) {
            record.is_seed = true;
        }
        record
    }

    pub fn get(&self, title: &str) -> Option<&DegreeRecord> {
        self.records.get(title)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Counts one `source -> target` edge on both endpoints.
    pub fn record_edge(&mut self, source: &Title, target: &Title, seeds: &SeedSet) {
        let source_is_seed = seeds.contains(source);
        let target_is_seed = seeds.contains(target);

        let from = self.entry(source, seeds);
        from.out_degree += 1;
        if target_is_seed {
            from.links_to_seed += 1;
        }

        let to = self.entry(target, seeds);
        to.in_degree += 1;
        if source_is_seed {
            to.links_from_seed += 1;
        }
    }

    /// Records how many outlinks `title` had when expanded. Titles without a record
    /// (no edges yet) are left out of the table.
    pub fn set_expanded(&mut self, title: &Title, outlinks: usize) {
        if let Some(record) = self.records.get_mut(title) {
            record.outlink_count_when_expanded = outlinks as u32;
        }
    }

    /// Rows sorted by title.
    pub fn rows(&self) -> Vec<DegreeRow> {
        let mut rows: Vec<DegreeRow> = self
            .records
            .iter()
            .map(|(title, record)| DegreeRow::new(title, record))
            .collect();
        rows.sort_by(|a, b| a.page.cmp(&b.page));
        rows
    }

    /// Writes the table as tab-separated values with a header row.
    pub fn write_tsv(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create degree table: {:?}", path))?;
        let mut writer = WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(QuoteStyle::Never)
            .from_writer(BufWriter::with_capacity(128 * 1024, file));

        for row in self.rows() {
            writer.serialize(&row)?;
        }
        writer.flush()?;
        Ok(())
    }
}
