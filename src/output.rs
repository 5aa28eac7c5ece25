use crate::degree::DegreeRow;
use crate::models::Edge;
use crate::title::Title;
use anyhow::{Context, Result};
use csv::{QuoteStyle, ReaderBuilder, Writer, WriterBuilder};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Append-only `source<TAB>target` edge stream, no header.
///
/// Records are buffered whole, so a flush never leaves a partial line behind.
pub struct EdgeWriter {
    writer: Writer<BufWriter<File>>,
    written: u64,
}

impl EdgeWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create edge file: {:?}", path))?;
        let writer = WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .quote_style(QuoteStyle::Never)
            .from_writer(BufWriter::with_capacity(128 * 1024, file));
        Ok(Self { writer, written: 0 })
    }

    pub fn write(&mut self, edge: &Edge) -> Result<()> {
        self.writer
            .write_record([edge.source.as_str(), edge.target.as_str()])?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush edge file")
    }
}

pub fn read_edges(path: &Path) -> Result<Vec<Edge>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open edge file: {:?}", path))?;
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quoting(false)
        .from_reader(BufReader::new(file));

    let mut edges = Vec::new();
    for result in reader.records() {
        let record = result?;
        let source = record.get(0).context("Edge line without source")?;
        let target = record.get(1).context("Edge line without target")?;
        edges.push(Edge {
            source: Title::from(source),
            target: Title::from(target),
        });
    }
    Ok(edges)
}

pub fn read_degrees(path: &Path) -> Result<Vec<DegreeRow>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open degree table: {:?}", path))?;
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .from_reader(BufReader::new(file));

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: DegreeRow = result?;
        rows.push(row);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn edge(source: &str, target: &str) -> Edge {
        Edge::new(&Title::from(source), &Title::from(target)).unwrap()
    }

    #[test]
    fn writes_tab_separated_lines_without_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("edges.tsv");

        let mut writer = EdgeWriter::create(&path).unwrap();
        writer.write(&edge("A", "B")).unwrap();
        writer.write(&edge("A", "The \"Quoted\" Page")).unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.written(), 2);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "A\tB\nA\tThe_\"Quoted\"_Page\n");
    }

    #[test]
    fn edges_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("edges.tsv");

        let mut writer = EdgeWriter::create(&path).unwrap();
        writer.write(&edge("A", "B")).unwrap();
        writer.write(&edge("B", "C,D")).unwrap();
        writer.flush().unwrap();

        let edges = read_edges(&path).unwrap();
        assert_eq!(edges, vec![edge("A", "B"), edge("B", "C,D")]);
    }

    #[test]
    fn read_edges_fails_for_missing_file() {
        assert!(read_edges(Path::new("/nonexistent/edges.tsv")).is_err());
    }
}
