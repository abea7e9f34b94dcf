//! Accumulate per-market row sets and flush them as numbered partitions.

use super::frame::{file_hash, rows_to_dataframe, write_parquet_atomic};
use super::PersistError;
use crate::features::FeatureRow;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const PARTITION_PREFIX: &str = "features_";
pub const PARTITION_EXT: &str = "parquet";

/// `features_0007.parquet`
pub fn partition_file_name(sequence: u32) -> String {
    format!("{PARTITION_PREFIX}{sequence:04}.{PARTITION_EXT}")
}

/// Sequence number of a partition file name, if it is one.
pub fn parse_partition_seq(file_name: &str) -> Option<u32> {
    let digits = file_name
        .strip_prefix(PARTITION_PREFIX)?
        .strip_suffix(PARTITION_EXT)?
        .strip_suffix('.')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Partition files in `dir`, sorted by sequence number.
pub fn list_partitions(dir: &Path) -> Result<Vec<(u32, PathBuf)>, PersistError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| PersistError::io(dir, e))? {
        let entry = entry.map_err(|e| PersistError::io(dir, e))?;
        let name = entry.file_name();
        if let Some(seq) = name.to_str().and_then(parse_partition_seq) {
            found.push((seq, entry.path()));
        }
    }
    found.sort_by_key(|(seq, _)| *seq);
    Ok(found)
}

/// A partition written by this writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionInfo {
    pub sequence: u32,
    pub path: PathBuf,
    pub rows: usize,
    pub markets: usize,
    pub content_hash: String,
}

/// Buffers row sets in memory and writes one partition whenever the running
/// market position reaches a multiple of `write_every`.
///
/// The position counts every market handed to the pipeline, including ones
/// that were skipped, but a flush is only considered after a market that
/// produced rows.
#[derive(Debug)]
pub struct PartitionWriter {
    out_dir: PathBuf,
    write_every: usize,
    next_sequence: u32,
    pending: Vec<Vec<FeatureRow>>,
    written: Vec<PartitionInfo>,
}

impl PartitionWriter {
    /// Create `out_dir` if needed and continue numbering after any existing
    /// partitions.
    pub fn open(out_dir: impl Into<PathBuf>, write_every: usize) -> Result<Self, PersistError> {
        let out_dir = out_dir.into();
        fs::create_dir_all(&out_dir).map_err(|e| PersistError::io(&out_dir, e))?;
        let next_sequence = list_partitions(&out_dir)?
            .last()
            .map(|(seq, _)| seq + 1)
            .unwrap_or(0);
        if next_sequence > 0 {
            info!(
                out_dir = %out_dir.display(),
                next_sequence,
                "resuming after existing partitions"
            );
        }
        Ok(Self {
            out_dir,
            write_every: write_every.max(1),
            next_sequence,
            pending: Vec::new(),
            written: Vec::new(),
        })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn next_sequence(&self) -> u32 {
        self.next_sequence
    }

    /// Row sets waiting for the next flush.
    pub fn pending_markets(&self) -> usize {
        self.pending.len()
    }

    /// Partitions written so far.
    pub fn written(&self) -> &[PartitionInfo] {
        &self.written
    }

    /// Add the rows of the market at 1-based `position` in discovery order.
    ///
    /// Flushes when `position` is a multiple of `write_every`. An empty row
    /// set is ignored and never triggers a flush.
    pub fn push(
        &mut self,
        rows: Vec<FeatureRow>,
        position: usize,
    ) -> Result<Option<PartitionInfo>, PersistError> {
        if rows.is_empty() {
            return Ok(None);
        }
        self.pending.push(rows);
        if position % self.write_every == 0 {
            self.flush()
        } else {
            Ok(None)
        }
    }

    /// Write everything pending as one partition. No-op when nothing is pending.
    pub fn flush(&mut self) -> Result<Option<PartitionInfo>, PersistError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        let markets = self.pending.len();
        let rows: Vec<FeatureRow> = self.pending.drain(..).flatten().collect();

        let sequence = self.next_sequence;
        let path = self.out_dir.join(partition_file_name(sequence));
        let mut df = rows_to_dataframe(&rows)?;
        write_parquet_atomic(&mut df, &path)?;
        let content_hash = file_hash(&path)?;

        self.next_sequence += 1;
        info!(
            path = %path.display(),
            rows = rows.len(),
            markets,
            "wrote partition"
        );

        let info = PartitionInfo {
            sequence,
            path,
            rows: rows.len(),
            markets,
            content_hash,
        };
        self.written.push(info.clone());
        Ok(Some(info))
    }

    /// Flush the remainder and return every partition written.
    pub fn finish(mut self) -> Result<Vec<PartitionInfo>, PersistError> {
        self.flush()?;
        Ok(self.written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::read_partition;
    use crate::storage::sample_row as row;

    #[test]
    fn file_names_are_zero_padded() {
        assert_eq!(partition_file_name(0), "features_0000.parquet");
        assert_eq!(partition_file_name(42), "features_0042.parquet");
        assert_eq!(partition_file_name(12345), "features_12345.parquet");
    }

    #[test]
    fn parses_only_partition_names() {
        assert_eq!(parse_partition_seq("features_0003.parquet"), Some(3));
        assert_eq!(parse_partition_seq("features_12345.parquet"), Some(12345));
        assert_eq!(parse_partition_seq("features_0003.parquet.tmp"), None);
        assert_eq!(parse_partition_seq("features_.parquet"), None);
        assert_eq!(parse_partition_seq("features_x1.parquet"), None);
        assert_eq!(parse_partition_seq("other_0001.parquet"), None);
    }

    #[test]
    fn flushes_at_threshold_and_on_finish() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = PartitionWriter::open(dir.path(), 3).unwrap();
        let mut flushed = Vec::new();
        for i in 0..7 {
            if let Some(p) = writer.push(vec![row(&format!("m{i}"), i)], i as usize + 1).unwrap() {
                flushed.push(p);
            }
        }
        assert_eq!(flushed.len(), 2);
        assert_eq!(writer.pending_markets(), 1);

        let all = writer.finish().unwrap();
        let rows: Vec<usize> = all.iter().map(|p| p.rows).collect();
        assert_eq!(rows, [3, 3, 1]);
        let seqs: Vec<u32> = all.iter().map(|p| p.sequence).collect();
        assert_eq!(seqs, [0, 1, 2]);
        assert!(dir.path().join("features_0002.parquet").exists());
    }

    #[test]
    fn partition_keeps_accumulation_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = PartitionWriter::open(dir.path(), 2).unwrap();
        writer.push(vec![row("b", 2), row("b", 3)], 1).unwrap();
        let info = writer.push(vec![row("a", 1)], 2).unwrap().unwrap();
        assert_eq!(info.markets, 2);

        let df = read_partition(&info.path).unwrap();
        let slugs: Vec<Option<&str>> = df
            .column("market_slug")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(slugs, [Some("b"), Some("b"), Some("a")]);
    }

    #[test]
    fn skipped_positions_still_advance_the_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = PartitionWriter::open(dir.path(), 2).unwrap();
        // Positions 2, 4 and 5 produced no rows.
        assert!(writer.push(vec![row("a", 1)], 1).unwrap().is_none());
        assert!(writer.push(vec![row("b", 1)], 3).unwrap().is_none());
        assert_eq!(writer.pending_markets(), 2);

        let info = writer.push(vec![row("c", 1)], 6).unwrap().unwrap();
        assert_eq!(info.markets, 3);
        assert_eq!(writer.pending_markets(), 0);
    }

    #[test]
    fn empty_row_sets_do_not_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = PartitionWriter::open(dir.path(), 1).unwrap();
        assert!(writer.push(Vec::new(), 1).unwrap().is_none());
        assert!(writer.finish().unwrap().is_empty());
        assert!(list_partitions(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn sequence_resumes_after_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = PartitionWriter::open(dir.path(), 1).unwrap();
        first.push(vec![row("a", 1)], 1).unwrap();
        first.push(vec![row("b", 1)], 2).unwrap();
        first.finish().unwrap();

        let mut second = PartitionWriter::open(dir.path(), 1).unwrap();
        assert_eq!(second.next_sequence(), 2);
        let info = second.push(vec![row("c", 1)], 1).unwrap().unwrap();
        assert_eq!(info.path.file_name().unwrap(), "features_0002.parquet");
        assert_eq!(list_partitions(dir.path()).unwrap().len(), 3);
    }

    #[test]
    fn content_hash_is_blake3_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = PartitionWriter::open(dir.path(), 1).unwrap();
        let info = writer.push(vec![row("a", 1)], 1).unwrap().unwrap();
        let bytes = fs::read(&info.path).unwrap();
        assert_eq!(info.content_hash, blake3::hash(&bytes).to_hex().to_string());
    }
}
