use crate::config::{CACHE_EXTENSION, CACHE_NAME_HASH_LEN, CACHE_NAME_PREFIX_MAX};
use crate::title::Title;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::form_urlencoded;

/// Durable per-title store of resolved outlink lists, one file per title.
///
/// A non-empty record is trusted as-is across runs; nothing checks it for freshness.
/// `refresh` makes every lookup a miss so records get rewritten.
pub struct OutlinkCache {
    dir: PathBuf,
    refresh: bool,
}

impl OutlinkCache {
    pub fn open(dir: impl Into<PathBuf>, refresh: bool) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory: {:?}", dir))?;
        Ok(Self { dir, refresh })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, title: &Title) -> PathBuf {
        self.dir.join(file_name(title))
    }

    /// Returns the cached outlinks of `title` if a non-empty record exists.
    ///
    /// Unreadable records are treated as absent.
    pub fn try_load(&self, title: &Title) -> Option<Vec<Title>> {
        if self.refresh {
            return None;
        }

        let path = self.record_path(title);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(title = %title, error = %e, "Outlink cache record is unreadable");
                return None;
            }
        };

        let outlinks: Vec<Title> = content
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(Title::from)
            .collect();

        if outlinks.is_empty() {
            return None;
        }

        debug!(title = %title, outlinks = outlinks.len(), "Outlink cache hit");
        Some(outlinks)
    }

    /// Persists `outlinks` for `title`, writing atomically via rename.
    pub fn store(&self, title: &Title, outlinks: &[Title]) -> Result<()> {
        let path = self.record_path(title);
        let tmp_path = path.with_extension(format!("{}.tmp", CACHE_EXTENSION));

        let file = File::create(&tmp_path)
            .with_context(|| format!("Failed to create temp cache file: {:?}", tmp_path))?;
        let mut writer = BufWriter::new(file);
        for outlink in outlinks {
            writeln!(writer, "{}", outlink)?;
        }
        writer
            .into_inner()
            .map_err(|e| e.into_error())
            .with_context(|| format!("Failed to flush cache file: {:?}", tmp_path))?;

        fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to rename temp cache file to: {:?}", path))?;

        debug!(title = %title, outlinks = outlinks.len(), "Outlink cache record saved");
        Ok(())
    }
}

/// Lowercased form-urlencoded title prefix plus a hash of the exact title.
///
/// Encoding keeps `/` and other path characters out of the name, and the prefix is capped so
/// long non-Latin titles stay under file name limits. The hash separates titles that share a
/// prefix or differ only in case, which matters on case-insensitive file systems.
fn file_name(title: &Title) -> String {
    let encoded: String = form_urlencoded::byte_serialize(title.as_str().as_bytes()).collect();
    let mut prefix = encoded.to_ascii_lowercase();
    prefix.truncate(CACHE_NAME_PREFIX_MAX);
    let digest = format!("{:x}", Sha256::digest(title.as_str().as_bytes()));
    format!(
        "{}-{}.{}",
        prefix,
        &digest[..CACHE_NAME_HASH_LEN],
        CACHE_EXTENSION
    )
}
