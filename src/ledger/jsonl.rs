//! JSON-lines ledger backend
//!
//! Each stream is a UTF-8 file holding one JSON object per line. Page records,
//! external links and unextractable URLs are appended and flushed per record; the unreachable
//! stream is replaced wholesale through a temporary file and a rename.

use crate::config::OutputConfig;
use crate::ledger::records::UrlLine;
use crate::ledger::traits::{Ledger, LedgerError, LedgerResult};
use crate::ledger::{
    ExternalLinkRecord, PageRecord, PriorState, UnextractableRecord, UnreachableRecord,
};
use crate::url::CrawlTarget;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Locations of the four ledger streams
#[derive(Debug, Clone)]
pub struct LedgerPaths {
    pub records: PathBuf,
    pub unreachable: PathBuf,
    pub external_links: PathBuf,
    pub unextractable: PathBuf,
}

impl From<&OutputConfig> for LedgerPaths {
    fn from(config: &OutputConfig) -> Self {
        Self {
            records: PathBuf::from(&config.records_path),
            unreachable: PathBuf::from(&config.unreachable_path),
            external_links: PathBuf::from(&config.external_links_path),
            unextractable: config.resolved_unextractable_path(),
        }
    }
}

/// Ledger stored as JSON-lines files
pub struct JsonlLedger {
    paths: LedgerPaths,
    records: BufWriter<File>,
    external_links: BufWriter<File>,
    unextractable: BufWriter<File>,
}

impl JsonlLedger {
    /// Opens (creating if needed) the append streams and their directories
    pub fn open(paths: LedgerPaths) -> LedgerResult<Self> {
        for path in [
            &paths.records,
            &paths.unreachable,
            &paths.external_links,
            &paths.unextractable,
        ] {
            ensure_parent_dir(path)?;
        }

        let records = open_append(&paths.records)?;
        let external_links = open_append(&paths.external_links)?;
        let unextractable = open_append(&paths.unextractable)?;

        Ok(Self {
            paths,
            records,
            external_links,
            unextractable,
        })
    }
}

impl Ledger for JsonlLedger {
    fn load_prior_state(&self) -> LedgerResult<PriorState> {
        let mut state = PriorState::default();

        for line in read_stream::<UrlLine>(&self.paths.records)? {
            match CrawlTarget::parse(&line.url) {
                Ok(target) => {
                    state.recorded.insert(target);
                }
                Err(e) => tracing::warn!(
                    "Ignoring record with invalid URL '{}' in {}: {}",
                    line.url,
                    self.paths.records.display(),
                    e
                ),
            }
        }

        for record in read_stream::<UnreachableRecord>(&self.paths.unreachable)? {
            match CrawlTarget::parse(&record.url) {
                Ok(target) => {
                    state.unreachable.insert(target, record);
                }
                Err(e) => tracing::warn!(
                    "Ignoring unreachable entry with invalid URL '{}': {}",
                    record.url,
                    e
                ),
            }
        }

        for line in read_stream::<UrlLine>(&self.paths.external_links)? {
            state.external_links.insert(line.url);
        }

        for line in read_stream::<UrlLine>(&self.paths.unextractable)? {
            if let Ok(target) = CrawlTarget::parse(&line.url) {
                state.unextractable.insert(target);
            }
        }

        Ok(state)
    }

    fn append_page_record(&mut self, record: &PageRecord) -> LedgerResult<()> {
        append_line(&mut self.records, &self.paths.records, record)
    }

    fn append_external_link(&mut self, record: &ExternalLinkRecord) -> LedgerResult<()> {
        append_line(&mut self.external_links, &self.paths.external_links, record)
    }

    fn append_unextractable(&mut self, record: &UnextractableRecord) -> LedgerResult<()> {
        append_line(&mut self.unextractable, &self.paths.unextractable, record)
    }

    fn write_unreachable_snapshot(&mut self, records: &[UnreachableRecord]) -> LedgerResult<()> {
        let path = &self.paths.unreachable;
        let tmp_path = path.with_extension("jsonl.tmp");

        {
            let file = File::create(&tmp_path).map_err(|e| LedgerError::io(&tmp_path, e))?;
            let mut writer = BufWriter::new(file);
            for record in records {
                serde_json::to_writer(&mut writer, record)?;
                writer
                    .write_all(b"\n")
                    .map_err(|e| LedgerError::io(&tmp_path, e))?;
            }
            writer.flush().map_err(|e| LedgerError::io(&tmp_path, e))?;
        }

        fs::rename(&tmp_path, path).map_err(|e| LedgerError::io(path, e))?;
        tracing::debug!(
            "Wrote {} unreachable URLs to {}",
            records.len(),
            path.display()
        );
        Ok(())
    }
}

fn ensure_parent_dir(path: &Path) -> LedgerResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| LedgerError::io(parent, e))
        }
        _ => Ok(()),
    }
}

fn open_append(path: &Path) -> LedgerResult<BufWriter<File>> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(BufWriter::new)
        .map_err(|e| LedgerError::io(path, e))
}

fn append_line<T: Serialize>(
    writer: &mut BufWriter<File>,
    path: &Path,
    record: &T,
) -> LedgerResult<()> {
    let mut line = serde_json::to_vec(record)?;
    line.push(b'\n');
    writer
        .write_all(&line)
        .and_then(|()| writer.flush())
        .map_err(|e| LedgerError::io(path, e))
}

/// Reads one JSON-lines stream, skipping lines that do not parse
///
/// A missing file is an empty stream.
fn read_stream<T: DeserializeOwned>(path: &Path) -> LedgerResult<Vec<T>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(LedgerError::io(path, e)),
    };

    let mut items = Vec::new();
    let mut skipped = 0usize;

    for (index, line) in BufReader::new(file).split(b'\n').enumerate() {
        let line = line.map_err(|e| LedgerError::io(path, e))?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match serde_json::from_slice::<T>(&line) {
            Ok(item) => items.push(item),
            Err(e) => {
                skipped += 1;
                tracing::warn!(
                    "JSON error in line {} of {}: {}. Skipping line",
                    index + 1,
                    path.display(),
                    e
                );
            }
        }
    }

    tracing::info!(
        "Loaded {} entries from {} ({} skipped)",
        items.len(),
        path.display(),
        skipped
    );
    Ok(items)
}
