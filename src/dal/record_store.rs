use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use anyhow::Context;
use regex::Regex;
use serde::Serialize;

use crate::domain::{
    company::CompanyRecord,
    parse_outcome::{ModelPayload, Normalization},
};

static RE_UNSAFE_FILENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap());

/// A record read back from disk with the file it came from. Serializes as
/// the record's own fields plus `__filename`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRecord {
    #[serde(rename = "__filename")]
    pub file_name: String,
    #[serde(flatten)]
    pub record: CompanyRecord,
}

/// Company records as pretty-printed JSON files in one directory.
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create record directory {}", dir.display()))?;

        Ok(RecordStore { dir })
    }

    /// Parsed responses become `<name>.json`; responses that could not be
    /// parsed are kept verbatim in `<name>_raw.txt`.
    pub fn save(&self, name: &str, normalization: &Normalization) -> anyhow::Result<PathBuf> {
        let name = sanitize_filename(name);

        let path = match &normalization.payload {
            ModelPayload::Record(record) => self.save_record(&name, record)?,
            ModelPayload::Raw(text) => {
                let path = self.dir.join(format!("{}_raw.txt", name));
                fs::write(&path, text)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                path
            }
        };

        log::info!(
            "Saved parsed result to {} [{}]",
            path.display(),
            normalization.outcome
        );
        Ok(path)
    }

    pub fn save_record(&self, name: &str, record: &CompanyRecord) -> anyhow::Result<PathBuf> {
        let path = self.dir.join(format!("{}.json", sanitize_filename(name)));
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(path)
    }

    /// Every readable `*.json` record, ordered by file name.
    pub fn load_all(&self) -> anyhow::Result<Vec<StoredRecord>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list {}", self.dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let records = paths
            .into_iter()
            .filter_map(|path| match read_record(&path) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Failed to load {}: {:?}", path.display(), e);
                    None
                }
            })
            .collect();

        Ok(records)
    }
}

fn read_record(path: &Path) -> anyhow::Result<StoredRecord> {
    let contents = fs::read_to_string(path)?;
    let record = serde_json::from_str(&contents)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(StoredRecord { file_name, record })
}

pub fn sanitize_filename(name: &str) -> String {
    RE_UNSAFE_FILENAME.replace_all(name, "_").into_owned()
}
