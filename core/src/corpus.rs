use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;
use time::format_description::well_known::Rfc3339;

pub const SNAPSHOT_VERSION: u32 = 1;

/// One corpus record: the article's source url, its display title, and the
/// raw text to index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub url: String,
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    meta: SnapshotMeta,
    docs: Vec<Document>,
}

/// Read crawler output: one JSON document record per line, blank lines
/// skipped. Extra fields (fetch timestamps etc.) are ignored.
pub fn read_jsonl<P: AsRef<Path>>(path: P) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut docs = Vec::new();
    for (lineno, line) in BufReader::new(f).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: Document = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: malformed document record", path.display(), lineno + 1))?;
        docs.push(doc);
    }
    Ok(docs)
}

/// Write the finished corpus to an opaque snapshot file. The snapshot is the
/// hand-off artifact between acquisition and indexing; nothing else reads it.
pub fn save_snapshot<P: AsRef<Path>>(path: P, docs: &[Document]) -> Result<()> {
    let path = path.as_ref();
    let snapshot = Snapshot {
        meta: SnapshotMeta {
            num_docs: docs.len() as u32,
            created_at: time::OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_else(|_| "".into()),
            version: SNAPSHOT_VERSION,
        },
        docs: docs.to_vec(),
    };
    let bytes = bincode::serialize(&snapshot)?;
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<(Vec<Document>, SnapshotMeta)> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("opening {}", path.display()))?;
    let snapshot: Snapshot = bincode::deserialize(&bytes)
        .with_context(|| format!("{} is not a corpus snapshot", path.display()))?;
    Ok((snapshot.docs, snapshot.meta))
}
