use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Load a stopword file: one lowercase word per line, surrounding whitespace
/// trimmed, blank lines skipped.
pub fn load<P: AsRef<Path>>(path: P) -> Result<HashSet<String>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("opening stopword file {}", path.display()))?;
    let mut words = HashSet::new();
    for line in BufReader::new(f).lines() {
        let line = line?;
        let word = line.trim();
        if word.is_empty() {
            continue;
        }
        words.insert(word.to_string());
    }
    Ok(words)
}
