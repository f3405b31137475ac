use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::Context;
use laptimer_core::lap_info::Millis;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Durable home of the single best lap time.
///
/// Implementations never fail towards the caller: an unavailable backend
/// loads as "no best time yet" and silently drops saves. `save` always
/// overwrites, so callers only call it with a strictly better time.
pub trait BestTimeStore {
    fn load(&self) -> Option<Millis>;
    fn save(&mut self, best: Millis);
}

// In-process store used by tests and whenever nothing durable is wanted
#[derive(Default, Debug)]
pub struct MemoryStore {
    best: Option<Millis>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_best(best: Millis) -> Self {
        Self {
            best: Some(best),
            saves: 0,
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl BestTimeStore for MemoryStore {
    fn load(&self) -> Option<Millis> {
        self.best
    }

    fn save(&mut self, best: Millis) {
        self.best = Some(best);
        self.saves += 1;
    }
}

// Key-value JSON file standing in for the browser's local storage. Other
// keys already in the file are kept when saving.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    key: String,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>, key: &str) -> Self {
        Self {
            path: path.into(),
            key: key.to_string(),
        }
    }

    fn read_entries(&self) -> anyhow::Result<Map<String, Value>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };

        serde_json::from_str(&text).with_context(|| format!("parsing {}", self.path.display()))
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, text).with_context(|| format!("writing {}", self.path.display()))
    }
}

// Stored values may be integers, floats or numeric strings depending on who
// wrote them; anything negative or non-finite counts as absent
fn parse_millis(value: &Value) -> Option<Millis> {
    if let Some(ms) = value.as_u64() {
        return Some(ms);
    }

    let ms = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if ms.is_finite() && ms >= 0.0 {
        Some(ms.round() as Millis)
    } else {
        None
    }
}

impl BestTimeStore for FileStore {
    fn load(&self) -> Option<Millis> {
        match self.read_entries() {
            Ok(entries) => entries.get(&self.key).and_then(parse_millis),
            Err(e) => {
                warn!("best time unavailable, continuing in memory: {:#}", e);
                None
            }
        }
    }

    fn save(&mut self, best: Millis) {
        let mut entries = self.read_entries().unwrap_or_else(|e| {
            warn!("discarding unreadable best time file: {:#}", e);
            Map::new()
        });
        entries.insert(self.key.clone(), Value::from(best));

        match self.write_entries(&entries) {
            Ok(()) => debug!(best, path = %self.path.display(), "saved best time"),
            Err(e) => warn!("could not persist best time: {:#}", e),
        }
    }
}
