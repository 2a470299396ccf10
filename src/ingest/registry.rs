use std::io::Read;
use std::path::Path;

use tracing::{debug, info, warn};

use super::{BankIngestor, MappedIngestor, SebIngestor};
use crate::error::Result;
use crate::settings::Settings;

/// Name of the extension point third-party ingestors register under.
pub const EXTENSION_POINT: &str = "budget_ingest.ingestors";

/// Lines of the file handed to `sniff`.
pub const SAMPLE_LINES: usize = 5;

const SAMPLE_BYTES: u64 = 64 * 1024;

pub type IngestorFactory = fn() -> Box<dyn BankIngestor>;

/// Named ingestor factories contributed by code outside this crate.
/// Settings decide which of them are enabled and in what order.
#[derive(Default)]
pub struct PluginCatalog {
    entries: Vec<(String, IngestorFactory)>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the factory registered under `name`.
    pub fn register(&mut self, name: &str, factory: IngestorFactory) {
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| n == name) {
            entry.1 = factory;
        } else {
            self.entries.push((name.to_string(), factory));
        }
    }

    pub fn get(&self, name: &str) -> Option<IngestorFactory> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| *f)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }
}

/// Ordered list of candidate ingestors, resolved once.
pub struct IngestorRegistry {
    ingestors: Vec<Box<dyn BankIngestor>>,
}

impl IngestorRegistry {
    /// Built-in ingestors only.
    pub fn builtin() -> Self {
        Self {
            ingestors: vec![Box::new(SebIngestor)],
        }
    }

    /// Built-ins, then enabled catalog plugins in settings order, then
    /// mapped ingestors in settings order.
    pub fn from_settings(settings: &Settings, catalog: &PluginCatalog) -> Result<Self> {
        let mut registry = Self::builtin();
        for name in &settings.plugins {
            match catalog.get(name) {
                Some(factory) => registry.register(factory()),
                None => warn!(
                    plugin = name.as_str(),
                    extension_point = EXTENSION_POINT,
                    "unknown ingestor plugin, skipping"
                ),
            }
        }
        for cfg in &settings.mapped_ingestors {
            registry.register(Box::new(MappedIngestor::new(cfg.clone())?));
        }
        Ok(registry)
    }

    pub fn register(&mut self, ingestor: Box<dyn BankIngestor>) {
        self.ingestors.push(ingestor);
    }

    pub fn names(&self) -> Vec<&str> {
        self.ingestors.iter().map(|i| i.name()).collect()
    }

    /// First candidate whose `sniff` accepts `sample`.
    pub fn select(&self, sample: &str) -> Option<&dyn BankIngestor> {
        for ing in &self.ingestors {
            if ing.sniff(sample) {
                return Some(ing.as_ref());
            }
        }
        None
    }

    /// Sniff the head of `path`. `Ok(None)` means nothing recognised the
    /// file; only I/O failures are errors.
    pub fn find_for_file(&self, path: &Path) -> Result<Option<&dyn BankIngestor>> {
        let sample = read_sample(path)?;
        let found = self.select(&sample);
        match found {
            Some(ing) => info!(file = %path.display(), ingestor = ing.name(), "matched ingestor"),
            None => debug!(file = %path.display(), candidates = ?self.names(), "no ingestor matched"),
        }
        Ok(found)
    }

    /// Take ownership of the matching ingestor.
    pub fn into_match(self, sample: &str) -> Option<Box<dyn BankIngestor>> {
        self.ingestors.into_iter().find(|i| i.sniff(sample))
    }
}

/// First [`SAMPLE_LINES`] lines of `path`. Bytes that are not valid UTF-8
/// are dropped.
pub fn read_sample(path: &Path) -> Result<String> {
    let mut buf = Vec::new();
    std::fs::File::open(path)?
        .take(SAMPLE_BYTES)
        .read_to_end(&mut buf)?;
    let text: String = String::from_utf8_lossy(&buf)
        .chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER)
        .collect();
    Ok(text.lines().take(SAMPLE_LINES).collect::<Vec<_>>().join("\n"))
}

/// Convenience over the built-in registry.
pub fn get_matching_ingestor(path: &Path) -> Result<Option<Box<dyn BankIngestor>>> {
    let sample = read_sample(path)?;
    Ok(IngestorRegistry::builtin().into_match(&sample))
}
