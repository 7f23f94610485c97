//! Statement retrieval.
//!
//! [`StatementSource`] is the seam to whatever provider supplies statements.
//! [`fetch`] wraps a source so that no provider failure ever reaches the
//! caller: it is logged with the symbol and turned into `None`.

use crate::{HealthError, Result, StatementSet};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A provider of financial statements keyed by symbol.
pub trait StatementSource: std::fmt::Debug {
    /// Retrieve the income statement, balance sheet and cash flow statement
    /// for `symbol`.
    fn statements(&self, symbol: &str) -> Result<StatementSet>;
}

/// Outcome of fetching one symbol; `statements` is `None` when the fetch failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    /// Symbol that was requested
    pub symbol: String,
    /// Statements, or `None` if the provider failed
    pub statements: Option<StatementSet>,
}

/// Fetch statements for one symbol.
///
/// Any provider error is logged together with the symbol and reported as
/// `None`. No retries are attempted.
pub fn fetch(source: &dyn StatementSource, symbol: &str) -> Option<StatementSet> {
    match source.statements(symbol) {
        Ok(statements) => {
            debug!(symbol, "fetched statements");
            Some(statements)
        }
        Err(e) => {
            warn!(symbol, error = %e, "error fetching statements");
            None
        }
    }
}

/// Fetch statements for each symbol in turn.
///
/// Results keep the input order, and a failure for one symbol has no effect on
/// the others.
pub fn fetch_all<S: AsRef<str>>(source: &dyn StatementSource, symbols: &[S]) -> Vec<Fetched> {
    symbols
        .iter()
        .map(|symbol| {
            let symbol = symbol.as_ref();
            Fetched {
                symbol: symbol.to_string(),
                statements: fetch(source, symbol),
            }
        })
        .collect()
}

/// Reads `<dir>/<SYMBOL>.json` files, each a serialized [`StatementSet`].
#[derive(Debug, Clone)]
pub struct JsonDirectorySource {
    dir: PathBuf,
}

impl JsonDirectorySource {
    /// Serve statements from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory statements are read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the statements for `symbol`.
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.json", symbol.to_uppercase()))
    }
}

impl StatementSource for JsonDirectorySource {
    fn statements(&self, symbol: &str) -> Result<StatementSet> {
        let path = self.path_for(symbol);
        let contents = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => HealthError::UnknownSymbol(symbol.to_string()),
            _ => HealthError::Provider {
                symbol: symbol.to_string(),
                message: format!("{}: {e}", path.display()),
            },
        })?;

        serde_json::from_str(&contents).map_err(|e| HealthError::Provider {
            symbol: symbol.to_string(),
            message: format!("{}: {e}", path.display()),
        })
    }
}

/// Statements held in memory, keyed by upper-case symbol.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    statements: HashMap<String, StatementSet>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register statements for `symbol`, replacing any previous set.
    pub fn insert(&mut self, symbol: &str, statements: StatementSet) {
        self.statements.insert(symbol.to_uppercase(), statements);
    }

    /// Builder-style [`MemorySource::insert`].
    pub fn with(mut self, symbol: &str, statements: StatementSet) -> Self {
        self.insert(symbol, statements);
        self
    }
}

impl StatementSource for MemorySource {
    fn statements(&self, symbol: &str) -> Result<StatementSet> {
        self.statements
            .get(&symbol.to_uppercase())
            .cloned()
            .ok_or_else(|| HealthError::UnknownSymbol(symbol.to_string()))
    }
}
