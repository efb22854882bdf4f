use crate::data::parse_headcounts;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shown when a district has no headcount.
pub const NOT_AVAILABLE: &str = "N/A";

/// Unemployed headcount by district name. The table can be filled in after
/// the session starts; until then every lookup answers [`NOT_AVAILABLE`].
#[derive(Debug, Clone, Default)]
pub struct HeadcountLookup {
    table: Arc<RwLock<Option<HashMap<String, String>>>>,
}

impl HeadcountLookup {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn with_table(table: HashMap<String, String>) -> Self {
        Self {
            table: Arc::new(RwLock::new(Some(table))),
        }
    }

    /// Read (or re-read) the `laname,unemp` CSV and swap it in.
    pub async fn load(&self, path: &Path) -> Result<usize> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read headcount CSV: {:?}", path))?;
        let table = parse_headcounts(bytes.as_slice())
            .with_context(|| format!("Failed to parse headcount CSV: {:?}", path))?;
        let count = table.len();
        *self.table.write().await = Some(table);
        tracing::info!("Loaded headcounts for {} districts", count);
        Ok(count)
    }

    pub async fn lookup_headcount(&self, name: &str) -> String {
        let table = self.table.read().await;
        table
            .as_ref()
            .and_then(|t| t.get(name))
            .cloned()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn exact_name_match() {
        let lookup = HeadcountLookup::with_table(HashMap::from([(
            "Hartlepool".to_string(),
            "4800".to_string(),
        )]));
        assert_eq!(lookup.lookup_headcount("Hartlepool").await, "4800");
        assert_eq!(lookup.lookup_headcount("hartlepool").await, NOT_AVAILABLE);
        assert_eq!(lookup.lookup_headcount("Darlington").await, "N/A");
    }

    #[tokio::test]
    async fn unloaded_table_is_not_an_error() {
        let lookup = HeadcountLookup::new();
        assert_eq!(lookup.lookup_headcount("Hartlepool").await, "N/A");
    }

    #[tokio::test]
    async fn load_replaces_table_for_all_clones() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "laname,unemp\nHartlepool,4800\nMiddlesbrough,7100").unwrap();

        let lookup = HeadcountLookup::new();
        let shared = lookup.clone();
        assert_eq!(lookup.load(file.path()).await.unwrap(), 2);
        assert_eq!(shared.lookup_headcount("Middlesbrough").await, "7100");
    }

    #[tokio::test]
    async fn missing_file_leaves_table_unloaded() {
        let dir = tempfile::tempdir().unwrap();
        let lookup = HeadcountLookup::new();
        assert!(lookup.load(&dir.path().join("number-unemp.csv")).await.is_err());
        assert_eq!(lookup.lookup_headcount("Hartlepool").await, "N/A");
    }
}
