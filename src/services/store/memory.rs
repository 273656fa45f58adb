use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{
        entry::{header_row, FIRST_DATA_ROW},
        MediaEntry, SheetRows, StoredEntry,
    },
    services::store::EntryStore,
};

/// In-process worksheet used when no spreadsheet is configured.
/// Rows are kept as raw cells so it behaves like the real sheet.
pub struct MemoryStore {
    sheet: RwLock<SheetRows>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_entries(Vec::new())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `entries`, first entry on row 2
    pub fn with_entries(entries: Vec<MediaEntry>) -> Self {
        Self::with_rows(SheetRows {
            header: header_row(),
            rows: entries.iter().map(MediaEntry::to_row).collect(),
        })
    }

    /// Creates a store holding exactly these cells
    pub fn with_rows(sheet: SheetRows) -> Self {
        Self {
            sheet: RwLock::new(sheet),
        }
    }
}

#[async_trait::async_trait]
impl EntryStore for MemoryStore {
    async fn list_entries(&self) -> AppResult<Vec<StoredEntry>> {
        Ok(self.sheet.read().await.entries())
    }

    async fn append_entry(&self, entry: &MediaEntry) -> AppResult<()> {
        self.sheet.write().await.rows.push(entry.to_row());
        Ok(())
    }

    async fn update_entry(&self, row: usize, entry: &MediaEntry) -> AppResult<()> {
        let mut sheet = self.sheet.write().await;
        let slot = row
            .checked_sub(FIRST_DATA_ROW)
            .and_then(|idx| sheet.rows.get_mut(idx))
            .ok_or_else(|| AppError::NotFound(format!("Row {} does not exist", row)))?;

        // only the log's columns are overwritten
        let mut cells = entry.to_row();
        if slot.len() > cells.len() {
            cells.extend(slot[cells.len()..].iter().cloned());
        }
        *slot = cells;
        Ok(())
    }

    async fn read_rows(&self) -> AppResult<SheetRows> {
        Ok(self.sheet.read().await.clone())
    }

    async fn write_rows(&self, sheet: &SheetRows) -> AppResult<()> {
        *self.sheet.write().await = sheet.clone();
        Ok(())
    }

    async fn check_access(&self) -> AppResult<String> {
        let sheet = self.sheet.read().await;
        Ok(match sheet.header.first() {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_rows_start_after_header() {
        let store = MemoryStore::new();
        store.append_entry(&MediaEntry::new("Dune", "a")).await.unwrap();
        store.append_entry(&MediaEntry::new("Arrival", "b")).await.unwrap();

        let entries = store.list_entries().await.unwrap();
        assert_eq!(entries[0].row, 2);
        assert_eq!(entries[1].row, 3);
        assert_eq!(entries[1].entry.title, "Arrival");
    }

    #[tokio::test]
    async fn test_update_in_place() {
        let store = MemoryStore::with_entries(vec![
            MediaEntry::new("Dune", "a"),
            MediaEntry::new("Arrival", "b"),
        ]);

        store
            .update_entry(3, &MediaEntry::new("Arrival", "b / c"))
            .await
            .unwrap();

        let entries = store.list_entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].entry.comment, "b / c");
    }

    #[tokio::test]
    async fn test_update_keeps_cells_past_the_log_columns() {
        let mut row = MediaEntry::new("Dune", "a").to_row();
        row.push(json!("my note"));
        let store = MemoryStore::with_rows(SheetRows {
            header: header_row(),
            rows: vec![row],
        });

        store
            .update_entry(2, &MediaEntry::new("Dune", "a / b"))
            .await
            .unwrap();

        let sheet = store.read_rows().await.unwrap();
        assert_eq!(sheet.rows[0].len(), 10);
        assert_eq!(sheet.rows[0][4], json!("a / b"));
        assert_eq!(sheet.rows[0][9], json!("my note"));
    }

    #[test]
    fn test_update_out_of_range_is_not_found() {
        let store = MemoryStore::new();
        let result = tokio_test::block_on(store.update_entry(1, &MediaEntry::new("x", "y")));
        assert!(matches!(result, Err(AppError::NotFound(_))));

        let result = tokio_test::block_on(store.update_entry(2, &MediaEntry::new("x", "y")));
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
