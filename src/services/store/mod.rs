/// Entry datastore abstraction
///
/// The log lives in a spreadsheet: row 1 is the header, every following row is
/// one `MediaEntry`. Implementations expose the same 1-based row numbering so
/// callers can update an entry in place after reading it.
use crate::{
    error::AppResult,
    models::{MediaEntry, SheetRows, StoredEntry},
};

pub mod credentials;
pub mod google_sheets;
pub mod memory;

pub use google_sheets::GoogleSheetsStore;
pub use memory::MemoryStore;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EntryStore: Send + Sync {
    /// Reads every data row, in sheet order
    async fn list_entries(&self) -> AppResult<Vec<StoredEntry>>;

    /// Appends a row after the last data row
    async fn append_entry(&self, entry: &MediaEntry) -> AppResult<()>;

    /// Overwrites columns A through I of `row`
    async fn update_entry(&self, row: usize, entry: &MediaEntry) -> AppResult<()>;

    /// Every cell of the worksheet, untouched
    async fn read_rows(&self) -> AppResult<SheetRows>;

    /// Clears the worksheet and writes `sheet` back from A1
    async fn write_rows(&self, sheet: &SheetRows) -> AppResult<()>;

    /// Reads cell A1 to confirm the store is reachable
    async fn check_access(&self) -> AppResult<String>;

    /// Store name for logging and debugging
    fn name(&self) -> &'static str;
}
