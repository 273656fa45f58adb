use std::collections::HashSet;

use crate::{
    error::{AppError, AppResult},
    models::{DedupReport, SheetRows},
    services::store::EntryStore,
};

/// Keeps the first row for every title and drops later repeats.
///
/// Works on raw cells: surviving rows, the header and any extra columns are
/// written back exactly as read. Rows without a title are left alone. The
/// sheet is only rewritten when something was removed.
pub async fn remove_duplicates(store: &dyn EntryStore) -> AppResult<DedupReport> {
    let sheet = store.read_rows().await?;
    let before = sheet.rows.len();

    let kept = dedup_rows(sheet)?;
    let report = DedupReport {
        before,
        after: kept.rows.len(),
        removed: before - kept.rows.len(),
    };

    if report.removed > 0 {
        store.write_rows(&kept).await?;
    }

    tracing::info!(
        before = report.before,
        after = report.after,
        removed = report.removed,
        store = store.name(),
        "Duplicate cleanup finished"
    );

    Ok(report)
}

fn dedup_rows(sheet: SheetRows) -> AppResult<SheetRows> {
    if sheet.rows.is_empty() {
        return Ok(sheet);
    }
    if sheet.column("Title").is_none() {
        return Err(AppError::Internal(
            "Worksheet header has no Title column".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let rows = sheet
        .rows
        .iter()
        .filter(|cells| {
            let title = sheet.title_of(cells);
            title.is_empty() || seen.insert(title)
        })
        .cloned()
        .collect();

    Ok(SheetRows {
        header: sheet.header,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaEntry;
    use crate::services::store::{MemoryStore, MockEntryStore};
    use serde_json::json;

    #[tokio::test]
    async fn test_keeps_first_occurrence() {
        let store = MemoryStore::with_entries(vec![
            MediaEntry::new("Dune", "original"),
            MediaEntry::new("Arrival", "a"),
            MediaEntry::new("Dune", "spam"),
            MediaEntry::new("Dune ", "spam again"),
        ]);

        let report = remove_duplicates(&store).await.unwrap();

        assert_eq!(
            report,
            DedupReport {
                before: 4,
                after: 2,
                removed: 2
            }
        );
        let rows = store.list_entries().await.unwrap();
        assert_eq!(rows[0].entry.comment, "original");
        assert_eq!(rows[1].entry.title, "Arrival");
    }

    #[tokio::test]
    async fn test_surviving_cells_are_written_back_verbatim() {
        let header = vec![
            json!("Date"),
            json!("Title"),
            json!("Platform"),
            json!("Rating"),
            json!("Comment"),
            json!("ReleaseDate"),
            json!("Image"),
            json!("RunningTime"),
            json!("CastCrew"),
            json!("Notes"),
        ];
        let dune = vec![
            json!("01/03/2025"),
            json!("Dune"),
            json!("Cinema"),
            json!(4.3),
            json!("c"),
            json!("Oct 22, 2021"),
            json!(""),
            json!(155),
            json!(""),
            json!("seen twice"),
        ];
        let untitled = vec![json!(45658), json!(""), json!("Netflix")];
        let store = MemoryStore::with_rows(SheetRows {
            header: header.clone(),
            rows: vec![
                dune.clone(),
                untitled.clone(),
                vec![json!("2025-02-01"), json!("Dune"), json!("Netflix"), json!(5)],
            ],
        });

        let report = remove_duplicates(&store).await.unwrap();

        assert_eq!(report.removed, 1);
        let sheet = store.read_rows().await.unwrap();
        assert_eq!(sheet.header, header);
        assert_eq!(sheet.rows, vec![dune, untitled]);
    }

    #[test]
    fn test_missing_title_column_is_an_error() {
        let sheet = SheetRows {
            header: vec![json!("Date")],
            rows: vec![vec![json!("2025-01-01")]],
        };
        assert!(matches!(dedup_rows(sheet), Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_no_rewrite_when_clean() {
        let mut store = MockEntryStore::new();
        store.expect_read_rows().returning(|| {
            Ok(SheetRows {
                header: vec![json!("Date"), json!("Title")],
                rows: vec![vec![json!("2025-01-01"), json!("Dune")]],
            })
        });
        store.expect_write_rows().never();
        store.expect_name().return_const("mock");

        let report = remove_duplicates(&store).await.unwrap();
        assert_eq!(report.removed, 0);
    }
}
