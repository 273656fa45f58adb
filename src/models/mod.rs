pub mod dashboard;
pub mod enrichment;
pub mod entry;
pub mod metadata;

pub use dashboard::{
    ChainLink, CheckResult, Dashboard, DashboardStats, DedupReport, FavoriteName, Period,
    RecommendationChain,
};
pub use enrichment::Enrichment;
pub use entry::{same_title, MediaEntry, Rating, SheetRows, StoredEntry};
pub use metadata::{MediaKind, MediaMatch};
