pub mod archive;
pub mod dashboard;
pub mod diagnostics;
pub mod enrichment;
pub mod llm;
pub mod maintenance;
pub mod metadata;
pub mod recommendations;
pub mod store;
