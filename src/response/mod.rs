//! Tool Response Builder
//!
//! Turns an upstream tabular result into the uniform tool response: a paginated
//! Markdown preview, a structured payload, or a JSON export on disk. Every consumer
//! goes through [`table::Table::to_records`] so preview, payload and export agree
//! on the JSON shape of a row.

pub mod envelope;
pub mod export;
pub mod markdown;
pub mod pagination;
pub mod table;

pub use envelope::ToolResponse;
pub use export::{ExportSummary, persist};
pub use markdown::{entity_heading, render_listing, render_record, render_table};
pub use pagination::{Page, Window, paginate};
pub use table::{Cell, Record, Table, Tabular, to_records};
