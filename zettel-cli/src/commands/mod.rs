//! CLI command implementations.

pub mod check;
pub mod export;
pub mod search;
pub mod theme;

pub use check::check_payload;
pub use export::{export_records, pack_records};
pub use search::{search_book, SearchOptions};
pub use theme::{install_theme, print_theme_script};
