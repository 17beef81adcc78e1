pub mod command;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod history;
pub mod ids;
pub mod models;
pub mod selection;
pub mod storage;
pub mod store;

// Re-export commonly used types
pub use command::{AlwaysConfirm, Command, Confirm, Outcome, Shortcut, ShortcutEffect};
pub use config::{get_config_path, Settings};
pub use db::{create_backend, BackendType, DatabaseStats, PersistencePort};
pub use error::{DashboardError, DashboardResult};
pub use export::{build_report, write_csv, write_document, Report, ReportKind};
pub use history::{Clipboard, History};
pub use ids::{next_date_tag, next_identifier, Clock, FixedClock, SystemClock, TagFormat};
pub use models::{
    Company, CompanyUpdate, Item, ItemRef, ItemUpdate, ListedItem, NewCompany, NewItem,
};
pub use selection::Selection;
pub use storage::Storage;
pub use store::{Dashboard, StoreOptions};
