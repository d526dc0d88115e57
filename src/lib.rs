pub mod cli;
pub mod clipboard;
pub mod config;
pub mod creation;
pub mod database;
pub mod editing;
pub mod export;
pub mod logging;
pub mod models;
pub mod ordering;
pub mod repository;
pub mod summary;
pub mod ticket;
pub mod timeline;
pub mod tui;
pub mod utils;

pub use config::Config;
pub use database::Database;
pub use models::{Entry, EntryType, Icon, Task};
pub use repository::EntryRepository;
pub use utils::Profile;
