pub mod database;

pub use database::{Database, DatabaseStats};
pub(crate) use database::DatabaseState;
