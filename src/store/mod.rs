//! Persistence layer — libSQL-backed storage for users, the program
//! catalog, personality profiles, the conversation log and schedules.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::Database;
