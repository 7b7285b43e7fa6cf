//! # plancraft-store
//!
//! Relational persistence for the planning backend, on a single SQLite
//! connection guarded by a mutex. Entity CRUD lives in one module per
//! aggregate; [`TaskRepository`] is the narrow seam the chat agent's tools use.

pub mod db;
pub mod models;
pub mod planning;
pub mod projects;
pub mod tasks;
pub mod uml;
pub mod users;

pub use db::Store;
pub use models::*;
pub use tasks::TaskRepository;
