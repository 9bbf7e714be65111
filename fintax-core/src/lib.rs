pub mod calculations;
pub mod db;
pub mod models;

pub use db::repository::{IncomeRepository, RepositoryError};
pub use models::*;
