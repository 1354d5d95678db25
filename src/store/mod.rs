pub mod catalog;
pub mod mapper;
pub mod postgres;
pub mod traits;

pub use catalog::{CatalogEntry, Page, SearchTerm};
pub use postgres::*;
pub use traits::*;
