pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;

pub use catalog::{CatalogSource, StaticCatalog};
pub use domain::conversation::{recent_window, Message, Role};
pub use domain::product::Product;
pub use errors::{ApplicationError, DomainError, InterfaceError};
