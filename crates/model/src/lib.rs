pub mod core;
pub mod pagination;
pub mod query;
pub mod records;
