pub mod page_store;
pub mod persistence;
