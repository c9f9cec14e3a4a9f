pub mod directory_store;
pub mod metadata;
