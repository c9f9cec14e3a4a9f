pub mod jpeg;
pub mod orientation;
pub mod size_resolver;
