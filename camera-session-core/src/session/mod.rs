pub mod controller;
pub mod dispatch;
mod transition;
