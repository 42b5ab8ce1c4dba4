pub mod analysis;
pub mod api;
pub mod models;
pub mod screener;
pub mod universe;
