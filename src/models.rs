pub mod auth;
pub mod consumption;
pub mod product;
pub mod report;
pub mod sector;
pub mod stock;
pub mod user;
