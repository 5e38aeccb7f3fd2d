pub mod auth;
pub mod consumptions;
pub mod products;
pub mod reports;
pub mod sectors;
pub mod stock_transactions;
pub mod users;
