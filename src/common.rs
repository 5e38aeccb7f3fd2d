pub mod dates;
pub mod error;
pub mod spreadsheet;
pub mod storage;
