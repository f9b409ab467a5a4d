//! External API integrations

pub mod google_sheets;

pub use google_sheets::GoogleSheetsClient;
