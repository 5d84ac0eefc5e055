pub mod document;
pub mod error;
pub mod history;
pub mod horizon;
pub mod path;
