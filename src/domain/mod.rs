pub mod bokashi;
pub mod error;
pub mod link;
pub mod models;
pub mod protocol;
pub mod settings;
