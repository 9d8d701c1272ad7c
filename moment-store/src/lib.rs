pub mod client;
pub mod image;
pub mod query;
pub mod record;
pub mod session;
