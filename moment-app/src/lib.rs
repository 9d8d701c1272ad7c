pub mod feed;
pub mod reminder;
