pub mod model;
pub mod reveal;
