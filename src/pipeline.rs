pub mod daily;
pub mod digest;
pub mod summary;
