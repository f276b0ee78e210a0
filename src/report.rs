pub mod digest;
pub mod summary;
