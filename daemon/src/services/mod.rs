pub mod library;
pub mod stream;
