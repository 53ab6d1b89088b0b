pub mod error;
pub mod filesystem;
pub mod mode;
pub mod options;
