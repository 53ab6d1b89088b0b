// POSIX filesystem provider

#[cfg(unix)]
pub mod filesystem;

#[cfg(unix)]
mod tree;

#[cfg(unix)]
pub use filesystem::UnixFileProvider;
