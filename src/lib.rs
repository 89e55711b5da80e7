pub mod core;
pub mod figured_bass;
pub mod file;
