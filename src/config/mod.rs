pub mod defs;
pub mod build;
