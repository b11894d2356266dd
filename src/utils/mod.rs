pub mod adapters;
pub mod command;
pub mod file;
pub mod pairing;
pub mod report;
pub mod streams;
pub mod system;
