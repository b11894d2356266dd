pub mod args;

use clap::Parser;

pub use args::{Arguments, Phred};

pub fn parse() -> Arguments {
    Arguments::parse()
}
