//! Reading and writing attribute tables

mod json;

pub use json::{read_rat, read_rat_from_buffer, write_rat, write_rat_to_buffer, RatWriteOptions};
