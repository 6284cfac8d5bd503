//! Flash part types and the table of supported parts

mod parts;
mod types;

pub use parts::{find_part, find_part_by_name, MAX_SECTORS, PARTS};
pub use types::*;
