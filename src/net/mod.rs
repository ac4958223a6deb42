//! Wire protocol and link session boundary

pub mod link;
pub mod protocol;
