// Job construction and completion polling

pub mod builder;
pub mod poller;

pub use builder::*;
pub use poller::{wait_for_complete, PollSettings};
