pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Daemon, Health, Import, Init, TokenNumbers, Tokens, Version};
