pub mod daemon;
pub mod health;
pub mod import;
pub mod init;
pub mod token_numbers;
pub mod tokens;
pub mod version;

pub use daemon::Daemon;
pub use health::Health;
pub use import::Import;
pub use init::Init;
pub use token_numbers::TokenNumbers;
pub use tokens::Tokens;
pub use version::Version;
