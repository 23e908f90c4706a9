//! CLI commands module.

mod enroll;
mod users;
mod util;
mod verify;

pub use enroll::EnrollCommand;
pub use users::UsersCommand;
pub use verify::VerifyCommand;

// Re-export utils for use in commands
pub(crate) use util::*;
