//! Commands Layer
//!
//! Async command handlers that bridge a UI surface to the backend.
//! Every handler returns `Result<T, String>` with a user-facing message.

mod menu_cmd;
mod drag_cmd;
mod preference_cmd;


pub use menu_cmd::*;
pub use drag_cmd::*;
pub use preference_cmd::*;
