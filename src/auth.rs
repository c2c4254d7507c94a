//! Token secrets, snapshots, and the token state machine.

mod data;
mod response;
mod secret;
mod state;

pub use data::*;
pub use response::*;
pub use secret::*;
pub use state::*;
