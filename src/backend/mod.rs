//! Backend node role (§4.3, §4.4).

mod actor;
mod handle;
mod state;

pub mod server;

pub use actor::BackendActor;
pub use handle::BackendHandle;
pub use state::UserState;
