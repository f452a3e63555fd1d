//! Account entry lifecycle
//!
//! An [`AccountEntry`] describes one configured owners account: credentials,
//! validated scan interval and lifecycle state. The [`AccountManager`] takes
//! an entry through setup (authenticate, list vehicles, mandatory first
//! refresh per vehicle), hands back an [`AccountHandle`] carrying the shared
//! session and the running coordinators, and takes the handle back at unload
//! or reload. Consumers receive everything through the handle; there is no
//! shared global table of coordinators.

mod entry;
mod manager;
mod state_machine;

pub use entry::{AccountEntry, EntryState, SetupFailure, SetupFailureKind};
pub use manager::{AccountHandle, AccountManager, SetupError};
pub use state_machine::InvalidTransition;
