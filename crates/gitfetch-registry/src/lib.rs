//! The set of local repositories gitfetch keeps in sync.
//!
//! A small JSON document holding the worker count and an ordered list of
//! repository paths. It is read once before a run and written back by the
//! front end afterwards; workers never touch it.

pub mod error;
pub mod location;
pub mod registry;

pub use error::{RegistryError, RegistryResult};
pub use location::{RegistryLocation, APP_NAME};
pub use registry::{Registry, RegistryDocument};
