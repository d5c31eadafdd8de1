//! Project structure: files, descriptors, configuration and activation.
//!
//! Nothing here knows about name resolution. This module decides which
//! files exist, what they contain and which of them are live.

mod activation;
mod config;
mod descriptor;
mod error;
pub mod file_loader;
#[cfg(feature = "persistence")]
mod persist;
mod scheduler;
mod vfs;

pub use activation::{ActiveFile, Closure, ClosureInput, compute_closure};
pub use config::WorkspaceConfig;
pub use descriptor::{DescriptorSource, FlatProject, MemoryDescriptors, ProjectDescriptor, flatten};
pub use error::ProjectError;
#[cfg(feature = "persistence")]
pub use persist::{IndexSnapshot, SnapshotFile};
pub use scheduler::ActivationScheduler;
pub use vfs::Vfs;
