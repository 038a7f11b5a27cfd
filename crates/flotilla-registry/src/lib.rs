//!
//! # Flotilla registry
//!
//! Lifecycle of member cluster registrations, kept consistent across the
//! cluster store and the host control plane.
//!
mod config;
mod error;
mod registry;
mod resource;

pub mod saga;

#[cfg(test)]
mod fixture;

pub use config::RegistryConfig;
pub use error::{ErrorKind, RegistryError};
pub use registry::ClusterRegistry;
pub use resource::ResourceInfoCache;
