//! Kubernetes integration module for the guestbook
//!
//! This module handles all interactions with the cluster:
//! - Building Deployments, Services and ConfigMaps
//! - The service-deployment composite and its address policy
//! - Applying and deleting objects through the `Orchestrator` seam
//! - Watching services until their address is assigned

pub mod address;
mod client;
pub mod composite;
mod orchestrator;
pub mod resources;
mod watcher;

pub use address::{
    resolve_load_balancer, AddressHandle, AddressPolicy, AddressState, ADDRESS_PENDING,
};
pub use client::{K8sClient, FIELD_MANAGER};
pub use composite::ServiceDeployment;
pub use orchestrator::Orchestrator;
pub use watcher::watch_address;
