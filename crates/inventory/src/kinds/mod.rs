//! Per-kind `InventoryResource` implementations.
//!
//! - `service`: Services (cluster IPs and node ports are carried over on update)
//! - `deployment`: Deployments (autoscaled replica counts are carried over)
//! - `config_map`: ConfigMaps

mod config_map;
mod deployment;
mod service;
