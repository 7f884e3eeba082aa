//! Unity Doc Audit Library
//!
//! This library finds public types and members of the Unity engine's managed
//! assemblies that have no page in the locally installed Script Reference.

pub mod api;
pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod unity_install;
pub mod unity_project_manager;
#[cfg(test)]
pub mod test_utils;
