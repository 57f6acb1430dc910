// Re-export types from the protocol crate so they are accessible via markforge_core::*
pub use markforge_protocol::config;
pub use markforge_protocol::job;
pub use markforge_protocol::scene;

// Internal Modules
pub mod acceptance;
pub mod anneal;
pub mod api;
pub mod bridge;
pub mod configuration;
pub mod consts;
pub mod energy;
pub mod error;
pub mod kernel;
pub mod mark;
pub mod optimizer;
pub mod partition;
pub mod region;
pub mod state;
pub mod termination;
