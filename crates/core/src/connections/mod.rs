//! Connections module - domain models, services, and traits.

mod connections_model;
mod connections_service;
mod connections_traits;

// Re-export the public interface
pub use connections_model::{Connection, ConnectionStatus, NewConnection};
pub use connections_service::ConnectionService;
pub use connections_traits::{ConnectionRepositoryTrait, ConnectionServiceTrait};
