//! Cards module - domain models, services, and traits.

mod cards_model;
mod cards_service;
mod cards_traits;


// Re-export the public interface
pub use cards_model::{Card, CardSyncUpdate, NewCard};
pub use cards_service::CardService;
pub use cards_traits::{CardRepositoryTrait, CardServiceTrait};
