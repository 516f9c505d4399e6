// Repository interfaces (ports)
// Implemented by the adapters in infrastructure::repositories

pub mod errors;
pub mod membership_repository;
pub mod team_repository;
pub mod team_store;

pub use errors::{StoreError, StoreResult};
pub use membership_repository::{MembershipRepository, MembershipWithTeam};
pub use team_repository::TeamRepository;
pub use team_store::TeamStore;
