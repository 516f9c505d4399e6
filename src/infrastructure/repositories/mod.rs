// Team Store implementations (data access layer)
// Adapters that implement the domain store traits

pub mod in_memory_team_store;
pub mod postgres_team_store;

pub use in_memory_team_store::{InMemoryTeamStore, StoreOp};
pub use postgres_team_store::PostgresTeamStore;
