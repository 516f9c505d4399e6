// Team domain module
// Contains the team aggregate, memberships, value objects, domain events
// and the membership service that orchestrates them

#![allow(clippy::module_inception)]

pub mod commands;
pub mod errors;
pub mod events;
pub mod membership;
pub mod service;
pub mod team;
pub mod value_objects;

// Re-export main types for convenience
pub use commands::{CreateTeam, InviteMember, UpdateMember, UpdateTeam};
pub use errors::{ErrorClass, TeamError, TeamResult};
pub use events::TeamEvent;
pub use membership::Membership;
pub use service::{MembershipPolicy, MembershipService, TeamDetails};
pub use team::Team;
pub use value_objects::{MembershipStatus, TeamName, TeamRole};
