// Infrastructure layer module
// Contains database adapters and process-wide setup
// Follows Hexagonal Architecture

pub mod logging;
pub mod repositories;
