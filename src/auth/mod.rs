// Authentication helpers
// Token issuing lives with the identity provider; this service only verifies

pub mod jwt;
