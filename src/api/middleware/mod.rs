// Request-scoped plumbing: session layer and access checks

pub mod auth;
pub mod session;
