// Models module - Database entity representations

pub mod blackout;
pub mod magic_link;
pub mod shift;
pub mod signup;
pub mod user;

#[cfg(test)]
pub(crate) mod fixtures;
