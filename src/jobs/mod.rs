// Jobs module - Scheduled background work

pub mod cleanup;
