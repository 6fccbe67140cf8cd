// Domain rules shared by handlers and models

pub mod availability;
pub mod email_address;
pub mod grouping;
pub mod pagination;
pub mod time_format;
