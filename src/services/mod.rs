// Services module - Business logic

pub mod email;
pub mod shift_signup;
pub mod token;
