pub mod services;
pub mod workflows;
