pub mod auth;
pub mod date;
pub mod hash;
pub mod path;
