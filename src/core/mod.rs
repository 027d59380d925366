pub mod access;
pub mod errors;
pub mod models;
pub mod principal;
pub mod services;
pub mod share;
pub mod split;
