pub mod auth;
pub mod firebase;
pub mod handlers;
pub mod jwt;
pub mod middleware;
