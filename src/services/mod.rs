// src/services/mod.rs
pub mod api_server;
pub mod credential_issuer;
