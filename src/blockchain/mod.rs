// src/blockchain/mod.rs
pub mod sui_client;
pub mod transaction;
pub mod types;
