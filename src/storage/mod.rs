// src/storage/mod.rs
pub mod walrus_client;
