pub mod config;
pub mod device;
pub mod error;
pub mod models;
pub mod naming;
pub mod routes;
pub mod search;
pub mod state;
pub mod storage;
