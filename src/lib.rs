pub mod config;
pub mod error;
pub mod event;
pub mod gateway;
pub mod lock;
pub mod storage;
pub mod utils;

pub use gateway::StorageGateway;
