pub mod connection;
pub mod failure_state_repository;
pub mod warehouse_repository;

pub use connection::establish_connection;
pub use failure_state_repository::FailureStateRepository;
pub use warehouse_repository::WarehouseRepository;

pub type DbPool = sqlx::SqlitePool;
