/// Round, submission and vote persistence.
pub mod game_store;
/// External movie metadata lookups.
pub mod metadata;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
