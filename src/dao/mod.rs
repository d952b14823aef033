/// Key-value backends holding stored values.
pub mod kv_store;
/// Save document layout and parsing.
pub mod models;
/// Unified save document access and migration.
pub mod save_repository;
/// Storage abstraction layer errors.
pub mod storage;
