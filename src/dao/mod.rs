/// Catalog resource loading.
pub mod catalog;
/// Key-value storage backends.
pub mod kv_store;
/// Serialized entity definitions.
pub mod models;
/// Puzzle persistence adapter built on a key-value store.
pub mod puzzle_store;
/// Storage error types shared by backends.
pub mod storage;
