/// Division document stores (MongoDB, CouchDB and in-memory).
pub mod roster_store;
/// Storage abstraction layer shared by every backend.
pub mod storage;
