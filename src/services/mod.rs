pub mod expiry;
pub mod storage;
pub mod transform;
pub mod upload_log;
pub mod worker;
