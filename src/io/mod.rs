pub mod compression;
pub mod storage;
