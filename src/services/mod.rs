pub mod booking;
pub mod catalog;
pub mod category;
pub mod populate;
pub mod profile;
pub mod storage;
