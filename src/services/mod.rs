pub mod payload;
pub mod reply;
pub mod scheduling;
pub mod signature;
pub mod timing;
