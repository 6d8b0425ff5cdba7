pub mod actor;
pub mod coordinate;
pub mod event;
pub mod request;
