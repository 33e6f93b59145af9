pub mod event;
pub mod request;
