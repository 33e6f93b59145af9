pub mod base;
pub mod configs;
pub mod converse;
pub mod mock;
