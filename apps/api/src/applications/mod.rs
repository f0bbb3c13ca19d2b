pub mod handlers;
pub mod skills;
pub mod store;
