pub mod application;
pub mod skill;
