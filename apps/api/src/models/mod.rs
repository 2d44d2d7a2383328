pub mod actor;
pub mod application;
pub mod chat;
pub mod decision;
pub mod post;
