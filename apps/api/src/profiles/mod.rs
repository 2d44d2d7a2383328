pub mod cards;
pub mod experience;
pub mod handlers;
