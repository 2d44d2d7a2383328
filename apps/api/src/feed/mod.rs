pub mod department;
pub mod handlers;
pub mod visibility;
