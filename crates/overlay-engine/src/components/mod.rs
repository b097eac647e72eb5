pub mod entity;
pub mod graphic;
