pub mod entities;
pub mod map;
pub mod migrations;
