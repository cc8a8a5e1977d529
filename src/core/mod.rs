pub mod config;
pub mod dates;
pub mod error;
pub mod model;
pub mod sink;
pub mod table;
pub mod unl;
