pub mod entities;
pub mod groups;
pub mod roster;
pub mod term;
pub mod votes;
