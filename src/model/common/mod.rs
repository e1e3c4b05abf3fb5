pub mod survey;
pub mod user;
