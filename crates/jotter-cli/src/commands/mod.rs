pub mod add;
pub mod capture;
pub mod common;
pub mod delete;
pub mod env;
pub mod list;
pub mod pin;
pub mod recover;
