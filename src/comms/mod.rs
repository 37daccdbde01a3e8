pub mod command;
pub mod sim;
