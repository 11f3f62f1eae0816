mod browse;
mod forms;
mod patients;
mod render;
mod root;
mod visits;

pub use root::Cli;
