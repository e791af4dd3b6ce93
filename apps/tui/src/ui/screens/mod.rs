pub mod dashboard;
pub mod help;
pub mod picker;
