pub mod charts;
pub mod format;
pub mod popup;
pub mod status;
pub mod tables;
