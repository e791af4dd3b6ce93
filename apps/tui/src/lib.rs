// Library half of the dashboard: everything between the filter selection and
// chart-ready data. The binary adds the terminal front end on top.
pub mod api;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod normalize;

pub use domain::{FilterField, FilterOptions, FilterState, ALL};
