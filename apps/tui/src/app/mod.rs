// App module for co2-dashboard
// Owns the filter selection, the fetch channel and the key handling

pub mod input;
pub mod state;

pub use input::handle_input;
pub use state::{App, AppScreen, ChartTab};
