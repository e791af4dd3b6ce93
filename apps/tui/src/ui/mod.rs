// Rendering for the dashboard and its popups

pub mod screens;
pub mod widgets;

use crate::app::App;
use ratatui::Frame;

pub fn ui(app: &App, f: &mut Frame<'_>) {
    screens::dashboard::render_dashboard(app, f);
    let area = f.area();

    if app.picker.is_some() {
        screens::picker::render_picker_popup(app, f, area);
    }

    if app.show_help {
        screens::help::render_help_popup(f, area);
    }
}
