use crate::app::state::{App, AppScreen};
use co2_dashboard::FilterField;
use crossterm::event::KeyCode;

/// Rows skipped per PageUp/PageDown in table tabs.
const PAGE_ROWS: usize = 10;

pub fn handle_input(app: &mut App, key: KeyCode) {
    if handle_help_toggle(app, key) {
        return;
    }

    match app.screen {
        AppScreen::FilterPicker => handle_picker_input(app, key),
        AppScreen::Dashboard => handle_dashboard_input(app, key),
    }
}

fn handle_help_toggle(app: &mut App, key: KeyCode) -> bool {
    let toggles = key == KeyCode::F(1) || (key == KeyCode::Char('?') && app.picker.is_none());
    if toggles {
        app.show_help = !app.show_help;
        return true;
    }

    if app.show_help {
        if key == KeyCode::Esc {
            app.show_help = false;
        }
        return true;
    }

    false
}

fn handle_dashboard_input(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Char('q') => {
            app.running = false;
        }
        KeyCode::Char('y') => app.open_picker(FilterField::Year),
        KeyCode::Char('r') => app.open_picker(FilterField::Region),
        KeyCode::Char('c') => app.open_picker(FilterField::Category),
        KeyCode::Char('x') => app.reset_filters(),
        KeyCode::F(5) | KeyCode::Char('R') => app.refresh(),
        KeyCode::Left => app.prev_tab(),
        KeyCode::Right | KeyCode::Tab => app.next_tab(),
        KeyCode::Char(digit @ '1'..='5') => {
            app.chart_tab_index = (digit as usize) - ('1' as usize);
            app.table_offset = 0;
        }
        KeyCode::Up => app.scroll_table_up(1),
        KeyCode::Down => app.scroll_table_down(1),
        KeyCode::PageUp => app.scroll_table_up(PAGE_ROWS),
        KeyCode::PageDown => app.scroll_table_down(PAGE_ROWS),
        KeyCode::Home => {
            app.table_offset = 0;
        }
        _ => {}
    }
}

fn handle_picker_input(app: &mut App, key: KeyCode) {
    let visible = app.picker_choices().len();
    let Some(picker) = app.picker.as_mut() else {
        app.screen = AppScreen::Dashboard;
        return;
    };

    match key {
        KeyCode::Esc => app.close_picker(),
        KeyCode::Enter => app.apply_picker_selection(),
        KeyCode::Up => picker.move_up(),
        KeyCode::Down => picker.move_down(visible),
        KeyCode::Backspace => picker.pop_char(),
        KeyCode::Char(ch) => picker.push_char(ch),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use co2_dashboard::config::AppConfig;
    use co2_dashboard::FilterState;

    fn app() -> App {
        let config = AppConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            ..AppConfig::default()
        };
        App::new(config, FilterState::default()).unwrap()
    }

    #[test]
    fn help_toggles_and_swallows_keys() {
        let mut app = app();
        handle_input(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);

        handle_input(&mut app, KeyCode::Char('q'));
        assert!(app.running);

        handle_input(&mut app, KeyCode::Esc);
        assert!(!app.show_help);
    }

    #[test]
    fn picker_keys_edit_query() {
        let mut app = app();
        handle_input(&mut app, KeyCode::Char('r'));
        assert_eq!(app.screen, AppScreen::FilterPicker);

        handle_input(&mut app, KeyCode::Char('q'));
        handle_input(&mut app, KeyCode::Char('?'));
        assert!(app.running);
        assert!(!app.show_help);
        assert_eq!(app.picker.as_ref().map(|p| p.query.as_str()), Some("q?"));

        handle_input(&mut app, KeyCode::Esc);
        assert_eq!(app.screen, AppScreen::Dashboard);
        assert!(app.picker.is_none());
    }

    #[test]
    fn digits_select_tabs() {
        let mut app = app();
        handle_input(&mut app, KeyCode::Char('4'));
        assert_eq!(app.chart_tab_index, 3);
        handle_input(&mut app, KeyCode::Down);
        handle_input(&mut app, KeyCode::Home);
        assert_eq!(app.table_offset, 0);
    }

    #[test]
    fn q_quits_from_dashboard() {
        let mut app = app();
        handle_input(&mut app, KeyCode::Char('q'));
        assert!(!app.running);
    }
}
