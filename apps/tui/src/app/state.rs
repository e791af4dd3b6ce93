use chrono::{DateTime, Local};
use co2_dashboard::api::{HealthStatus, StatsClient};
use co2_dashboard::config::AppConfig;
use co2_dashboard::dashboard::{spawn_refresh, Dashboard, FetchOutcome, ResourceKind};
use co2_dashboard::{FilterField, FilterOptions, FilterState};
use color_eyre::Result;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use crate::ui::widgets::tables::scroll_offset;
use co2_dashboard::normalize::NormalizedSeries;
use std::cell::Cell;
use std::sync::Arc;
use std::time::{Duration, Instant};
use throbber_widgets_tui::ThrobberState;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

const THROBBER_INTERVAL: Duration = Duration::from_millis(120);
/// Table height assumed until the first table has been drawn.
const DEFAULT_TABLE_ROWS: usize = 10;

/// Results of the one-off loads that run beside the first refresh.
#[derive(Debug)]
pub enum StartupUpdate {
    Options(FilterOptions),
    Health(Option<HealthStatus>),
}

/// Number of [`StartupUpdate`]s one [`App::start`] produces.
const STARTUP_LOADS: usize = 2;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AppScreen {
    Dashboard,
    FilterPicker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartTab {
    TimeSeries,
    TopEmitters,
    Categories,
    Regions,
    RegionCategory,
}

impl ChartTab {
    pub const ALL: [Self; 5] = [
        Self::TimeSeries,
        Self::TopEmitters,
        Self::Categories,
        Self::Regions,
        Self::RegionCategory,
    ];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::TimeSeries),
            1 => Some(Self::TopEmitters),
            2 => Some(Self::Categories),
            3 => Some(Self::Regions),
            4 => Some(Self::RegionCategory),
            _ => None,
        }
    }

    pub const fn resource(self) -> ResourceKind {
        match self {
            Self::TimeSeries => ResourceKind::TimeSeries,
            Self::TopEmitters => ResourceKind::TopEmitters,
            Self::Categories => ResourceKind::Categories,
            Self::Regions => ResourceKind::Regions,
            Self::RegionCategory => ResourceKind::RegionCategory,
        }
    }

    pub const fn label(self) -> &'static str {
        self.resource().label()
    }
}

/// Selector popup for one filter field.
#[derive(Debug, Clone)]
pub struct PickerState {
    pub field: FilterField,
    pub query: String,
    pub selected: usize,
}

impl PickerState {
    pub const fn new(field: FilterField) -> Self {
        Self {
            field,
            query: String::new(),
            selected: 0,
        }
    }

    /// Choices narrowed by the typed query, best fuzzy match first.
    pub fn filtered(&self, choices: Vec<String>) -> Vec<String> {
        let pattern = self.query.trim();
        if pattern.is_empty() {
            return choices;
        }

        let matcher = SkimMatcherV2::default().ignore_case();
        let mut scored: Vec<(i64, String)> = choices
            .into_iter()
            .filter_map(|choice| {
                matcher
                    .fuzzy_match(&choice, pattern)
                    .map(|score| (score, choice))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, choice)| choice).collect()
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn push_char(&mut self, ch: char) {
        self.query.push(ch);
        self.selected = 0;
    }

    pub fn pop_char(&mut self) {
        self.query.pop();
        self.selected = 0;
    }
}

#[derive(Debug)]
pub struct App {
    pub running: bool,
    pub config: AppConfig,
    pub client: Arc<StatsClient>,
    pub dashboard: Dashboard,
    pub screen: AppScreen,
    pub picker: Option<PickerState>,
    pub chart_tab_index: usize,
    pub table_offset: usize,
    /// Rows the last drawn table could show; written during render.
    pub table_rows: Cell<usize>,
    pub show_help: bool,
    pub status_message: String,
    pub health: Option<HealthStatus>,
    pub last_refreshed: Option<DateTime<Local>>,
    pub throbber_state: ThrobberState,
    pub last_tick: Instant,
    pending_startup: usize,
    outcome_tx: UnboundedSender<FetchOutcome>,
    outcome_rx: UnboundedReceiver<FetchOutcome>,
    startup_tx: UnboundedSender<StartupUpdate>,
    startup_rx: UnboundedReceiver<StartupUpdate>,
}

impl App {
    pub fn new(config: AppConfig, filters: FilterState) -> Result<Self> {
        let client = Arc::new(StatsClient::from_config(&config)?);
        let mut dashboard = Dashboard::new(config.shape_schema());
        dashboard.replace_filters(filters);
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let (startup_tx, startup_rx) = mpsc::unbounded_channel();

        Ok(Self {
            running: true,
            config,
            client,
            dashboard,
            screen: AppScreen::Dashboard,
            picker: None,
            chart_tab_index: 0,
            table_offset: 0,
            table_rows: Cell::new(DEFAULT_TABLE_ROWS),
            show_help: false,
            status_message: String::new(),
            health: None,
            last_refreshed: None,
            throbber_state: ThrobberState::default(),
            last_tick: Instant::now(),
            pending_startup: 0,
            outcome_tx,
            outcome_rx,
            startup_tx,
            startup_rx,
        })
    }

    /// Issues the first refresh, then loads filter options and health in
    /// the background. Returns without waiting on the network.
    pub fn start(&mut self) {
        self.refresh();

        self.pending_startup = STARTUP_LOADS;
        let client = Arc::clone(&self.client);
        let tx = self.startup_tx.clone();
        tokio::spawn(async move {
            let options = client.available_options().await;
            let _ = tx.send(StartupUpdate::Options(options));
        });

        let client = Arc::clone(&self.client);
        let tx = self.startup_tx.clone();
        tokio::spawn(async move {
            let health = match client.health().await {
                Ok(health) => Some(health),
                Err(e) => {
                    tracing::warn!(error = %e, "health check failed");
                    None
                }
            };
            let _ = tx.send(StartupUpdate::Health(health));
        });
    }

    fn apply_startup(&mut self, update: StartupUpdate) {
        self.pending_startup = self.pending_startup.saturating_sub(1);
        match update {
            StartupUpdate::Options(options) => {
                tracing::info!(
                    years = options.years.len(),
                    regions = options.regions.len(),
                    categories = options.categories.len(),
                    "filter options loaded"
                );
                self.dashboard.set_options(options);
            }
            StartupUpdate::Health(health) => self.health = health,
        }
    }

    /// True until both background loads of [`App::start`] have reported.
    pub const fn startup_pending(&self) -> bool {
        self.pending_startup > 0
    }

    /// Waits for the background loads issued by [`App::start`].
    pub async fn wait_for_startup(&mut self) {
        while self.startup_pending() {
            let Some(update) = self.startup_rx.recv().await else {
                break;
            };
            self.apply_startup(update);
        }
    }

    /// Re-fetches every resource for the current filter.
    pub fn refresh(&mut self) {
        let requests = self.dashboard.begin_refresh();
        spawn_refresh(
            &self.client,
            requests,
            &self.config.top_emitters,
            &self.outcome_tx,
        );
        self.status_message = format!("Loading {}...", self.dashboard.filters().describe());
    }

    /// Applies whatever results have arrived. Returns how many were current.
    pub fn drain_outcomes(&mut self) -> usize {
        while let Ok(update) = self.startup_rx.try_recv() {
            self.apply_startup(update);
        }

        let mut applied = 0;
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            if self.dashboard.apply(outcome) {
                applied += 1;
            }
        }

        if applied > 0 && !self.dashboard.is_loading() {
            self.finish_refresh();
        }
        applied
    }

    /// Waits until every resource of the latest refresh has settled.
    pub async fn wait_for_refresh(&mut self) {
        while self.dashboard.is_loading() {
            let Some(outcome) = self.outcome_rx.recv().await else {
                break;
            };
            self.dashboard.apply(outcome);
        }
        self.finish_refresh();
    }

    fn finish_refresh(&mut self) {
        self.last_refreshed = Some(Local::now());
        self.status_message = if self.dashboard.service_unreachable() {
            format!("Error: cannot reach {}", self.client.base_url())
        } else if self.dashboard.connection_failed() {
            format!("Error: {} answered with an error", self.client.base_url())
        } else {
            format!("Showing {}", self.dashboard.filters().describe())
        };
    }

    pub fn update(&mut self) {
        if self.last_tick.elapsed() >= THROBBER_INTERVAL {
            self.throbber_state.calc_next();
            self.last_tick = Instant::now();
        }
    }

    pub fn chart_tab(&self) -> ChartTab {
        ChartTab::from_index(self.chart_tab_index).unwrap_or(ChartTab::TimeSeries)
    }

    pub fn next_tab(&mut self) {
        self.chart_tab_index = (self.chart_tab_index + 1) % ChartTab::ALL.len();
        self.table_offset = 0;
    }

    pub fn prev_tab(&mut self) {
        self.chart_tab_index =
            (self.chart_tab_index + ChartTab::ALL.len() - 1) % ChartTab::ALL.len();
        self.table_offset = 0;
    }

    fn table_len(&self) -> usize {
        self.dashboard
            .series(self.chart_tab().resource())
            .map_or(0, NormalizedSeries::len)
    }

    /// Scrolls the table tab down, stopping once the last row is visible.
    pub fn scroll_table_down(&mut self, rows: usize) {
        self.table_offset = scroll_offset(
            self.table_len(),
            self.table_rows.get(),
            self.table_offset.saturating_add(rows),
        );
    }

    pub fn scroll_table_up(&mut self, rows: usize) {
        let current = scroll_offset(self.table_len(), self.table_rows.get(), self.table_offset);
        self.table_offset = current.saturating_sub(rows);
    }

    pub fn open_picker(&mut self, field: FilterField) {
        let mut picker = PickerState::new(field);
        let current = self.dashboard.filters().get(field).to_string();
        picker.selected = self
            .dashboard
            .options()
            .choices(field)
            .iter()
            .position(|choice| *choice == current)
            .unwrap_or(0);
        self.picker = Some(picker);
        self.screen = AppScreen::FilterPicker;
    }

    pub fn close_picker(&mut self) {
        self.picker = None;
        self.screen = AppScreen::Dashboard;
    }

    /// Choices currently visible in the picker.
    pub fn picker_choices(&self) -> Vec<String> {
        self.picker.as_ref().map_or_else(Vec::new, |picker| {
            picker.filtered(self.dashboard.options().choices(picker.field))
        })
    }

    /// Applies the highlighted choice; refetches only on a real change.
    pub fn apply_picker_selection(&mut self) {
        let choices = self.picker_choices();
        let Some(picker) = self.picker.take() else {
            return;
        };
        self.screen = AppScreen::Dashboard;

        let Some(value) = choices.get(picker.selected) else {
            self.status_message = format!("No {} matches '{}'", picker.field.as_str(), picker.query);
            return;
        };

        if self.dashboard.set_filter(picker.field, value.as_str()) {
            self.table_offset = 0;
            self.refresh();
        }
    }

    pub fn reset_filters(&mut self) {
        if self.dashboard.reset_filters() {
            self.table_offset = 0;
            self.refresh();
        } else {
            self.status_message = "Filters already cleared".to_string();
        }
    }
}
