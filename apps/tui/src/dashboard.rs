//! Filter-driven refetch of every dashboard resource.
//!
//! Each resource owns a small `Idle -> Loading -> Ready | Error` machine keyed
//! by the filter snapshot that started it. Results are applied only when they
//! still belong to the current key and generation, so a slow response for an
//! old selection can never replace data fetched for the newer one.

use crate::api::{ApiError, StatsClient, TopEmittersParams};
use crate::domain::{FilterField, FilterOptions, FilterState};
use crate::normalize::{summarize_general, GeneralSummary, NormalizedSeries, ShapeSchema};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    General,
    Regions,
    TimeSeries,
    TopEmitters,
    Categories,
    RegionCategory,
}

impl ResourceKind {
    pub const ALL: [Self; 6] = [
        Self::General,
        Self::Regions,
        Self::TimeSeries,
        Self::TopEmitters,
        Self::Categories,
        Self::RegionCategory,
    ];

    const fn index(self) -> usize {
        match self {
            Self::General => 0,
            Self::Regions => 1,
            Self::TimeSeries => 2,
            Self::TopEmitters => 3,
            Self::Categories => 4,
            Self::RegionCategory => 5,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Regions => "regions",
            Self::TimeSeries => "time_series",
            Self::TopEmitters => "top_emitters",
            Self::Categories => "categories",
            Self::RegionCategory => "region_category",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Regions => "Regions",
            Self::TimeSeries => "Time Series",
            Self::TopEmitters => "Top Emitters",
            Self::Categories => "Categories",
            Self::RegionCategory => "Region x Category",
        }
    }

    /// Label field used when a payload carries none of the known aliases.
    pub const fn default_name_key(self) -> &'static str {
        match self {
            Self::TimeSeries => "year",
            Self::Regions => "REGION",
            Self::Categories => "CATEGORIA",
            Self::General | Self::TopEmitters | Self::RegionCategory => "name",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalized payload of one resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceData {
    Summary(GeneralSummary),
    Series(NormalizedSeries),
}

impl ResourceData {
    pub const fn as_summary(&self) -> Option<&GeneralSummary> {
        match self {
            Self::Summary(summary) => Some(summary),
            Self::Series(_) => None,
        }
    }

    pub const fn as_series(&self) -> Option<&NormalizedSeries> {
        match self {
            Self::Series(series) => Some(series),
            Self::Summary(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready(ResourceData),
    Error(String),
}

impl LoadState {
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub const fn data(&self) -> Option<&ResourceData> {
        match self {
            Self::Ready(data) => Some(data),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct ResourceSlot {
    key: Option<FilterState>,
    generation: u64,
    state: LoadState,
}

impl ResourceSlot {
    const fn new() -> Self {
        Self {
            key: None,
            generation: 0,
            state: LoadState::Idle,
        }
    }
}

/// One request issued by [`Dashboard::begin_refresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub kind: ResourceKind,
    pub key: FilterState,
    pub generation: u64,
}

/// Result of a [`FetchRequest`], routed back to [`Dashboard::apply`].
#[derive(Debug)]
pub struct FetchOutcome {
    pub kind: ResourceKind,
    pub key: FilterState,
    pub generation: u64,
    pub result: Result<Value, ApiError>,
}

/// Single source of truth for the current filter and every resource's state.
#[derive(Debug, Clone)]
pub struct Dashboard {
    filters: FilterState,
    options: FilterOptions,
    schema: ShapeSchema,
    slots: [ResourceSlot; 6],
    next_generation: u64,
    unreachable: bool,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(ShapeSchema::default())
    }
}

impl Dashboard {
    pub fn new(schema: ShapeSchema) -> Self {
        Self {
            filters: FilterState::default(),
            options: FilterOptions::default(),
            schema,
            slots: std::array::from_fn(|_| ResourceSlot::new()),
            next_generation: 0,
            unreachable: false,
        }
    }

    pub const fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub const fn options(&self) -> &FilterOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: FilterOptions) {
        self.options = options;
    }

    /// Returns true when the filter value actually changed.
    pub fn set_filter(&mut self, field: FilterField, value: impl Into<String>) -> bool {
        let mut next = self.filters.clone();
        next.set(field, value);
        self.replace_filters(next)
    }

    pub fn reset_filters(&mut self) -> bool {
        self.replace_filters(FilterState::default())
    }

    /// Swaps the whole filter value; partial updates go through `set_filter`.
    pub fn replace_filters(&mut self, filters: FilterState) -> bool {
        if self.filters == filters {
            return false;
        }
        tracing::debug!(filters = %filters.describe(), "filters changed");
        self.filters = filters;
        true
    }

    pub fn state(&self, kind: ResourceKind) -> &LoadState {
        &self.slots[kind.index()].state
    }

    /// Filter snapshot the resource's current state belongs to.
    pub fn key(&self, kind: ResourceKind) -> Option<&FilterState> {
        self.slots[kind.index()].key.as_ref()
    }

    pub fn summary(&self) -> Option<&GeneralSummary> {
        self.state(ResourceKind::General)
            .data()
            .and_then(ResourceData::as_summary)
    }

    pub fn series(&self, kind: ResourceKind) -> Option<&NormalizedSeries> {
        self.state(kind).data().and_then(ResourceData::as_series)
    }

    pub fn is_loading(&self) -> bool {
        self.slots.iter().any(|slot| slot.state.is_loading())
    }

    /// General stats are authoritative for connectivity.
    pub fn connection_failed(&self) -> bool {
        matches!(self.state(ResourceKind::General), LoadState::Error(_))
    }

    /// General stats failed because nothing answered, as opposed to the
    /// service answering with an error.
    pub fn service_unreachable(&self) -> bool {
        self.connection_failed() && self.unreachable
    }

    /// Moves every resource to `Loading` for the current filter.
    pub fn begin_refresh(&mut self) -> Vec<FetchRequest> {
        self.next_generation += 1;
        self.unreachable = false;
        let generation = self.next_generation;

        ResourceKind::ALL
            .iter()
            .map(|kind| {
                let slot = &mut self.slots[kind.index()];
                slot.key = Some(self.filters.clone());
                slot.generation = generation;
                slot.state = LoadState::Loading;

                FetchRequest {
                    kind: *kind,
                    key: self.filters.clone(),
                    generation,
                }
            })
            .collect()
    }

    /// Applies a fetch result. Returns false when the outcome was stale.
    pub fn apply(&mut self, outcome: FetchOutcome) -> bool {
        let slot = &mut self.slots[outcome.kind.index()];
        let current = slot.generation == outcome.generation
            && slot.key.as_ref() == Some(&outcome.key)
            && outcome.key == self.filters;

        if !current {
            tracing::debug!(
                resource = outcome.kind.as_str(),
                generation = outcome.generation,
                "discarding stale result"
            );
            return false;
        }

        slot.state = match outcome.result {
            Ok(payload) => {
                let data = match outcome.kind {
                    ResourceKind::General => ResourceData::Summary(summarize_general(&payload)),
                    kind => ResourceData::Series(
                        self.schema.normalize(&payload, kind.default_name_key()),
                    ),
                };
                LoadState::Ready(data)
            }
            Err(err) => {
                tracing::warn!(resource = outcome.kind.as_str(), error = %err, "fetch failed");
                if outcome.kind == ResourceKind::General {
                    self.unreachable = err.is_connection();
                }
                LoadState::Error(err.to_string())
            }
        };

        true
    }
}

/// Runs one request against the service.
pub async fn execute(
    client: &StatsClient,
    request: FetchRequest,
    top_emitters: &TopEmittersParams,
) -> FetchOutcome {
    let filters = Some(&request.key);
    let result = match request.kind {
        ResourceKind::General => client.general_stats(filters).await,
        ResourceKind::Regions => client.region_stats(filters).await,
        ResourceKind::TimeSeries => client.time_series(filters).await,
        ResourceKind::TopEmitters => client.top_emitters(filters, top_emitters).await,
        ResourceKind::Categories => client.category_stats(filters).await,
        ResourceKind::RegionCategory => client.region_category_stats(filters).await,
    };

    FetchOutcome {
        kind: request.kind,
        key: request.key,
        generation: request.generation,
        result,
    }
}

/// Issues every request concurrently; outcomes arrive on `tx` in completion order.
pub fn spawn_refresh(
    client: &Arc<StatsClient>,
    requests: Vec<FetchRequest>,
    top_emitters: &TopEmittersParams,
    tx: &UnboundedSender<FetchOutcome>,
) {
    for request in requests {
        let client = Arc::clone(client);
        let top_emitters = top_emitters.clone();
        let tx = tx.clone();

        tokio::spawn(async move {
            let outcome = execute(&client, request, &top_emitters).await;
            // Receiver gone means the dashboard shut down.
            let _ = tx.send(outcome);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn outcome(request: &FetchRequest, result: Result<Value, ApiError>) -> FetchOutcome {
        FetchOutcome {
            kind: request.kind,
            key: request.key.clone(),
            generation: request.generation,
            result,
        }
    }

    fn request_for(requests: &[FetchRequest], kind: ResourceKind) -> FetchRequest {
        requests
            .iter()
            .find(|request| request.kind == kind)
            .cloned()
            .unwrap()
    }

    fn decode_error() -> ApiError {
        ApiError::Decode {
            url: "/stats/general".to_string(),
            source: serde_json::from_str::<Value>("{").unwrap_err(),
        }
    }

    #[test]
    fn slots_start_idle() {
        let dashboard = Dashboard::default();
        for kind in ResourceKind::ALL {
            assert_eq!(dashboard.state(kind), &LoadState::Idle);
            assert!(dashboard.key(kind).is_none());
        }
        assert!(!dashboard.is_loading());
    }

    #[test]
    fn refresh_marks_every_resource_loading() {
        let mut dashboard = Dashboard::default();
        dashboard.set_filter(FilterField::Year, "2020");
        let requests = dashboard.begin_refresh();

        assert_eq!(requests.len(), ResourceKind::ALL.len());
        for kind in ResourceKind::ALL {
            assert!(dashboard.state(kind).is_loading());
            assert_eq!(dashboard.key(kind), Some(dashboard.filters()));
        }
    }

    #[test]
    fn ready_result_is_normalized() {
        let mut dashboard = Dashboard::default();
        let requests = dashboard.begin_refresh();
        let request = request_for(&requests, ResourceKind::TimeSeries);

        let applied = dashboard.apply(outcome(
            &request,
            Ok(json!({"time_series": [{"ANO": 2020, "mean": 3.5}]})),
        ));

        assert!(applied);
        let series = dashboard.series(ResourceKind::TimeSeries).unwrap();
        assert_eq!(series.name_key, "ANO");
        assert_eq!(series.value_key, "mean");
        assert_eq!(series.points(), vec![("2020".to_string(), 3.5)]);
    }

    #[test]
    fn general_result_becomes_summary() {
        let mut dashboard = Dashboard::default();
        let requests = dashboard.begin_refresh();
        let request = request_for(&requests, ResourceKind::General);

        dashboard.apply(outcome(
            &request,
            Ok(json!({"total_records": 10, "co2_stats": {"mean": 2.0}})),
        ));

        let summary = dashboard.summary().unwrap();
        assert_eq!(summary.count, Some(10.0));
        assert_eq!(summary.average, Some(2.0));
    }

    #[test]
    fn general_failure_is_a_connection_failure() {
        let mut dashboard = Dashboard::default();
        let requests = dashboard.begin_refresh();
        let general = request_for(&requests, ResourceKind::General);
        let regions = request_for(&requests, ResourceKind::Regions);

        dashboard.apply(outcome(&regions, Err(decode_error())));
        assert!(!dashboard.connection_failed());

        dashboard.apply(outcome(&general, Err(decode_error())));
        assert!(dashboard.connection_failed());
        // The service answered, just not with usable data.
        assert!(!dashboard.service_unreachable());
        assert!(matches!(
            dashboard.state(ResourceKind::Regions),
            LoadState::Error(_)
        ));
    }

    #[test]
    fn stale_filter_result_never_overwrites_newer_data() {
        let mut dashboard = Dashboard::default();

        dashboard.set_filter(FilterField::Year, "2020");
        let old = request_for(&dashboard.begin_refresh(), ResourceKind::TimeSeries);

        dashboard.set_filter(FilterField::Year, "2021");
        let new = request_for(&dashboard.begin_refresh(), ResourceKind::TimeSeries);

        assert!(dashboard.apply(outcome(&new, Ok(json!([{"year": 2021, "value": 21}])))));
        assert!(!dashboard.apply(outcome(&old, Ok(json!([{"year": 2020, "value": 20}])))));

        let series = dashboard.series(ResourceKind::TimeSeries).unwrap();
        assert_eq!(series.points(), vec![("2021".to_string(), 21.0)]);
        assert_eq!(
            dashboard.key(ResourceKind::TimeSeries).map(|key| key.get(FilterField::Year)),
            Some("2021")
        );
    }

    #[test]
    fn stale_result_arriving_first_is_also_ignored() {
        let mut dashboard = Dashboard::default();

        dashboard.set_filter(FilterField::Year, "2020");
        let old = request_for(&dashboard.begin_refresh(), ResourceKind::Categories);
        dashboard.set_filter(FilterField::Year, "2021");
        let new = request_for(&dashboard.begin_refresh(), ResourceKind::Categories);

        assert!(!dashboard.apply(outcome(&old, Ok(json!([{"CATEGORIA": "old", "total": 1}])))));
        assert!(dashboard.state(ResourceKind::Categories).is_loading());

        assert!(dashboard.apply(outcome(&new, Ok(json!([{"CATEGORIA": "new", "total": 2}])))));
        let series = dashboard.series(ResourceKind::Categories).unwrap();
        assert_eq!(series.points(), vec![("new".to_string(), 2.0)]);
    }

    #[test]
    fn superseded_generation_with_same_filter_is_ignored() {
        let mut dashboard = Dashboard::default();
        let first = request_for(&dashboard.begin_refresh(), ResourceKind::Regions);
        let second = request_for(&dashboard.begin_refresh(), ResourceKind::Regions);

        assert_eq!(first.key, second.key);
        assert!(!dashboard.apply(outcome(&first, Ok(json!([])))));
        assert!(dashboard.apply(outcome(&second, Ok(json!([])))));
    }

    #[test]
    fn unchanged_filter_value_reports_no_change() {
        let mut dashboard = Dashboard::default();
        assert!(!dashboard.set_filter(FilterField::Region, "all"));
        assert!(dashboard.set_filter(FilterField::Region, "ANDINA"));
        assert!(!dashboard.set_filter(FilterField::Region, "ANDINA"));
        assert!(dashboard.reset_filters());
        assert!(!dashboard.reset_filters());
    }
}
