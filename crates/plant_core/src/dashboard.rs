//! Dashboard load/refresh state machine, kept free of any UI toolkit.
//!
//! `Idle -> Loading -> {Rendered | LoadError}`; a refresh or a new source
//! moves `Rendered`/`LoadError` back to `Loading`.

use crate::error::Error;
use crate::model::{PredictionResult, RunSummary};
use crate::results::parse_results;
use crate::source::{ResultsSource, SourceError};

/// Everything the dashboard draws for one successful load.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub source: String,
    pub records: Vec<PredictionResult>,
    pub skipped: usize,
    pub summary: RunSummary,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DashboardState {
    #[default]
    Idle,
    Loading,
    Rendered(DashboardView),
    LoadError(String),
}

#[derive(Default)]
pub struct Dashboard {
    source: Option<Box<dyn ResultsSource>>,
    state: DashboardState,
}

impl Dashboard {
    pub fn new(source: Option<Box<dyn ResultsSource>>) -> Self {
        Self {
            source,
            state: DashboardState::Idle,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn source(&self) -> Option<&dyn ResultsSource> {
        self.source.as_deref()
    }

    /// Swap in a new source and load it straight away.
    pub fn set_source(&mut self, source: Box<dyn ResultsSource>) {
        self.source = Some(source);
        self.refresh();
    }

    /// Discard the current view and run fetch + parse again.
    pub fn refresh(&mut self) {
        self.begin_load();
        let fetched = match &self.source {
            Some(source) => source.fetch(),
            None => Err(SourceError::NotSelected),
        };
        self.finish_load(fetched);
    }

    /// Enter `Loading`, dropping whatever was rendered before.
    pub fn begin_load(&mut self) {
        if let Some(source) = &self.source {
            tracing::info!(source = %source.describe(), "loading results");
        }
        self.state = DashboardState::Loading;
    }

    /// Leave `Loading` with the outcome of a fetch.
    pub fn finish_load(&mut self, fetched: Result<String, SourceError>) {
        if self.state != DashboardState::Loading {
            tracing::warn!("finish_load called outside of Loading; ignoring");
            return;
        }
        let describe = self
            .source
            .as_ref()
            .map(|s| s.describe())
            .unwrap_or_default();

        self.state = match fetched
            .map_err(Error::from)
            .and_then(|text| parse_results(&text))
        {
            Ok(parsed) => {
                let summary = parsed.summary();
                tracing::info!(
                    total = summary.total,
                    passed = summary.passed,
                    skipped = parsed.skipped,
                    "results loaded"
                );
                DashboardState::Rendered(DashboardView {
                    source: describe,
                    records: parsed.records,
                    skipped: parsed.skipped,
                    summary,
                })
            }
            Err(err) => {
                tracing::warn!("results load failed: {err}");
                DashboardState::LoadError(err.to_string())
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Serves whatever text is currently in the shared cell.
    struct MemorySource {
        text: Rc<RefCell<Option<String>>>,
    }

    impl ResultsSource for MemorySource {
        fn describe(&self) -> String {
            "memory".to_string()
        }

        fn fetch(&self) -> Result<String, SourceError> {
            self.text
                .borrow()
                .clone()
                .ok_or_else(|| SourceError::Fetch("connection refused".to_string()))
        }

        fn load_image(&self, _image_path: &str) -> Result<Vec<u8>, SourceError> {
            Err(SourceError::Fetch("no images".to_string()))
        }
    }

    fn memory(text: Option<&str>) -> (Box<dyn ResultsSource>, Rc<RefCell<Option<String>>>) {
        let cell = Rc::new(RefCell::new(text.map(str::to_string)));
        (Box::new(MemorySource { text: cell.clone() }), cell)
    }

    const TABLE: &str = "test_id,expected_label,predicted_label,confidence,pass\n\
                         TC01,Fungi,Fungi,0.87,true\n\
                         TC02,Fungi,Bacteria,0.65,false\n\
                         TC03,Fungi,Fungi,lots,true\n";

    #[test]
    fn starts_idle() {
        let dashboard = Dashboard::new(None);
        assert_eq!(dashboard.state(), &DashboardState::Idle);
        assert!(dashboard.source().is_none());
    }

    #[test]
    fn load_renders_valid_rows_and_counts_skipped() {
        let (source, _) = memory(Some(TABLE));
        let mut dashboard = Dashboard::new(Some(source));
        dashboard.refresh();

        let DashboardState::Rendered(view) = dashboard.state() else {
            panic!("expected rendered state, got {:?}", dashboard.state());
        };
        assert_eq!(view.source, "memory");
        assert_eq!(view.records.len(), 2);
        assert_eq!(view.skipped, 1);
        assert_eq!(view.summary.total, 2);
        assert_eq!(view.summary.passed, 1);
    }

    #[test]
    fn begin_load_enters_loading_and_drops_previous_view() {
        let (source, _) = memory(Some(TABLE));
        let mut dashboard = Dashboard::new(Some(source));
        dashboard.refresh();
        dashboard.begin_load();
        assert_eq!(dashboard.state(), &DashboardState::Loading);
    }

    #[test]
    fn refresh_without_source_is_a_load_error() {
        let mut dashboard = Dashboard::new(None);
        dashboard.refresh();
        assert_eq!(
            dashboard.state(),
            &DashboardState::LoadError("no results source selected".to_string())
        );
    }

    #[test]
    fn fetch_failure_and_empty_table_are_load_errors() {
        let (source, cell) = memory(None);
        let mut dashboard = Dashboard::new(Some(source));
        dashboard.refresh();
        assert!(
            matches!(dashboard.state(), DashboardState::LoadError(msg) if msg.contains("refused"))
        );

        *cell.borrow_mut() = Some(String::new());
        dashboard.refresh();
        assert!(
            matches!(dashboard.state(), DashboardState::LoadError(msg) if msg.contains("empty"))
        );
    }

    #[test]
    fn refresh_picks_up_new_data() {
        let (source, cell) = memory(Some(TABLE));
        let mut dashboard = Dashboard::new(Some(source));
        dashboard.refresh();

        *cell.borrow_mut() = Some(
            "test_id,expected_label,predicted_label,confidence,pass\nTC09,Virus,Virus,0.5,true\n"
                .to_string(),
        );
        dashboard.refresh();
        let DashboardState::Rendered(view) = dashboard.state() else {
            panic!("expected rendered state");
        };
        assert_eq!(view.records.len(), 1);
        assert_eq!(view.records[0].case.test_id, "TC09");
        assert_eq!(view.skipped, 0);
    }

    #[test]
    fn error_state_recovers_on_next_successful_load() {
        let (source, cell) = memory(None);
        let mut dashboard = Dashboard::new(Some(source));
        dashboard.refresh();
        assert!(matches!(dashboard.state(), DashboardState::LoadError(_)));

        *cell.borrow_mut() = Some(TABLE.to_string());
        dashboard.refresh();
        assert!(matches!(dashboard.state(), DashboardState::Rendered(_)));
    }

    #[test]
    fn set_source_loads_immediately() {
        let mut dashboard = Dashboard::new(None);
        let (source, _) = memory(Some(TABLE));
        dashboard.set_source(source);
        assert!(matches!(dashboard.state(), DashboardState::Rendered(_)));
    }

    #[test]
    fn finish_load_outside_loading_is_ignored() {
        let mut dashboard = Dashboard::new(None);
        dashboard.finish_load(Ok(TABLE.to_string()));
        assert_eq!(dashboard.state(), &DashboardState::Idle);
    }
}
