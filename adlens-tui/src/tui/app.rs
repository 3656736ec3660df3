use crate::tui::theme::Theme;
use adlens_common::{AdLensError, Config};
use adlens_core::export::export_csv;
use adlens_core::{
    apply, load_source, sort_rows, AdCreative, BuilderPhase, ConditionId, FilterBuilder, FilterSet, Result,
    COLUMNS,
};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};

/// Load `source` on the tokio runtime; the result arrives on the returned channel.
pub fn spawn_load(source: String) -> Receiver<Result<Vec<AdCreative>>> {
    let (tx, rx) = std::sync::mpsc::channel();
    tokio::spawn(async move {
        let result = load_source(&source).await;
        deliver_load(&tx, &source, result);
    });
    rx
}

// false when the UI side already hung up
fn deliver_load(tx: &Sender<Result<Vec<AdCreative>>>, source: &str, result: Result<Vec<AdCreative>>) -> bool {
    match tx.send(result) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(source, ok = e.0.is_ok(), "load finished after the view closed");
            false
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Table,
    Help,
}

pub struct App {
    pub source: String,
    pub records: Vec<AdCreative>,
    pub loading: bool,
    pub load_rx: Option<Receiver<Result<Vec<AdCreative>>>>, // one-shot result of the async load
    pub filters: FilterSet,
    pub builder: FilterBuilder,
    pub visible: Vec<usize>, // indices into `records` after filtering and sorting
    pub view: View,
    pub popover_open: bool,
    pub option_selected: usize,
    pub active_selected: usize,
    pub sort_col: Option<usize>,
    pub sort_asc: bool,
    pub selected_row: usize,
    pub page_size: usize,
    pub status_msg: String,
    pub theme: Theme,
    pub should_quit: bool,
}

impl App {
    pub fn new(source: String, config: &Config) -> Self {
        let theme = Theme::from_name(&config.display.theme);
        let page_size = config.display.page_size.max(1);
        Self {
            source,
            records: Vec::new(),
            loading: false,
            load_rx: None,
            filters: FilterSet::new(),
            builder: FilterBuilder::new(),
            visible: Vec::new(),
            view: View::Table,
            popover_open: false,
            option_selected: 0,
            active_selected: 0,
            sort_col: None,
            sort_asc: true,
            selected_row: 0,
            page_size,
            status_msg: String::new(),
            theme,
            should_quit: false,
        }
    }

    // --- loading ---

    pub fn begin_load(&mut self, rx: Receiver<Result<Vec<AdCreative>>>) {
        self.load_rx = Some(rx);
        self.loading = true;
        self.status_msg = format!("Loading {}…", self.source);
    }

    /// Drain the load channel; called once per UI tick.
    pub fn poll_load(&mut self) {
        let Some(rx) = &self.load_rx else { return };
        match rx.try_recv() {
            Ok(Ok(records)) => self.on_loaded(records),
            Ok(Err(e)) => self.on_load_failed(&e),
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                self.on_load_failed(&AdLensError::Other("loader stopped without a result".into()))
            }
        }
        self.load_rx = None;
    }

    pub fn on_loaded(&mut self, records: Vec<AdCreative>) {
        tracing::info!(source = %self.source, rows = records.len(), "report loaded");
        self.records = records;
        self.loading = false;
        self.recompute();
        self.status_msg = format!("Loaded {} rows | f:filters ?:help q:quit", self.records.len());
    }

    pub fn on_load_failed(&mut self, err: &AdLensError) {
        tracing::error!(source = %self.source, error = %err, "failed to load report");
        self.records.clear();
        self.visible.clear();
        self.loading = false;
        self.status_msg = format!("Load failed: {err}");
    }

    // --- filtering ---

    /// Re-run the evaluator over all records and re-apply the current sort.
    pub fn recompute(&mut self) {
        self.visible = apply(&self.records, &self.filters).rows;
        self.resort();
    }

    fn resort(&mut self) {
        if let Some(c) = self.sort_col {
            sort_rows(&self.records, &mut self.visible, &COLUMNS[c], self.sort_asc);
        }
        self.selected_row = self.selected_row.min(self.visible.len().saturating_sub(1));
    }

    pub fn open_popover(&mut self) {
        self.popover_open = true;
        self.active_selected = self.active_selected.min(self.filters.len().saturating_sub(1));
    }

    pub fn close_popover(&mut self) {
        self.builder.cancel();
        self.popover_open = false;
    }

    pub fn start_new_filter(&mut self) {
        self.builder.open();
        self.option_selected = 0;
    }

    pub fn commit_filter(&mut self) -> Option<ConditionId> {
        let (records, visible) = (&self.records, &mut self.visible);
        let id = self
            .builder
            .apply(&mut self.filters, |set| *visible = apply(records, set).rows)?;
        self.resort();
        self.active_selected = self.filters.len().saturating_sub(1);
        self.status_msg = format!("{} of {} rows match", self.visible.len(), self.records.len());
        Some(id)
    }

    pub fn remove_selected_filter(&mut self) -> bool {
        let Some(id) = self.filters.conditions().get(self.active_selected).map(|c| c.id) else {
            return false;
        };
        let (records, visible) = (&self.records, &mut self.visible);
        let removed = FilterBuilder::remove(&mut self.filters, id, |set| *visible = apply(records, set).rows);
        self.resort();
        self.active_selected = self.active_selected.min(self.filters.len().saturating_sub(1));
        removed
    }

    pub fn toggle_conjunction(&mut self) {
        self.filters.toggle_conjunction();
        self.recompute();
        self.status_msg = format!("Conditions joined with {}", self.filters.conjunction());
    }

    pub fn option_down(&mut self) {
        let n = self.builder.visible_options().len();
        if n > 0 {
            self.option_selected = (self.option_selected + 1).min(n - 1);
        }
    }

    pub fn option_up(&mut self) {
        self.option_selected = self.option_selected.saturating_sub(1);
    }

    pub fn pick_highlighted_option(&mut self) -> bool {
        let options = self.builder.visible_options();
        match options.get(self.option_selected) {
            Some(label) => self.builder.select_option(label),
            None => false,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.popover_open && self.builder.phase() != BuilderPhase::Idle
    }

    // --- table navigation ---

    pub fn row_down(&mut self) {
        if self.selected_row + 1 < self.visible.len() {
            self.selected_row += 1;
        }
    }

    pub fn row_up(&mut self) {
        self.selected_row = self.selected_row.saturating_sub(1);
    }

    pub fn page_down(&mut self) {
        let last = self.visible.len().saturating_sub(1);
        self.selected_row = (self.selected_row + self.page_size).min(last);
    }

    pub fn page_up(&mut self) {
        self.selected_row = self.selected_row.saturating_sub(self.page_size);
    }

    pub fn page(&self) -> usize {
        self.selected_row / self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.visible.len().div_ceil(self.page_size).max(1)
    }

    /// Cycle the sort column; wraps back to unsorted source order.
    pub fn cycle_sort(&mut self, forward: bool) {
        let n = COLUMNS.len();
        self.sort_col = match (self.sort_col, forward) {
            (None, true) => Some(0),
            (None, false) => Some(n - 1),
            (Some(c), true) if c + 1 < n => Some(c + 1),
            (Some(c), false) if c > 0 => Some(c - 1),
            _ => None,
        };
        self.recompute();
    }

    pub fn toggle_sort_dir(&mut self) {
        self.sort_asc = !self.sort_asc;
        self.recompute();
    }

    pub fn export_visible(&mut self) {
        let out_path = PathBuf::from("adlens_export.csv");
        match export_csv(&out_path, &self.records, &self.visible) {
            Ok(()) => {
                tracing::info!(path = %out_path.display(), rows = self.visible.len(), "exported");
                self.status_msg = format!("Exported {} rows to {}", self.visible.len(), out_path.display());
            }
            Err(e) => {
                tracing::warn!(error = %e, "export failed");
                self.status_msg = format!("Export failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adlens_core::Operator;

    fn rec(id: &str, country: &str, spend: f64) -> AdCreative {
        AdCreative { creative_id: id.into(), country: country.into(), spend, ..Default::default() }
    }

    fn loaded() -> App {
        let mut app = App::new("test.csv".into(), &Config::default());
        app.on_loaded(vec![rec("A", "US", 100.0), rec("B", "IN", 50.0), rec("C", "US", 200.0)]);
        app
    }

    fn ids(app: &App) -> Vec<&str> {
        app.visible.iter().map(|&i| app.records[i].creative_id.as_str()).collect()
    }

    #[test]
    fn load_channel_delivers_records() {
        let mut app = App::new("x".into(), &Config::default());
        let (tx, rx) = std::sync::mpsc::channel();
        app.begin_load(rx);
        assert!(app.loading);
        tx.send(Ok(vec![rec("A", "US", 1.0)])).unwrap();
        app.poll_load();
        assert!(!app.loading);
        assert_eq!(app.visible, vec![0]);
        assert!(app.load_rx.is_none());
    }

    #[test]
    fn load_result_after_view_closed_is_dropped() {
        let (tx, rx) = std::sync::mpsc::channel();
        drop(rx);
        assert!(!deliver_load(&tx, "x.csv", Ok(vec![rec("A", "US", 1.0)])));
    }

    #[test]
    fn spawned_load_reports_missing_file() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let rx = rt.block_on(async { spawn_load("/nonexistent/adlens/report.csv".into()) });
        let mut app = App::new("missing".into(), &Config::default());
        app.begin_load(rx);
        let result = app.load_rx.as_ref().unwrap().recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        assert!(result.is_err());
        drop(rt);
    }

    #[test]
    fn failed_load_leaves_empty_view() {
        let mut app = loaded();
        let (tx, rx) = std::sync::mpsc::channel();
        app.begin_load(rx);
        tx.send(Err(AdLensError::Other("boom".into()))).unwrap();
        app.poll_load();
        assert!(!app.loading);
        assert!(app.records.is_empty() && app.visible.is_empty());
        assert!(app.status_msg.contains("boom"));
    }

    #[test]
    fn commit_and_remove_update_visible_rows() {
        let mut app = loaded();
        app.open_popover();
        app.start_new_filter();
        assert!(app.builder.select_option("Country"));
        assert!(app.builder.set_operator(Operator::Is));
        app.builder.set_value("US");
        assert!(app.commit_filter().is_some());
        assert_eq!(ids(&app), ["A", "C"]);
        assert!(app.remove_selected_filter());
        assert_eq!(ids(&app), ["A", "B", "C"]);
    }

    #[test]
    fn sorting_survives_recompute() {
        let mut app = loaded();
        app.sort_col = COLUMNS.iter().position(|c| c.title == "Spend");
        app.sort_asc = false;
        app.recompute();
        assert_eq!(ids(&app), ["C", "A", "B"]);
    }

    #[test]
    fn cycle_sort_wraps_to_unsorted() {
        let mut app = loaded();
        app.cycle_sort(false);
        assert_eq!(app.sort_col, Some(COLUMNS.len() - 1));
        app.cycle_sort(true);
        assert_eq!(app.sort_col, None);
        app.cycle_sort(true);
        assert_eq!(app.sort_col, Some(0));
    }

    #[test]
    fn page_count_rounds_up() {
        let mut app = loaded();
        app.page_size = 2;
        assert_eq!(app.page_count(), 2);
        app.page_down();
        assert_eq!(app.page(), 1);
    }
}
