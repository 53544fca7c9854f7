use std::path::Path;
use std::sync::Arc;

use crate::config::{DashboardConfig, Variant};
use crate::data::export;
use crate::data::filter::{self, FilterState};
use crate::data::model::Dataset;
use crate::view::{self, DashboardView, ViewOptions};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// Selections are the only mutable inputs; `view` is always the output of
/// [`view::render`] for the current selections.
pub struct AppState {
    /// Loaded once at startup, shared read-only.
    pub dataset: Arc<Dataset>,

    /// Topic + sidebar selections.
    pub filters: FilterState,

    /// Layout, bin count, row limits, stats toggle.
    pub options: ViewOptions,

    /// Selector choices, computed from the full dataset.
    pub topic_options: Vec<String>,
    pub year_options: Vec<i64>,
    pub location_options: Vec<String>,

    /// Current view model.
    pub view: DashboardView,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Initialise selections with the sidebar defaults and render once.
    pub fn new(dataset: Arc<Dataset>, config: &DashboardConfig) -> Self {
        let filters = filter::default_filter_state(
            &dataset,
            config.default_recent_years,
            &config.default_location,
        );
        let options = ViewOptions::from(config);
        let view = view::render(&dataset, &filters, &options);

        Self {
            topic_options: filter::topic_options(&dataset),
            year_options: filter::year_options(&dataset),
            location_options: filter::location_options(&dataset),
            dataset,
            filters,
            options,
            view,
            status_message: None,
        }
    }

    /// Recompute the view after a selection change.
    pub fn refresh(&mut self) {
        self.view = view::render(&self.dataset, &self.filters, &self.options);
    }

    pub fn set_topic(&mut self, topic: &str) {
        if self.filters.topic.as_deref() == Some(topic) {
            return;
        }
        log::debug!("Topic selected: {topic}");
        self.filters.topic = Some(topic.to_string());
        self.refresh();
    }

    pub fn set_variant(&mut self, variant: Variant) {
        if self.options.variant != variant {
            self.options.variant = variant;
            self.refresh();
        }
    }

    pub fn set_show_stats(&mut self, show: bool) {
        if self.options.show_stats != show {
            self.options.show_stats = show;
            self.refresh();
        }
    }

    /// Toggle a single year in the sidebar filter.
    pub fn toggle_year(&mut self, year: i64) {
        if !self.filters.years.remove(&year) {
            self.filters.years.insert(year);
        }
        self.refresh();
    }

    /// Toggle a single location in the sidebar filter.
    pub fn toggle_location(&mut self, location: &str) {
        if !self.filters.locations.remove(location) {
            self.filters.locations.insert(location.to_string());
        }
        self.refresh();
    }

    /// Empty selection, which means every year passes.
    pub fn clear_years(&mut self) {
        self.filters.years.clear();
        self.refresh();
    }

    pub fn clear_locations(&mut self) {
        self.filters.locations.clear();
        self.refresh();
    }

    /// File name offered by the export dialog.
    pub fn export_file_name(&self) -> String {
        export::export_file_name(self.filters.active_topic())
    }

    /// Write the rows behind the current view to `path`.
    pub fn export_to(&mut self, path: &Path) {
        let subset = view::working_subset(&self.dataset, &self.filters, self.options.variant);
        match export::save_csv(&subset, path) {
            Ok(()) => {
                self.status_message = Some(format!(
                    "Exported {} rows to {}",
                    subset.len(),
                    path.display()
                ));
            }
            Err(e) => {
                log::error!("Export failed: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
