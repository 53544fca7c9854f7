/// Rendering of the view model with egui. No data logic lives here.
pub mod charts;
pub mod panels;
pub mod table;
