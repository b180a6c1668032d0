//! Incident table extractor.
//!
//! Locates the incident `<table>` on the dispatch page and maps each data
//! row to an [`Incident`]. Data rows are recognised by their alternating
//! row classes rather than by position, so header and footer rows are
//! skipped naturally.
//!
//! Columns are positional:
//!
//! | index | field      |
//! |-------|------------|
//! | 1     | timestamp  |
//! | 2     | category   |
//! | 3     | type       |
//! | 4     | address    |
//! | 5     | dispatch unit (ignored) |
//! | 6     | status     |

use fire_map_incident_models::Incident;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;

use crate::ScrapeError;

/// Minimum number of `<td>` cells a data row must have.
pub const MIN_CELLS: usize = 7;

const TIMESTAMP_COL: usize = 1;
const CATEGORY_COL: usize = 2;
const TYPE_COL: usize = 3;
const ADDRESS_COL: usize = 4;
const STATUS_COL: usize = 6;

/// Describes where the incident rows live in the page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableLayout {
    /// CSS selector for the incident table.
    #[serde(default = "default_table_selector")]
    pub table_selector: String,
    /// Classes that mark a `<tr>` as a data row.
    #[serde(default = "default_row_classes")]
    pub row_classes: Vec<String>,
}

fn default_table_selector() -> String {
    "table.tablelist".to_owned()
}

fn default_row_classes() -> Vec<String> {
    vec!["table_tr1".to_owned(), "table_tr2".to_owned()]
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            table_selector: default_table_selector(),
            row_classes: default_row_classes(),
        }
    }
}

/// Extracts incidents from dispatch page markup.
#[derive(Debug, Clone)]
pub struct IncidentTableExtractor {
    table: Selector,
    rows: Selector,
    cells: Selector,
}

impl IncidentTableExtractor {
    /// Compiles the selectors for the given layout.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Parse`] if a selector is invalid or no row
    /// classes are configured.
    pub fn new(layout: &TableLayout) -> Result<Self, ScrapeError> {
        if layout.row_classes.is_empty() {
            return Err(ScrapeError::Parse("no row classes configured".to_owned()));
        }

        let row_selector = layout
            .row_classes
            .iter()
            .map(|class| format!("tr.{class}"))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Self {
            table: parse_selector(&layout.table_selector)?,
            rows: parse_selector(&row_selector)?,
            cells: parse_selector("td")?,
        })
    }

    /// Parses `html` and returns the incidents found in the table, in page
    /// order.
    ///
    /// A page without the table yields no incidents. Rows with fewer than
    /// [`MIN_CELLS`] cells are skipped.
    #[must_use]
    pub fn extract(&self, html: &str) -> Vec<Incident> {
        let document = Html::parse_document(html);

        let Some(table) = document.select(&self.table).next() else {
            log::warn!("Incident table not found in document");
            return Vec::new();
        };

        let mut incidents = Vec::new();

        for row in table.select(&self.rows) {
            let cells: Vec<String> = row.select(&self.cells).map(cell_text).collect();

            if cells.len() < MIN_CELLS {
                log::debug!("Skipping row with {} cells", cells.len());
                continue;
            }

            incidents.push(Incident::new(
                cells[TIMESTAMP_COL].clone(),
                cells[CATEGORY_COL].clone(),
                cells[TYPE_COL].clone(),
                cells[ADDRESS_COL].clone(),
                cells[STATUS_COL].clone(),
            ));
        }

        incidents
    }
}

/// Trims a string and removes every embedded newline and tab.
#[must_use]
pub fn clean_text(text: &str) -> String {
    text.trim().replace(['\n', '\t'], "")
}

fn cell_text(cell: ElementRef<'_>) -> String {
    clean_text(&cell.text().collect::<String>())
}

/// Parses a CSS selector string, returning a [`ScrapeError`] on failure.
fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector)
        .map_err(|e| ScrapeError::Parse(format!("invalid CSS selector '{selector}': {e}")))
}
