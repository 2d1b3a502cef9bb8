//! Listings-table discovery and row extraction.
//!
//! This is the only module that knows the page's shape: the header
//! heuristic used to find the table and the positional column contract
//! (0 = company link, 2 = price, 3 = day change, 4 = YTD change). Both are
//! brittle against upstream markup changes; keep every such assumption here
//! so a page redesign never ripples past this file.

use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::form_urlencoded;

use super::normalize::{parse_percent, to_number};
use super::ScrapeError;
use crate::domain::models::{is_watched, EquityQuote};

/// Minimum header cells for a candidate listings table.
const MIN_HEADER_CELLS: usize = 5;

const PRICE_COLUMN: usize = 2;
const DAY_CHANGE_COLUMN: usize = 3;
const YTD_CHANGE_COLUMN: usize = 4;

/// Parse the raw page markup into watchlist quotes.
///
/// Rows whose ticker is not on the watchlist are skipped without
/// diagnostics; rows whose price cell does not parse are dropped with a
/// warning.
pub fn parse_quotes(markup: &str) -> Result<Vec<EquityQuote>, ScrapeError> {
    let document = Html::parse_document(markup);
    let table = locate_listings_table(&document).ok_or(ScrapeError::TableNotFound)?;

    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("td").unwrap();

    let mut quotes = Vec::new();

    // First row is the header that matched the heuristic.
    for row in table.select(&row_selector).skip(1) {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        if cells.len() <= YTD_CHANGE_COLUMN {
            continue;
        }

        let code = match company_code(&cells[0]) {
            Some(code) => code,
            None => continue,
        };
        if !is_watched(&code) {
            continue;
        }

        let price = match to_number(&cell_text(&cells[PRICE_COLUMN])) {
            Some(price) => price,
            None => {
                warn!("Dropping {}: price cell did not parse", code);
                continue;
            }
        };

        quotes.push(EquityQuote {
            code,
            price,
            day_change: parse_percent(&cell_text(&cells[DAY_CHANGE_COLUMN])),
            ytd_change: parse_percent(&cell_text(&cells[YTD_CHANGE_COLUMN])),
        });
    }

    Ok(quotes)
}

/// Find the listings table: first table whose first row has at least five
/// cells, one mentioning "company" and one mentioning "price".
fn locate_listings_table(document: &Html) -> Option<ElementRef<'_>> {
    let table_selector = Selector::parse("table").unwrap();
    let row_selector = Selector::parse("tr").unwrap();

    document.select(&table_selector).find(|table| {
        table
            .select(&row_selector)
            .next()
            .is_some_and(|first_row| is_listings_header(&first_row))
    })
}

fn is_listings_header(row: &ElementRef) -> bool {
    let cell_selector = Selector::parse("th, td").unwrap();
    let headers: Vec<String> = row
        .select(&cell_selector)
        .map(|cell| cell_text(&cell).to_lowercase())
        .collect();

    headers.len() >= MIN_HEADER_CELLS
        && headers.iter().any(|h| h.contains("company"))
        && headers.iter().any(|h| h.contains("price"))
}

/// Extract the ticker code from the company cell's anchor: the `code` query
/// parameter (key matched case-insensitively), upper-cased.
fn company_code(cell: &ElementRef) -> Option<String> {
    let anchor_selector = Selector::parse("a").unwrap();
    let href = cell
        .select(&anchor_selector)
        .next()
        .and_then(|a| a.value().attr("href"))?;

    let (_, query) = href.split_once('?')?;
    let query = query.split('#').next().unwrap_or(query);

    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key.eq_ignore_ascii_case("code"))
        .map(|(_, value)| value.trim().to_uppercase())
        .filter(|code| !code.is_empty())
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}
