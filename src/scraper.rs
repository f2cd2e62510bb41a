use tracing::{debug, info};

use crate::{
    error::{AppError, AppResult},
    models::{ColumnKind, MovieRecord},
    table::{self, HtmlTable},
};

pub const TABLE_MARKER: &str = "Title";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MissingColumn(pub ColumnKind);

impl From<MissingColumn> for AppError {
    fn from(missing: MissingColumn) -> Self {
        AppError::MissingColumn(missing.0)
    }
}

pub async fn extract(client: &reqwest::Client, url: &str) -> AppResult<Vec<MovieRecord>> {
    info!(url = %url, "scraping films table");
    let html = fetch_page(client, url).await?;
    let movies = parse_movies(&html, url)?;
    info!(movies = movies.len(), "found movies");
    Ok(movies)
}

pub async fn fetch_page(client: &reqwest::Client, url: &str) -> AppResult<String> {
    let body: reqwest::Result<String> =
        async { client.get(url).send().await?.error_for_status()?.text().await }.await;

    let html = body.map_err(|source| AppError::Fetch { url: url.to_string(), source })?;
    debug!(url = %url, bytes = html.len(), "fetched page");
    Ok(html)
}

// First table mentioning "Title" wins, even if a later one fits better.
pub fn parse_movies(html: &str, source_url: &str) -> AppResult<Vec<MovieRecord>> {
    let tables = table::parse_tables(html);
    debug!(tables = tables.len(), "parsed tables");

    let table = select_table(&tables).ok_or(AppError::NoMatchingTable)?;
    let title_col = find_column(&table.headers, ColumnKind::Title)?;
    let release_col = find_column(&table.headers, ColumnKind::ReleaseDate)?;

    debug!(
        title_header = %table.headers[title_col],
        release_header = %table.headers[release_col],
        rows = table.rows.len(),
        "resolved columns"
    );

    let movies = table
        .rows
        .iter()
        .filter_map(|row| {
            let title = clean(row.get(title_col)?.as_deref())?;
            let release_date = clean(row.get(release_col)?.as_deref())?;
            Some(MovieRecord { title, release_date, source_url: source_url.to_string() })
        })
        .collect();

    Ok(movies)
}

fn select_table(tables: &[HtmlTable]) -> Option<&HtmlTable> {
    tables.iter().find(|t| t.text.contains(TABLE_MARKER))
}

pub fn find_column(headers: &[String], kind: ColumnKind) -> Result<usize, MissingColumn> {
    let position = match kind {
        ColumnKind::Title => headers
            .iter()
            .position(|h| h.contains("English title"))
            .or_else(|| headers.iter().position(|h| h.contains("Title"))),
        ColumnKind::ReleaseDate => {
            headers.iter().position(|h| h.to_lowercase().contains("release"))
        },
    };
    position.ok_or(MissingColumn(kind))
}

fn clean(cell: Option<&str>) -> Option<String> {
    let value = table::strip_footnote_markers(cell?.trim());
    if value.is_empty() { None } else { Some(value.to_string()) }
}
