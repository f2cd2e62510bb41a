use std::fmt;

/// One row of the films table, as extracted from the page.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MovieRecord {
    pub title: String,
    pub release_date: String,
    pub source_url: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColumnKind {
    Title,
    ReleaseDate,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Title => f.write_str("title"),
            ColumnKind::ReleaseDate => f.write_str("release date"),
        }
    }
}

/// Outcome of one batch upsert. `inserted + updated == processed`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LoadSummary {
    pub processed: usize,
    pub inserted: usize,
    pub updated: usize,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RunReport {
    pub extracted: usize,
    pub load: LoadSummary,
}
