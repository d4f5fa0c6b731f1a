//! Column selection and sort specifications
//!
//! `--exclude` takes a comma separated list of column names
//! (`"[ID, Owner]"`); `--sort` takes a mode (`asc`) or, for task views, a
//! list of `column[:mode]` pairs (`"[title:dsc,created:asc,status]"`).
//! Column names match case-insensitively, ignoring spaces, hyphens and
//! underscores, so `last-modified` names the "Last Modified" column.

use anyhow::{bail, Result};

use crate::cli::output::Column;

/// Characters trimmed around column lists and names
const IGNORED_COLUMN_CHARS: &[char] = &[' ', '[', '{', '}', ']'];

pub const NO_SORT: &str = "none";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    Asc,
    Dsc,
    AscNumeric,
    DscNumeric,
}

impl SortMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Asc => "asc",
            SortMode::Dsc => "dsc",
            SortMode::AscNumeric => "asc-numeric",
            SortMode::DscNumeric => "dsc-numeric",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortMode::Asc),
            "dsc" => Some(SortMode::Dsc),
            "asc-numeric" => Some(SortMode::AscNumeric),
            "dsc-numeric" => Some(SortMode::DscNumeric),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, SortMode::AscNumeric | SortMode::DscNumeric)
    }

    pub fn is_descending(&self) -> bool {
        matches!(self, SortMode::Dsc | SortMode::DscNumeric)
    }
}

/// Sort options for a single-column listing
pub fn sort_options() -> String {
    format!("[{}, {}, {}]", SortMode::Asc.as_str(), SortMode::Dsc.as_str(), NO_SORT)
}

/// Parse `asc`, `dsc` or `none` (no sorting)
pub fn parse_sort_mode(flag: &str) -> Result<Option<SortMode>> {
    match flag.trim() {
        NO_SORT => Ok(None),
        "asc" => Ok(Some(SortMode::Asc)),
        "dsc" => Ok(Some(SortMode::Dsc)),
        _ => bail!("invalid sort option '{}' - valid options: {}", flag, sort_options()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortBy {
    pub column: &'static str,
    pub mode: SortMode,
}

/// Lowercase and drop separators so "Due Date", "due-date" and "duedate" agree
fn normalize_column_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn find_column(columns: &[Column], name: &str) -> Option<Column> {
    let wanted = normalize_column_name(name);
    columns
        .iter()
        .find(|c| normalize_column_name(c.name) == wanted)
        .copied()
}

/// Parse `"[title:dsc,created:asc,status]"`; a column without a mode sorts ascending
pub fn parse_sort_columns(spec: &str, columns: &[Column]) -> Result<Vec<SortBy>> {
    let spec = spec.trim_matches(IGNORED_COLUMN_CHARS);
    if spec.is_empty() || spec == NO_SORT {
        return Ok(Vec::new());
    }

    let mut keys = Vec::new();
    for item in spec.split(',') {
        let item = item.trim_matches(IGNORED_COLUMN_CHARS);
        if item.is_empty() {
            continue;
        }

        let (name, mode) = match item.split_once(':') {
            Some((name, mode)) => {
                let mode = mode.trim();
                let parsed = SortMode::from_str(mode).ok_or_else(|| {
                    anyhow::anyhow!(
                        "invalid sort mode '{}' for column '{}' - valid modes: [asc, dsc, asc-numeric, dsc-numeric]",
                        mode,
                        name.trim()
                    )
                })?;
                (name.trim(), parsed)
            }
            None => (item, SortMode::Asc),
        };

        let column = match find_column(columns, name) {
            Some(column) => column,
            None => bail!("column '{}' is not a valid column to sort by", name),
        };
        keys.push(SortBy { column: column.name, mode });
    }

    Ok(keys)
}

/// Columns left after removing the comma separated `exclude` list
pub fn allowed_columns(exclude: &str, columns: &[Column]) -> Result<Vec<Column>> {
    let exclude = exclude.trim_matches(IGNORED_COLUMN_CHARS);
    if exclude.is_empty() {
        return Ok(columns.to_vec());
    }

    let mut excluded = Vec::new();
    for name in exclude.split(',') {
        let name = name.trim_matches(IGNORED_COLUMN_CHARS);
        if name.is_empty() {
            continue;
        }
        match find_column(columns, name) {
            Some(column) => excluded.push(column.name),
            None => bail!("column '{}' is not a valid column to exclude", name),
        }
    }

    Ok(columns
        .iter()
        .filter(|c| !excluded.contains(&c.name))
        .copied()
        .collect())
}
