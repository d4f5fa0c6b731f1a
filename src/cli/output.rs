// Output formatting utilities

use std::cmp::Ordering;
use std::io::IsTerminal;

use chrono::{NaiveDateTime, TimeDelta};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::cli::columns::{SortBy, SortMode};

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";

const TRUE_MARK: &str = "✅";
const FALSE_MARK: &str = "❌";
const ABSOLUTE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
const TRUNCATION_MARK: &str = "..";
const MIN_TRUNCATED_WIDTH: usize = 8;

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate for reliable detection, with fallback to
/// COLUMNS environment variable and a sensible default.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 {
                return width;
            }
        }
    }

    120
}

fn bold_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_BOLD, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub align: Align,
}

impl Column {
    pub const fn left(name: &'static str) -> Self {
        Column { name, align: Align::Left }
    }

    pub const fn center(name: &'static str) -> Self {
        Column { name, align: Align::Center }
    }
}

/// One table cell, formatted at render time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Bool(bool),
    Time(Option<NaiveDateTime>),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    fn display(&self, options: &RenderOptions) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Bool(true) => TRUE_MARK.to_string(),
            Cell::Bool(false) => FALSE_MARK.to_string(),
            Cell::Time(None) => String::new(),
            Cell::Time(Some(time)) => match options.time_format {
                TimeFormat::Absolute => time.format(ABSOLUTE_TIME_FORMAT).to_string(),
                TimeFormat::Relative => format_relative_time(*time, options.now),
            },
        }
    }

    fn compare(&self, other: &Cell, numeric: bool) -> Ordering {
        match (self, other) {
            (Cell::Text(a), Cell::Text(b)) if numeric => compare_numeric(a, b),
            (Cell::Text(a), Cell::Text(b)) => a.cmp(b),
            (Cell::Bool(a), Cell::Bool(b)) => a.cmp(b),
            (Cell::Time(a), Cell::Time(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Numbers first in numeric order, then everything else as text
fn compare_numeric(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFormat {
    #[default]
    Relative,
    Absolute,
}

/// Border style names accepted by `table-style`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableStyle {
    #[default]
    Default,
    Light,
    Rounded,
    Bold,
    Double,
}

struct BorderChars {
    top: [&'static str; 3],
    middle: [&'static str; 3],
    bottom: [&'static str; 3],
    horizontal: &'static str,
    vertical: &'static str,
}

impl TableStyle {
    pub const ALL: [TableStyle; 5] = [
        TableStyle::Default,
        TableStyle::Light,
        TableStyle::Rounded,
        TableStyle::Bold,
        TableStyle::Double,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableStyle::Default => "Default",
            TableStyle::Light => "Light",
            TableStyle::Rounded => "Rounded",
            TableStyle::Bold => "Bold",
            TableStyle::Double => "Double",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|style| style.as_str() == s)
    }

    pub fn options() -> String {
        let names: Vec<&str> = Self::ALL.iter().map(|style| style.as_str()).collect();
        format!("[{}]", names.join(", "))
    }

    fn borders(&self) -> BorderChars {
        match self {
            TableStyle::Default => BorderChars {
                top: ["+", "+", "+"],
                middle: ["+", "+", "+"],
                bottom: ["+", "+", "+"],
                horizontal: "-",
                vertical: "|",
            },
            TableStyle::Light => BorderChars {
                top: ["┌", "┬", "┐"],
                middle: ["├", "┼", "┤"],
                bottom: ["└", "┴", "┘"],
                horizontal: "─",
                vertical: "│",
            },
            TableStyle::Rounded => BorderChars {
                top: ["╭", "┬", "╮"],
                middle: ["├", "┼", "┤"],
                bottom: ["╰", "┴", "╯"],
                horizontal: "─",
                vertical: "│",
            },
            TableStyle::Bold => BorderChars {
                top: ["┏", "┳", "┓"],
                middle: ["┣", "╋", "┫"],
                bottom: ["┗", "┻", "┛"],
                horizontal: "━",
                vertical: "┃",
            },
            TableStyle::Double => BorderChars {
                top: ["╔", "╦", "╗"],
                middle: ["╠", "╬", "╣"],
                bottom: ["╚", "╩", "╝"],
                horizontal: "═",
                vertical: "║",
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub style: TableStyle,
    pub time_format: TimeFormat,
    /// Reference time for relative times
    pub now: NaiveDateTime,
    /// Terminal width to fit into, if any
    pub max_width: Option<usize>,
    pub bold_header: bool,
}

impl RenderOptions {
    pub fn new(style: TableStyle, time_format: TimeFormat, now: NaiveDateTime) -> Self {
        RenderOptions {
            style,
            time_format,
            now,
            max_width: None,
            bold_header: false,
        }
    }

    /// Fit to the terminal and bold the header when stdout is a TTY
    pub fn for_stdout(mut self) -> Self {
        if is_tty() {
            self.max_width = Some(get_terminal_width());
            self.bold_header = true;
        }
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Table { columns, rows: Vec::new() }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row; cells line up with the table's columns
    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    /// Stable multi-key sort; keys naming absent columns are ignored
    pub fn sort_by(&mut self, keys: &[SortBy]) {
        let indexed: Vec<(usize, SortMode)> = keys
            .iter()
            .filter_map(|key| {
                self.columns
                    .iter()
                    .position(|c| c.name == key.column)
                    .map(|idx| (idx, key.mode))
            })
            .collect();
        if indexed.is_empty() {
            return;
        }

        self.rows.sort_by(|a, b| {
            for (idx, mode) in &indexed {
                let ordering = a[*idx].compare(&b[*idx], mode.is_numeric());
                let ordering = if mode.is_descending() { ordering.reverse() } else { ordering };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    /// Drop every column not in `keep`, preserving table order
    pub fn retain_columns(&mut self, keep: &[Column]) {
        let kept: Vec<usize> = (0..self.columns.len())
            .filter(|idx| keep.iter().any(|c| c.name == self.columns[*idx].name))
            .collect();

        self.columns = kept.iter().map(|idx| self.columns[*idx]).collect();
        for row in &mut self.rows {
            let mut cells: Vec<Option<Cell>> = std::mem::take(row).into_iter().map(Some).collect();
            *row = kept.iter().filter_map(|idx| cells[*idx].take()).collect();
        }
    }

    pub fn render(&self, options: &RenderOptions) -> String {
        let borders = options.style.borders();

        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.display(options)).collect())
            .collect();

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.name.width()).collect();
        for row in &body {
            for (idx, text) in row.iter().enumerate() {
                widths[idx] = widths[idx].max(text.width());
            }
        }

        if let Some(max_width) = options.max_width {
            fit_widths(&mut widths, &self.columns, max_width);
        }

        let mut output = String::new();
        output.push_str(&border_line(&borders.top, borders.horizontal, &widths));

        let header: Vec<String> = self.columns.iter().map(|c| c.name.to_string()).collect();
        output.push_str(&content_line(&header, &self.columns, &widths, borders.vertical, options.bold_header));
        output.push_str(&border_line(&borders.middle, borders.horizontal, &widths));

        for row in &body {
            output.push_str(&content_line(row, &self.columns, &widths, borders.vertical, false));
        }

        output.push_str(&border_line(&borders.bottom, borders.horizontal, &widths));
        output
    }
}

/// Shrink the widest left-aligned column until the table fits
fn fit_widths(widths: &mut [usize], columns: &[Column], max_width: usize) {
    let total = |widths: &[usize]| widths.iter().map(|w| w + 3).sum::<usize>() + 1;

    let excess = total(widths).saturating_sub(max_width);
    if excess == 0 {
        return;
    }

    let widest = (0..columns.len())
        .filter(|idx| columns[*idx].align == Align::Left)
        .max_by_key(|idx| widths[*idx]);

    if let Some(idx) = widest {
        widths[idx] = widths[idx].saturating_sub(excess).max(MIN_TRUNCATED_WIDTH.min(widths[idx]));
    }
}

fn border_line(corners: &[&str; 3], horizontal: &str, widths: &[usize]) -> String {
    let segments: Vec<String> = widths.iter().map(|w| horizontal.repeat(w + 2)).collect();
    format!("{}{}{}\n", corners[0], segments.join(corners[1]), corners[2])
}

fn content_line(cells: &[String], columns: &[Column], widths: &[usize], vertical: &str, bold: bool) -> String {
    let mut line = String::from(vertical);
    for (idx, text) in cells.iter().enumerate() {
        let text = truncate_to_width(text, widths[idx]);
        let padded = pad(&text, widths[idx], columns[idx].align);
        line.push(' ');
        line.push_str(&bold_if_tty(&padded, bold));
        line.push(' ');
        line.push_str(vertical);
    }
    line.push('\n');
    line
}

fn pad(text: &str, width: usize, align: Align) -> String {
    let fill = width.saturating_sub(text.width());
    match align {
        Align::Left => format!("{}{}", text, " ".repeat(fill)),
        Align::Center => {
            let left = fill / 2;
            format!("{}{}{}", " ".repeat(left), text, " ".repeat(fill - left))
        }
    }
}

/// Cut text to a display width, marking the cut with ".."
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }

    let budget = width.saturating_sub(TRUNCATION_MARK.len());
    let mut used = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    if width >= TRUNCATION_MARK.len() {
        out.push_str(TRUNCATION_MARK);
    }
    out
}

/// Describe a time relative to `now` ("in 3 days", "2 hours ago")
pub fn format_relative_time(time: NaiveDateTime, now: NaiveDateTime) -> String {
    let delta: TimeDelta = time - now;
    let seconds = delta.num_seconds();
    let magnitude = seconds.unsigned_abs();

    if magnitude < 60 {
        return "now".to_string();
    }

    let (amount, unit) = if magnitude < 3600 {
        (magnitude / 60, "minute")
    } else if magnitude < 86_400 {
        (magnitude / 3600, "hour")
    } else if magnitude < 30 * 86_400 {
        (magnitude / 86_400, "day")
    } else if magnitude < 365 * 86_400 {
        (magnitude / (30 * 86_400), "month")
    } else {
        (magnitude / (365 * 86_400), "year")
    };

    let plural = if amount == 1 { "" } else { "s" };
    if seconds > 0 {
        format!("in {} {}{}", amount, unit, plural)
    } else {
        format!("{} {}{} ago", amount, unit, plural)
    }
}
