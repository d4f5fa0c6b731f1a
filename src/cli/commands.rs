use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use log::debug;
use regex::Regex;

use crate::api::GraphClient;
use crate::auth::access_token;
use crate::cli::columns::{allowed_columns, parse_sort_columns, parse_sort_mode, SortBy};
use crate::cli::error::{clean_arg, validate_non_empty};
use crate::cli::output::{Cell, Column, RenderOptions, Table, TimeFormat};
use crate::config::{default_dir, Config, ConfigOverrides};
use crate::datetime::{DateParser, ParseMode};
use crate::filter::{DateRange, TaskFilter};
use crate::models::graph_time::utc_to_local;
use crate::models::{find_list, Importance, NewTask, TaskList, TaskStatus, TodoTask};

/// Flag value that disables a regex or range filter
pub const MATCH_ALL: &str = ".";

pub const LIST_COLUMNS: [Column; 4] = [
    Column::left("ID"),
    Column::left("Name"),
    Column::center("Owner"),
    Column::center("Shared"),
];

pub const TASK_COLUMNS: [Column; 9] = [
    Column::left("Id"),
    Column::left("Title"),
    Column::center("Importance"),
    Column::center("Status"),
    Column::center("Reminder"),
    Column::center("Due Date"),
    Column::center("Completed"),
    Column::center("Created"),
    Column::center("Last Modified"),
];

#[derive(Parser, Debug)]
#[command(name = "mstodo")]
#[command(about = "mstodo - a command-line client for Microsoft To Do")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Directory holding config.toml and the token cache (default ~/.mstodo)
    #[arg(long, global = true, env = "MSTODO_CONFIG_DIR", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
    /// Port for the sign-in redirect listener (overrides config)
    #[arg(long, global = true, value_name = "PORT")]
    pub port: Option<i64>,
    /// Seconds to wait for sign-in to finish (overrides config)
    #[arg(long, global = true, value_name = "SECONDS")]
    pub auth_timeout: Option<i64>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show your task lists
    #[command(visible_alias = "list")]
    Lists(ListsArgs),
    /// Show the tasks of a list
    View(ViewArgs),
    /// Add a task to a list
    Add(AddArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct ListsArgs {
    /// Regex the list name must match
    #[arg(short = 'f', long, default_value = MATCH_ALL)]
    pub filter: String,
    /// Sort by name: asc, dsc or none
    #[arg(short = 's', long, default_value = "none")]
    pub sort: String,
    /// Comma separated columns to hide
    #[arg(short = 'x', long, default_value = "")]
    pub exclude: String,
    /// Show the ID column
    #[arg(short = 'i', long)]
    pub id: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ViewArgs {
    /// Name of the list to show
    pub list: String,
    /// Regex the title must match
    #[arg(short = 'l', long, default_value = MATCH_ALL)]
    pub title: String,
    /// Regex the status must match (e.g. "not started|in progress")
    #[arg(short = 'u', long, default_value = MATCH_ALL)]
    pub status: String,
    /// Reminder range, e.g. "start last monday; end friday"
    #[arg(short = 'r', long, default_value = MATCH_ALL)]
    pub reminder: String,
    /// Due date range
    #[arg(short = 'd', long, default_value = MATCH_ALL)]
    pub due: String,
    /// Completion range
    #[arg(short = 'o', long, default_value = MATCH_ALL)]
    pub completed: String,
    /// Creation range
    #[arg(short = 'c', long, default_value = MATCH_ALL)]
    pub created: String,
    /// Last modification range
    #[arg(short = 'm', long, default_value = MATCH_ALL)]
    pub last_modified: String,
    /// Sort columns, e.g. "[title:dsc,created:asc,status]"
    #[arg(short = 's', long, default_value = "none")]
    pub sort: String,
    /// Comma separated columns to hide
    #[arg(short = 'x', long, default_value = "")]
    pub exclude: String,
    /// Show absolute timestamps instead of relative ones
    #[arg(short = 'a', long)]
    pub absolute: bool,
    /// Show the Id column
    #[arg(short = 'i', long)]
    pub id: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// List to add the task to
    #[arg(short = 'l', long, default_value = "tasks")]
    pub list: String,
    /// Reminder date and time, e.g. "next friday at 9:00"
    #[arg(short = 'r', long)]
    pub reminder: Option<String>,
    /// Due date, e.g. "2/Jan/2021" or "this monday"
    #[arg(short = 'd', long)]
    pub due_date: Option<String>,
    /// low, normal or high
    #[arg(short = 'i', long, default_value = "normal")]
    pub importance: String,
    /// not started, in progress, completed, waiting on others or deferred
    #[arg(short = 's', long, default_value = "not started")]
    pub status: String,
}

/// Validated `lists` flags
#[derive(Debug)]
pub struct ListsQuery {
    pub name: Regex,
    pub sort: Vec<SortBy>,
    pub columns: Vec<Column>,
}

/// Validated `view` flags
#[derive(Debug)]
pub struct ViewQuery {
    pub list: String,
    pub filter: TaskFilter,
    pub sort: Vec<SortBy>,
    pub columns: Vec<Column>,
    pub time_format: TimeFormat,
}

/// A validated `add` request
#[derive(Debug)]
pub struct AddRequest {
    pub list: String,
    pub task: NewTask,
}

pub fn run() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // Help, version and usage errors are printed and exit through clap
        Err(e) => e.exit(),
    };
    run_with(cli, &DateParser::system())
}

pub fn run_with(cli: Cli, parser: &DateParser) -> Result<()> {
    let dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => default_dir()?,
    };
    let overrides = ConfigOverrides {
        port: cli.port,
        auth_timeout: cli.auth_timeout,
    };
    let config = Config::load(&dir, overrides)?;
    debug!("Loaded config from {}", dir.display());

    match cli.command {
        Commands::Lists(args) => handle_lists(&config, &args),
        Commands::View(args) => handle_view(&config, &args, parser),
        Commands::Add(args) => handle_add(&config, &args, parser),
    }
}

fn connect(config: &Config) -> Result<GraphClient> {
    let token = access_token(config)?;
    Ok(GraphClient::new(&config.api_url, token))
}

fn render_options(config: &Config, time_format: TimeFormat) -> RenderOptions {
    RenderOptions::new(config.table_style(), time_format, Local::now().naive_local()).for_stdout()
}

fn compile_regex(pattern: &str, flag: &str) -> Result<Regex> {
    Regex::new(pattern).with_context(|| format!("invalid --{} regex '{}'", flag, pattern))
}

fn optional_regex(pattern: &str, flag: &str) -> Result<Option<Regex>> {
    if pattern.trim() == MATCH_ALL {
        return Ok(None);
    }
    compile_regex(pattern, flag).map(Some)
}

fn parse_range_flag(parser: &DateParser, value: &str, flag: &str) -> Result<Option<DateRange>> {
    if value.trim() == MATCH_ALL {
        return Ok(None);
    }
    parser
        .parse_range(value, ParseMode::Date)
        .map(Some)
        .map_err(|e| anyhow!("invalid --{} filter: {}", flag, e))
}

/// Drop the ID column unless it was asked for
fn visible_columns(exclude: &str, columns: &[Column], show_id: bool) -> Result<Vec<Column>> {
    let mut visible = allowed_columns(exclude, columns)?;
    if !show_id {
        visible.retain(|c| c != &columns[0]);
    }
    Ok(visible)
}

pub fn build_lists_query(args: &ListsArgs) -> Result<ListsQuery> {
    let name = compile_regex(&args.filter, "filter")?;
    let sort = parse_sort_mode(&args.sort)?
        .map(|mode| vec![SortBy { column: LIST_COLUMNS[1].name, mode }])
        .unwrap_or_default();
    let columns = visible_columns(&args.exclude, &LIST_COLUMNS, args.id)?;
    Ok(ListsQuery { name, sort, columns })
}

pub fn build_view_query(args: &ViewArgs, parser: &DateParser) -> Result<ViewQuery> {
    let list = clean_arg(&args.list).to_string();
    validate_non_empty(&list, "list name").map_err(|e| anyhow!(e))?;

    let filter = TaskFilter {
        title: optional_regex(&args.title, "title")?,
        status: optional_regex(&args.status, "status")?,
        reminder: parse_range_flag(parser, &args.reminder, "reminder")?,
        due: parse_range_flag(parser, &args.due, "due")?,
        completed: parse_range_flag(parser, &args.completed, "completed")?,
        created: parse_range_flag(parser, &args.created, "created")?,
        last_modified: parse_range_flag(parser, &args.last_modified, "last-modified")?,
    };

    Ok(ViewQuery {
        list,
        filter,
        sort: parse_sort_columns(&args.sort, &TASK_COLUMNS)?,
        columns: visible_columns(&args.exclude, &TASK_COLUMNS, args.id)?,
        time_format: if args.absolute { TimeFormat::Absolute } else { TimeFormat::Relative },
    })
}

pub fn build_add_request(args: &AddArgs, parser: &DateParser) -> Result<AddRequest> {
    let title = clean_arg(&args.title);
    if title.is_empty() {
        bail!("title is empty");
    }

    let list = clean_arg(&args.list).to_string();
    validate_non_empty(&list, "list name").map_err(|e| anyhow!(e))?;

    let status = TaskStatus::from_str(args.status.trim()).ok_or_else(|| {
        anyhow!("'{}' is not a valid value for status - valid values: {}", args.status, TaskStatus::options())
    })?;
    let importance = Importance::from_str(args.importance.trim()).ok_or_else(|| {
        anyhow!(
            "'{}' is not a valid value for importance - valid values: {}",
            args.importance,
            Importance::options()
        )
    })?;

    let mut task = NewTask::new(title.to_string());
    task.status = status;
    task.importance = importance;

    if let Some(reminder) = args.reminder.as_deref().filter(|r| !clean_arg(r).is_empty()) {
        let when = parser
            .parse_datetime(reminder)
            .map_err(|e| anyhow!("invalid --reminder: {}", e))?;
        task = task.with_reminder(when);
    }
    if let Some(due) = args.due_date.as_deref().filter(|d| !clean_arg(d).is_empty()) {
        let when = parser
            .parse_date(due)
            .map_err(|e| anyhow!("invalid --due-date: {}", e))?;
        task = task.with_due_date(when);
    }

    Ok(AddRequest { list, task })
}

pub fn render_lists(lists: &[TaskList], query: &ListsQuery, options: &RenderOptions) -> String {
    let mut table = Table::new(LIST_COLUMNS.to_vec());
    for list in lists.iter().filter(|l| query.name.is_match(&l.display_name)) {
        table.push_row(vec![
            Cell::text(&list.id),
            Cell::text(&list.display_name),
            Cell::Bool(list.is_owner),
            Cell::Bool(list.is_shared),
        ]);
    }
    table.sort_by(&query.sort);
    table.retain_columns(&query.columns);
    table.render(options)
}

pub fn render_tasks(tasks: &[TodoTask], query: &ViewQuery, options: &RenderOptions) -> String {
    let mut table = Table::new(TASK_COLUMNS.to_vec());
    for task in query.filter.apply(tasks) {
        table.push_row(vec![
            Cell::text(&task.id),
            Cell::text(&task.title),
            Cell::text(task.importance.as_str()),
            Cell::text(task.status.as_str()),
            Cell::Time(task.reminder_date_time),
            Cell::Time(task.due_date_time),
            Cell::Time(task.completed_date_time),
            Cell::Time(Some(utc_to_local(task.created_date_time))),
            Cell::Time(Some(utc_to_local(task.last_modified_date_time))),
        ]);
    }
    table.sort_by(&query.sort);
    table.retain_columns(&query.columns);
    table.render(options)
}

fn handle_lists(config: &Config, args: &ListsArgs) -> Result<()> {
    let query = build_lists_query(args)?;
    let client = connect(config)?;
    let lists = client.get_lists()?;
    debug!("Fetched {} lists", lists.len());

    print!("{}", render_lists(&lists, &query, &render_options(config, TimeFormat::Relative)));
    Ok(())
}

fn handle_view(config: &Config, args: &ViewArgs, parser: &DateParser) -> Result<()> {
    let query = build_view_query(args, parser)?;
    let client = connect(config)?;
    let lists = client.get_lists()?;
    let list = find_list(&lists, &query.list)?;
    let tasks = client.get_tasks(&list.id)?;
    debug!("Fetched {} tasks from '{}'", tasks.len(), list.display_name);

    print!("{}", render_tasks(&tasks, &query, &render_options(config, query.time_format)));
    Ok(())
}

fn handle_add(config: &Config, args: &AddArgs, parser: &DateParser) -> Result<()> {
    let request = build_add_request(args, parser)?;
    let client = connect(config)?;
    let lists = client.get_lists()?;
    let list = find_list(&lists, &request.list)?;
    let created = client.create_task(&list.id, &request.task)?;

    println!("Created task '{}' in list '{}'", created.title, list.display_name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::columns::SortMode;
    use crate::cli::output::TableStyle;
    use crate::datetime::FixedClock;
    use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};

    // Wednesday 7 July 2021, noon
    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 7, 7).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn parser() -> DateParser {
        DateParser::new(FixedClock::new(reference()))
    }

    fn parse_view(args: &[&str]) -> ViewArgs {
        let mut argv = vec!["mstodo", "view"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::View(view) => view,
            other => panic!("expected view, got {:?}", other),
        }
    }

    fn parse_add(args: &[&str]) -> AddArgs {
        let mut argv = vec!["mstodo", "add"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Add(add) => add,
            other => panic!("expected add, got {:?}", other),
        }
    }

    fn parse_lists(args: &[&str]) -> ListsArgs {
        let mut argv = vec!["mstodo", "lists"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Lists(lists) => lists,
            other => panic!("expected lists, got {:?}", other),
        }
    }

    fn task(id: &str, title: &str, due: Option<NaiveDateTime>) -> TodoTask {
        TodoTask {
            id: id.to_string(),
            title: title.to_string(),
            importance: Importance::Normal,
            is_reminder_on: false,
            status: TaskStatus::NotStarted,
            reminder_date_time: None,
            due_date_time: due,
            completed_date_time: None,
            created_date_time: Utc.with_ymd_and_hms(2021, 7, 1, 9, 0, 0).unwrap(),
            last_modified_date_time: Utc.with_ymd_and_hms(2021, 7, 2, 9, 0, 0).unwrap(),
        }
    }

    fn list(id: &str, name: &str, owner: bool) -> TaskList {
        TaskList {
            id: id.to_string(),
            display_name: name.to_string(),
            is_owner: owner,
            is_shared: false,
            wellknown_list_name: None,
        }
    }

    fn options() -> RenderOptions {
        RenderOptions::new(TableStyle::Default, TimeFormat::Absolute, reference())
    }

    #[test]
    fn test_global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["mstodo", "lists", "--port", "8080", "--config-dir", "/tmp/x"]).unwrap();
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.config_dir, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(cli.command, Commands::Lists(_)));
    }

    #[test]
    fn test_list_alias() {
        let cli = Cli::try_parse_from(["mstodo", "list"]).unwrap();
        assert!(matches!(cli.command, Commands::Lists(_)));
    }

    #[test]
    fn test_view_defaults_build_an_open_filter() {
        let query = build_view_query(&parse_view(&["Tasks"]), &parser()).unwrap();
        assert_eq!(query.list, "Tasks");
        assert!(query.filter.title.is_none());
        assert!(query.filter.status.is_none());
        assert!(query.filter.due.is_none());
        assert!(query.sort.is_empty());
        assert_eq!(query.time_format, TimeFormat::Relative);
        assert!(!query.columns.iter().any(|c| c.name == "Id"));
        assert_eq!(query.columns.len(), TASK_COLUMNS.len() - 1);
    }

    #[test]
    fn test_view_range_flags_resolve_against_the_clock() {
        let args = parse_view(&["Tasks", "-d", "start last monday; end friday", "-a", "-i"]);
        let query = build_view_query(&args, &parser()).unwrap();

        let due = query.filter.due.unwrap();
        assert_eq!(due.start, NaiveDate::from_ymd_opt(2021, 7, 5).unwrap().and_hms_opt(0, 0, 0));
        assert_eq!(due.end, NaiveDate::from_ymd_opt(2021, 7, 9).unwrap().and_hms_opt(0, 0, 0));
        assert_eq!(query.time_format, TimeFormat::Absolute);
        assert!(query.columns.iter().any(|c| c.name == "Id"));
    }

    #[test]
    fn test_view_rejects_bad_filters() {
        let err = build_view_query(&parse_view(&["Tasks", "-d", "a;b;c"]), &parser()).unwrap_err();
        assert!(err.to_string().starts_with("invalid --due filter"));

        let err = build_view_query(&parse_view(&["Tasks", "-c", "monday"]), &parser()).unwrap_err();
        assert!(err.to_string().contains("--created"));

        assert!(build_view_query(&parse_view(&["Tasks", "-l", "("]), &parser()).is_err());
        assert!(build_view_query(&parse_view(&["Tasks", "-s", "[owner]"]), &parser()).is_err());
        assert!(build_view_query(&parse_view(&["Tasks", "-x", "colour"]), &parser()).is_err());
        assert!(build_view_query(&parse_view(&["''"]), &parser()).is_err());
    }

    #[test]
    fn test_view_sort_spec() {
        let args = parse_view(&["Tasks", "-s", "[title:dsc,due date]"]);
        let query = build_view_query(&args, &parser()).unwrap();
        assert_eq!(
            query.sort,
            vec![
                SortBy { column: "Title", mode: SortMode::Dsc },
                SortBy { column: "Due Date", mode: SortMode::Asc },
            ]
        );
    }

    #[test]
    fn test_add_builds_payload() {
        let args = parse_add(&["'Buy milk'", "-r", "next friday at 9:30", "-d", "2/Jan/2022", "-i", "high"]);
        let request = build_add_request(&args, &parser()).unwrap();

        assert_eq!(request.list, "tasks");
        assert_eq!(request.task.title, "Buy milk");
        assert_eq!(request.task.importance, Importance::High);
        assert_eq!(request.task.status, TaskStatus::NotStarted);
        assert!(request.task.is_reminder_on);
        assert_eq!(
            request.task.reminder_date_time,
            NaiveDate::from_ymd_opt(2021, 7, 9).unwrap().and_hms_opt(9, 30, 0)
        );
        assert_eq!(
            request.task.due_date_time,
            NaiveDate::from_ymd_opt(2022, 1, 2).unwrap().and_hms_opt(0, 0, 0)
        );
    }

    #[test]
    fn test_add_validation_errors() {
        let err = build_add_request(&parse_add(&["  \"\" "]), &parser()).unwrap_err();
        assert_eq!(err.to_string(), "title is empty");

        let err = build_add_request(&parse_add(&["x", "-s", "done"]), &parser()).unwrap_err();
        assert!(err.to_string().starts_with("'done' is not a valid value for status"));

        let err = build_add_request(&parse_add(&["x", "-i", "urgent"]), &parser()).unwrap_err();
        assert!(err.to_string().starts_with("'urgent' is not a valid value for importance"));

        let err = build_add_request(&parse_add(&["x", "-r", "next friday"]), &parser()).unwrap_err();
        assert!(err.to_string().starts_with("invalid --reminder"));
    }

    #[test]
    fn test_lists_query() {
        let query = build_lists_query(&parse_lists(&["-s", "dsc"])).unwrap();
        assert_eq!(query.sort, vec![SortBy { column: "Name", mode: SortMode::Dsc }]);
        assert_eq!(query.columns.len(), 3);

        assert!(build_lists_query(&parse_lists(&["-s", "sideways"])).is_err());
        assert!(build_lists_query(&parse_lists(&["-f", "[unclosed"])).is_err());
    }

    #[test]
    fn test_render_lists_filters_and_sorts() {
        let lists = vec![list("1", "Tasks", true), list("2", "Groceries", true), list("3", "Work", false)];
        let query = build_lists_query(&parse_lists(&["-f", "^(Tasks|Work)$", "-s", "dsc"])).unwrap();
        let rendered = render_lists(&lists, &query, &options());

        assert!(!rendered.contains("Groceries"));
        let work = rendered.find("Work").unwrap();
        let tasks = rendered.find("Tasks").unwrap();
        assert!(work < tasks);
    }

    #[test]
    fn test_render_tasks_applies_filter() {
        let friday = NaiveDate::from_ymd_opt(2021, 7, 9).unwrap().and_hms_opt(0, 0, 0);
        let later = NaiveDate::from_ymd_opt(2021, 8, 1).unwrap().and_hms_opt(0, 0, 0);
        let tasks = vec![task("a", "Pay rent", friday), task("b", "Renew passport", later), task("c", "Call mum", None)];

        let args = parse_view(&["Tasks", "-d", "start monday; end friday", "-a"]);
        let query = build_view_query(&args, &parser()).unwrap();
        let rendered = render_tasks(&tasks, &query, &options());

        assert!(rendered.contains("Pay rent"));
        assert!(rendered.contains("2021-07-09 00:00"));
        assert!(!rendered.contains("Renew passport"));
        assert!(!rendered.contains("Call mum"));
    }
}
