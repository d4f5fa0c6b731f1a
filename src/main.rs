use mstodo::cli::{report_error, run};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("MSTODO_LOG", "warn")).init();

    #[cfg(windows)]
    let _ = enable_ansi_support::enable_ansi_support();

    if let Err(e) = run() {
        std::process::exit(report_error(&e));
    }
}
