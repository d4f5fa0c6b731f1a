// Error classification and input validation

/// Characters trimmed from free-text arguments (titles, list names)
pub const ARG_CUTSET: &[char] = &['\'', '"', ' '];

/// Exit code for user errors (bad input, unknown list, invalid config)
pub const USER_ERROR_EXIT: i32 = 1;
/// Exit code for internal errors (I/O and transport failures)
pub const INTERNAL_ERROR_EXIT: i32 = 2;

/// Strip surrounding quotes and spaces
pub fn clean_arg(value: &str) -> &str {
    value.trim_matches(ARG_CUTSET)
}

/// Validate that a string is not empty
pub fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Failures caused by the system rather than by what the user typed
pub fn is_internal_error(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.is::<std::io::Error>() || cause.is::<reqwest::Error>())
}

/// Print an error the way the CLI reports it and return the exit code
pub fn report_error(err: &anyhow::Error) -> i32 {
    if is_internal_error(err) {
        eprintln!("Internal error: {}", err);
        let mut causes = err.chain().skip(1).peekable();
        if causes.peek().is_some() {
            eprintln!("\nCaused by:");
            for (indent, cause) in causes.enumerate() {
                eprintln!("{:indent$}  {}", "", cause, indent = indent + 1);
            }
        }
        INTERNAL_ERROR_EXIT
    } else {
        eprintln!("Error: {:#}", err);
        USER_ERROR_EXIT
    }
}
