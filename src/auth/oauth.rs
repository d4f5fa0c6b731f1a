//! Browser sign-in (authorization code flow)
//!
//! A listener on `127.0.0.1:<port>` waits on a background thread for the
//! provider's redirect to `/oauth/callback`. Requests with the wrong
//! `state` or without a `code` are answered and ignored; anything else on
//! the port gets a 404. The flow gives up after `auth-timeout` seconds.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, warn};
use reqwest::Url;
use uuid::Uuid;

use crate::auth::token::{exchange_code, StoredToken};
use crate::config::Config;

pub const CALLBACK_PATH: &str = "/oauth/callback";
pub const SCOPES: &str = "offline_access Tasks.ReadWrite";

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const READ_TIMEOUT: Duration = Duration::from_secs(2);

const SUCCESS_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>mstodo authentication</title>
    <style>
      body { font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; text-align: center; background-color: #2ecc71; }
    </style>
  </head>
  <body>
    <h1>Success</h1>
    <p>You can now close this window and return to the terminal.</p>
  </body>
</html>
"#;

pub fn redirect_uri(port: u16) -> String {
    format!("http://localhost:{}{}", port, CALLBACK_PATH)
}

pub fn authorize_url(config: &Config, state: &str, redirect_uri: &str) -> Result<Url> {
    let endpoint = format!("{}/authorize", config.authority_url.trim_end_matches('/'));
    Url::parse_with_params(
        &endpoint,
        [
            ("client_id", config.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", redirect_uri),
            ("response_mode", "query"),
            ("scope", SCOPES),
            ("state", state),
        ],
    )
    .with_context(|| format!("invalid authority-url '{}'", config.authority_url))
}

/// What one request to the listener amounts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Valid redirect carrying an authorization code
    Code(String),
    /// Callback the flow cannot use (wrong state, no code); keep waiting
    Rejected(String),
    /// The provider reported an error; the flow ends
    Denied(String),
    /// Not the callback path
    NotFound,
}

/// Classify an HTTP request line such as `GET /oauth/callback?code=..&state=.. HTTP/1.1`
pub fn parse_callback(request_line: &str, expected_state: &str) -> CallbackOutcome {
    let target = request_line.split_whitespace().nth(1).unwrap_or("/");
    let url = match Url::parse("http://localhost").and_then(|base| base.join(target)) {
        Ok(url) => url,
        Err(_) => return CallbackOutcome::NotFound,
    };
    if url.path() != CALLBACK_PATH {
        return CallbackOutcome::NotFound;
    }

    let mut code = None;
    let mut state = None;
    let mut error = None;
    let mut description = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => description = Some(value.into_owned()),
            _ => {}
        }
    }

    if state.as_deref() != Some(expected_state) {
        return CallbackOutcome::Rejected(format!(
            "invalid oauth state, expected '{}', got '{}'",
            expected_state,
            state.unwrap_or_default()
        ));
    }
    if let Some(error) = error {
        let detail = match description {
            Some(description) => format!("{} ({})", description, error),
            None => error,
        };
        return CallbackOutcome::Denied(detail);
    }
    match code {
        Some(code) if !code.is_empty() => CallbackOutcome::Code(code),
        _ => CallbackOutcome::Rejected("missing authorization code".to_string()),
    }
}

/// Run the browser flow and return the issued token
pub fn authorize(config: &Config) -> Result<StoredToken> {
    let port = config.listen_port();
    let state = Uuid::new_v4().to_string();
    let redirect = redirect_uri(port);
    let url = authorize_url(config, &state, &redirect)?;

    let listener = TcpListener::bind(("127.0.0.1", port))
        .with_context(|| format!("Failed to listen for the sign-in callback on port {}", port))?;
    let timeout = Duration::from_secs(config.auth_timeout.unsigned_abs());

    let stop = Arc::new(AtomicBool::new(false));
    let (tx, rx) = mpsc::channel();
    let worker = {
        let stop = Arc::clone(&stop);
        let config = config.clone();
        let redirect = redirect.clone();
        thread::spawn(move || {
            let result = serve_callback(&listener, &state, &stop, |code| exchange_code(&config, code, &redirect));
            let _ = tx.send(result);
        })
    };

    eprintln!("You will now be taken to your browser for authentication, or open this URL in a browser:");
    eprintln!("{}", url);
    if let Err(e) = open_browser(url.as_str()) {
        warn!("Could not open a browser: {}", e);
    }
    info!("Authentication will be cancelled in {} seconds", timeout.as_secs());

    let result = rx.recv_timeout(timeout);
    stop.store(true, Ordering::SeqCst);
    let _ = worker.join();

    match result {
        Ok(token) => token,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            bail!("authentication timed out after {} seconds and was cancelled", timeout.as_secs())
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(anyhow!("authentication listener stopped unexpectedly")),
    }
}

/// Accept requests until a usable callback arrives or `stop` is set
///
/// `exchange` turns the authorization code into a token; its outcome
/// decides which page the browser sees.
pub fn serve_callback<F>(listener: &TcpListener, state: &str, stop: &AtomicBool, mut exchange: F) -> Result<StoredToken>
where
    F: FnMut(&str) -> Result<StoredToken>,
{
    listener
        .set_nonblocking(true)
        .context("Failed to configure the sign-in listener")?;
    debug!("Waiting for the sign-in callback on {:?}", listener.local_addr().ok());

    loop {
        if stop.load(Ordering::SeqCst) {
            bail!("authentication was cancelled");
        }

        let mut stream = match listener.accept() {
            Ok((stream, _)) => stream,
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                thread::sleep(POLL_INTERVAL);
                continue;
            }
            Err(e) => return Err(e).context("Failed to accept the sign-in callback"),
        };

        let request_line = match read_request_line(&stream) {
            Ok(line) => line,
            Err(e) => {
                debug!("Dropping unreadable request: {}", e);
                continue;
            }
        };

        match parse_callback(&request_line, state) {
            CallbackOutcome::NotFound => {
                let _ = respond(&mut stream, "404 Not Found", "text/plain", "Not Found\n");
            }
            CallbackOutcome::Rejected(reason) => {
                warn!("Ignoring sign-in callback: {}", reason);
                let _ = respond(&mut stream, "400 Bad Request", "text/plain", &format!("{}\n", reason));
            }
            CallbackOutcome::Denied(reason) => {
                let _ = respond(
                    &mut stream,
                    "400 Bad Request",
                    "text/plain",
                    &format!("Authorization failed: {}\n", reason),
                );
                bail!("authorization failed: {}", reason);
            }
            CallbackOutcome::Code(code) => {
                return match exchange(&code) {
                    Ok(token) => {
                        let _ = respond(&mut stream, "200 OK", "text/html; charset=utf-8", SUCCESS_PAGE);
                        Ok(token)
                    }
                    Err(e) => {
                        let _ = respond(
                            &mut stream,
                            "500 Internal Server Error",
                            "text/plain",
                            &format!("Authorization failed: {:#}\n", e),
                        );
                        Err(e)
                    }
                };
            }
        }
    }
}

/// Read the request line, then drain the headers so closing the socket is clean
fn read_request_line(stream: &TcpStream) -> std::io::Result<String> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;

    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;

    let mut header = String::new();
    loop {
        header.clear();
        if reader.read_line(&mut header)? == 0 || header.trim().is_empty() {
            break;
        }
    }
    Ok(request_line)
}

fn respond(stream: &mut TcpStream, status: &str, content_type: &str, body: &str) -> std::io::Result<()> {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes())?;
    stream.flush()
}

/// Hand the URL to the platform's browser opener
fn open_browser(url: &str) -> std::io::Result<()> {
    let mut command = if cfg!(target_os = "windows") {
        let mut command = Command::new("rundll32");
        command.args(["url.dll,FileProtocolHandler", url]);
        command
    } else if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg(url);
        command
    } else {
        let mut command = Command::new("xdg-open");
        command.arg(url);
        command
    };

    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
}
