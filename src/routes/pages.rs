// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTML pages shown in the OAuth popup window.

use axum::http::header;
use axum::response::{Html, IntoResponse, Response};

use crate::error::AppError;

/// The pages' own inline style and script are the only things they load.
const PAGE_CSP: &str =
    "default-src 'none'; style-src 'unsafe-inline'; script-src 'unsafe-inline'; frame-ancestors 'none'";

const SUCCESS_CLOSE_MS: u32 = 2_000;
const ERROR_CLOSE_MS: u32 = 10_000;

/// "Connected" page; closes itself after two seconds.
pub fn success(display_name: &str) -> Response {
    let body = format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>GitHub Connected</title>
    <style>
      body {{ font-family: system-ui; padding: 40px; text-align: center; }}
      h1 {{ color: #22c55e; }}
    </style>
  </head>
  <body>
    <h1>GitHub Connected Successfully!</h1>
    <p>Welcome, {name}!</p>
    <p>You can now close this window.</p>
    <script>setTimeout(() => window.close(), {close_ms});</script>
  </body>
</html>"#,
        name = html_escape(display_name),
        close_ms = SUCCESS_CLOSE_MS,
    );
    page(body)
}

/// Short failure page for a request that never reached GitHub.
pub fn failure(message: &str) -> Response {
    let body = format!(
        r#"<!DOCTYPE html>
<html>
  <head><meta charset="utf-8"><title>GitHub Authorization</title></head>
  <body>
    <h1>{message}</h1>
    <script>setTimeout(() => window.close(), {close_ms});</script>
  </body>
</html>"#,
        message = html_escape(message),
        close_ms = ERROR_CLOSE_MS,
    );
    page(body)
}

/// Readable error page for a failed exchange, with remediation hints.
pub fn connection_error(err: &AppError) -> Response {
    let (title, hint, details) = match err {
        AppError::Network { kind, message } => {
            (kind.title().to_string(), Some(kind.help()), message.clone())
        }
        AppError::Database(_) | AppError::Internal(_) => (
            "Internal server error".to_string(),
            None,
            "Internal server error".to_string(),
        ),
        other => (other.to_string(), None, other.to_string()),
    };

    let hint = hint
        .map(|h| format!("<p>{}</p>", html_escape(h)))
        .unwrap_or_default();

    let body = format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <title>Connection Error</title>
    <style>
      body {{ font-family: system-ui; padding: 40px; text-align: center; background: #1f2937; color: white; }}
      h1 {{ color: #ef4444; }}
      .details {{ background: #374151; padding: 15px; border-radius: 8px; margin: 20px 0; text-align: left; }}
      .help {{ background: #1e3a8a; padding: 15px; border-radius: 8px; margin: 20px 0; font-size: 14px; }}
      code {{ background: #000; padding: 2px 6px; border-radius: 3px; }}
    </style>
  </head>
  <body>
    <h1>Connection Error</h1>
    <p><strong>{title}</strong></p>
    {hint}
    <div class="details">
      <strong>Technical details:</strong><br>
      {details}
    </div>
    <div class="help">
      <strong>Possible solutions:</strong><br>
      &bull; Check your internet connection<br>
      &bull; Disable VPN/proxy temporarily<br>
      &bull; Check firewall settings<br>
      &bull; If behind a corporate proxy, set <code>HTTP_PROXY</code> environment variable<br>
      &bull; Try again in a few moments
    </div>
    <script>setTimeout(() => window.close(), {close_ms});</script>
  </body>
</html>"#,
        title = html_escape(&title),
        details = html_escape(&details),
        close_ms = ERROR_CLOSE_MS,
    );
    page(body)
}

fn page(body: String) -> Response {
    ([(header::CONTENT_SECURITY_POLICY, PAGE_CSP)], Html(body)).into_response()
}

fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}
