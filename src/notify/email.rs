//! Email rendering and SMTP delivery.

use std::time::Duration;

use chrono::{DateTime, Utc};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use super::group_by_repo;
use crate::config::NotifySettings;
use crate::error::NotifyError;
use crate::watcher::{repo_short_name, UpdateEvent};

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);
const IMPLICIT_TLS_PORT: u16 = 465;
const DEFAULT_SMTP_PORT: u16 = 587;

const PRIMARY_COLOR: &str = "#0969da";
const BG_COLOR: &str = "#f6f8fa";
const BORDER_COLOR: &str = "#d0d7de";

/// SMTP settings read from `EMAIL_*` variables.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub to: Vec<String>,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}

impl EmailConfig {
    /// Build from a variable lookup.
    ///
    /// Returns `Ok(None)` when `EMAIL_SMTP_SERVER` is unset.
    ///
    /// # Errors
    ///
    /// Returns an error when the server is set but other values are missing or invalid.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, NotifyError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let Some(smtp_server) = get("EMAIL_SMTP_SERVER") else {
            return Ok(None);
        };

        let missing: Vec<&str> = ["EMAIL_USERNAME", "EMAIL_PASSWORD", "EMAIL_TO"]
            .into_iter()
            .filter(|name| get(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(NotifyError::MissingCredentials(missing.join(", ")));
        }

        let smtp_port = match get("EMAIL_SMTP_PORT") {
            Some(port) => port.trim().parse().map_err(|_| {
                NotifyError::InvalidSetting(format!("EMAIL_SMTP_PORT '{port}' is not a port number"))
            })?,
            None => DEFAULT_SMTP_PORT,
        };

        let to = get("EMAIL_TO")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(String::from)
            .collect();

        Ok(Some(Self {
            smtp_server,
            smtp_port,
            username: get("EMAIL_USERNAME").unwrap_or_default(),
            password: get("EMAIL_PASSWORD").unwrap_or_default(),
            to,
        }))
    }
}

/// Subject line for a batch of updates.
#[must_use]
pub fn render_subject(updates: &[UpdateEvent], settings: &NotifySettings) -> String {
    let prefix = &settings.email_subject_prefix;
    let groups = group_by_repo(updates);
    let files = updates.len();
    let plural = if files == 1 { "" } else { "s" };

    match groups.as_slice() {
        [(repo, _)] => format!(
            "{prefix} 📢 {} has {files} file update{plural}",
            repo_short_name(repo)
        ),
        _ => format!(
            "{prefix} 📢 {} repositories, {files} file update{plural}",
            groups.len()
        ),
    }
}

/// Plain-text body.
#[must_use]
pub fn render_text(
    updates: &[UpdateEvent],
    settings: &NotifySettings,
    now: DateTime<Utc>,
) -> String {
    let rule = "━".repeat(50);
    let groups = group_by_repo(updates);

    let mut lines = vec![
        rule.clone(),
        "📢 Lang-Monitor file update notification".to_string(),
        rule.clone(),
        format!("⏰ Checked at: {}", now.format("%Y-%m-%d %H:%M:%S UTC")),
        format!(
            "📊 Updates: {} repositories / {} files",
            groups.len(),
            updates.len()
        ),
        rule,
        String::new(),
    ];

    for (repo, repo_updates) in &groups {
        lines.push(format!("📦 {repo}"));
        lines.push("-".repeat(40));
        for update in repo_updates {
            lines.push(format!("  📄 {}", update.path));
            lines.push(format!(
                "     Author: {} | Date: {}",
                update.commit_author, update.commit_date
            ));
            if settings.include_commit_message {
                lines.push(format!("     Commit: {}", update.commit_message));
            }
            if settings.include_diff_link {
                lines.push(format!("     🔗 {}", update.compare_url));
            }
            lines.push(String::new());
        }
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// HTML body with compare, commit and file links.
#[must_use]
pub fn render_html(
    updates: &[UpdateEvent],
    settings: &NotifySettings,
    now: DateTime<Utc>,
) -> String {
    let groups = group_by_repo(updates);
    let date = now.format("%Y-%m-%d");
    let time = now.format("%H:%M:%S");

    let mut html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Lang-Monitor Updates</title>
</head>
<body style="margin:0;padding:0;background-color:{BG_COLOR};font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Helvetica,Arial,sans-serif;color:#24292f;">
<table width="100%" cellpadding="0" cellspacing="0" border="0" style="background-color:{BG_COLOR};">
<tr><td align="center" style="padding:20px;">
<table width="600" cellpadding="0" cellspacing="0" border="0" style="max-width:600px;width:100%;background-color:#ffffff;border-radius:6px;border:1px solid {BORDER_COLOR};">
<tr><td style="padding:24px;border-bottom:1px solid {BORDER_COLOR};text-align:center;">
<h1 style="margin:0;font-size:20px;font-weight:600;">📢 File update notification</h1>
<p style="margin:8px 0 0;font-size:14px;color:#57606a;">Detected by Lang-Monitor</p>
</td></tr>
<tr><td style="padding:16px 24px;border-bottom:1px solid {BORDER_COLOR};">
<table width="100%" cellpadding="0" cellspacing="0" border="0"><tr>
<td align="center" width="33%"><div style="font-size:24px;font-weight:600;color:{PRIMARY_COLOR};">{repos}</div><div style="font-size:12px;color:#57606a;">Repositories</div></td>
<td align="center" width="33%"><div style="font-size:24px;font-weight:600;color:{PRIMARY_COLOR};">{files}</div><div style="font-size:12px;color:#57606a;">Files</div></td>
<td align="center" width="33%"><div style="font-size:14px;font-weight:600;">{date}</div><div style="font-size:12px;color:#57606a;">{time} UTC</div></td>
</tr></table>
</td></tr>
<tr><td style="padding:24px;">"#,
        repos = groups.len(),
        files = updates.len(),
    );

    for (repo, repo_updates) in &groups {
        html.push_str(&format!(
            r#"
<div style="margin-bottom:24px;">
<div style="margin-bottom:12px;padding-bottom:8px;border-bottom:1px solid {BORDER_COLOR};font-size:16px;font-weight:600;">📦 {}</div>"#,
            escape(repo)
        ));

        for update in repo_updates {
            let message = if settings.include_commit_message {
                format!(
                    r#"<span style="font-size:14px;font-weight:600;">{}</span>"#,
                    escape(&update.commit_message)
                )
            } else {
                String::new()
            };
            let compare = if settings.include_diff_link {
                link_button(&update.compare_url, "📊 Compare")
            } else {
                String::new()
            };

            html.push_str(&format!(
                r#"
<div style="margin-bottom:16px;border:1px solid {BORDER_COLOR};border-radius:6px;">
<div style="background-color:{BG_COLOR};padding:8px 12px;border-bottom:1px solid {BORDER_COLOR};font-size:12px;font-family:ui-monospace,Menlo,Consolas,monospace;word-break:break-all;">{path}</div>
<div style="padding:12px;">
<div style="margin-bottom:8px;"><span style="display:inline-block;padding:2px 6px;background-color:#ddf4ff;color:{PRIMARY_COLOR};border-radius:10px;font-size:12px;margin-right:6px;">{name}</span>{message}</div>
<div style="font-size:12px;color:#57606a;margin-bottom:12px;">👤 {author} &nbsp;•&nbsp; 🕒 {date}</div>
<div>{compare}{commit}{file}</div>
</div>
</div>"#,
                path = escape(&update.path),
                name = escape(&update.name),
                author = escape(&update.commit_author),
                date = escape(&update.commit_date),
                commit = link_button(&update.commit_url, "📝 Commit"),
                file = link_button(&update.file_url, "📄 File"),
            ));
        }
        html.push_str("</div>");
    }

    html.push_str(&format!(
        r#"</td></tr>
<tr><td style="background-color:{BG_COLOR};padding:20px;border-top:1px solid {BORDER_COLOR};text-align:center;">
<p style="margin:0;color:#57606a;font-size:12px;">Generated by Lang-Monitor</p>
</td></tr>
</table>
</td></tr></table>
</body></html>"#
    ));

    html
}

fn link_button(url: &str, label: &str) -> String {
    format!(
        r#"<a href="{}" style="text-decoration:none;display:inline-block;padding:5px 12px;background-color:{BG_COLOR};color:#24292f;border:1px solid {BORDER_COLOR};border-radius:6px;font-size:12px;margin-right:4px;">{label}</a>"#,
        escape(url)
    )
}

/// Minimal HTML escaping for text and attribute values.
fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Build the multipart message.
///
/// # Errors
///
/// Returns an error if an address is invalid or the message cannot be assembled.
pub fn build_message(
    config: &EmailConfig,
    updates: &[UpdateEvent],
    settings: &NotifySettings,
    now: DateTime<Utc>,
) -> Result<Message, NotifyError> {
    let sender = config
        .username
        .parse()
        .map_err(|e| NotifyError::Message(format!("invalid sender '{}': {e}", config.username)))?;

    let mut builder = Message::builder()
        .from(Mailbox::new(Some(settings.email_sender_name.clone()), sender))
        .subject(render_subject(updates, settings));

    for recipient in &config.to {
        let mailbox: Mailbox = recipient
            .parse()
            .map_err(|e| NotifyError::Message(format!("invalid recipient '{recipient}': {e}")))?;
        builder = builder.to(mailbox);
    }

    builder
        .multipart(MultiPart::alternative_plain_html(
            render_text(updates, settings, now),
            render_html(updates, settings, now),
        ))
        .map_err(|e| NotifyError::Message(e.to_string()))
}

/// Send the update email over SMTP (implicit TLS on 465, STARTTLS otherwise).
///
/// # Errors
///
/// Returns an error if the message cannot be built or delivery fails.
pub async fn send_email(
    config: &EmailConfig,
    updates: &[UpdateEvent],
    settings: &NotifySettings,
) -> Result<(), NotifyError> {
    let message = build_message(config, updates, settings, Utc::now())?;

    let builder = if config.smtp_port == IMPLICIT_TLS_PORT {
        SmtpTransport::relay(&config.smtp_server)
    } else {
        SmtpTransport::starttls_relay(&config.smtp_server)
    }
    .map_err(|e| NotifyError::Transport(e.to_string()))?;

    let transport = builder
        .port(config.smtp_port)
        .credentials(Credentials::new(
            config.username.clone(),
            config.password.clone(),
        ))
        .timeout(Some(SMTP_TIMEOUT))
        .build();

    tracing::info!(to = ?config.to, server = %config.smtp_server, "Sending email");

    tokio::task::spawn_blocking(move || transport.send(&message))
        .await
        .map_err(|e| NotifyError::Transport(format!("send task failed: {e}")))?
        .map_err(|e| NotifyError::Transport(e.to_string()))?;

    Ok(())
}
