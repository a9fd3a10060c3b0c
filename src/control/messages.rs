//! HTML reply bodies for the chat control plane.

use std::path::Path;
use std::time::Duration;

use crate::campaign::{RegistrationResult, RegistrationStatus};
use crate::report::{CampaignSummary, truncate_chars};
use crate::telegram::escape_html;

use super::session::{UserSession, WizardState};

pub const UNKNOWN_COMMAND: &str = "❌ Unknown command. Send /help for available commands.";
pub const SETUP_REQUIRED: &str = "❌ Please run /setup first to configure your details";
pub const ALREADY_RUNNING: &str = "⚠️ Campaign already running!\n\nSend /stop first";
pub const NOT_RUNNING: &str = "⏸️ No campaign running";
pub const STOP_REQUESTED: &str = "⏹️ Campaign stop requested\n\nWaiting for current tasks...";
pub const NO_RESULTS: &str = "📭 No results yet\n\nRun /register first";
pub const WORKERS_USAGE: &str = "❌ Usage: /workers &lt;number&gt;\nExample: <code>/workers 50</code>";
pub const UNKNOWN_FILE: &str = "❌ Unknown file type. Please name your file:\n\
    • emails.txt\n\
    • events.txt or list.txt\n\
    • proxies.txt";

fn round_secs(d: Duration) -> String {
    let secs = d.as_secs_f64().round() as u64;
    let (h, m, s) = (secs / 3600, secs / 60 % 60, secs % 60);
    match (h, m) {
        (0, 0) => format!("{s}s"),
        (0, _) => format!("{m}m{s}s"),
        _ => format!("{h}h{m}m{s}s"),
    }
}

pub fn welcome(chat_id: i64) -> String {
    format!(
        "👋 <b>Welcome to EventBlast Bot!</b>\n\n\
         🎫 Automated event registration system\n\
         🤖 Your Chat ID: <code>{chat_id}</code>\n\n\
         <b>Quick Start:</b>\n\
         1. /setup - Configure your details\n\
         2. Upload files (emails.txt, events.txt)\n\
         3. /workers 20 - Set worker count (optional)\n\
         4. /register - Start campaign\n\n\
         Send /help for all commands"
    )
}

pub fn help() -> &'static str {
    "<b>📋 Available Commands</b>\n\n\
     <b>Setup:</b>\n\
     /setup - Configure first name, last name, organization\n\
     /workers [number] - Set max concurrent workers\n\
     /config - View current configuration\n\n\
     <b>Campaign Control:</b>\n\
     /register - Start registration campaign\n\
     /stop - Stop running campaign\n\
     /status - Check campaign status\n\n\
     <b>Information:</b>\n\
     /results - View campaign results\n\
     /stats - Show statistics\n\n\
     <b>File Upload:</b>\n\
     Send files named:\n\
     • <code>emails.txt</code> - Email list\n\
     • <code>events.txt</code> or <code>list.txt</code> - Event URLs\n\
     • <code>proxies.txt</code> - Proxies (optional)\n\n\
     <b>System:</b>\n\
     /help - Show this help\n\
     /start - Welcome message"
}

pub fn setup_started() -> &'static str {
    "<b>⚙️ Setup Wizard</b>\n\n\
     Let's configure your registration campaign.\n\n\
     <b>Step 1/3:</b> Please enter your <b>First Name</b>:"
}

/// Prompt after a stored value; `next` is the step now awaited.
pub fn wizard_step(session: &UserSession, next: WizardState) -> String {
    match next {
        WizardState::AwaitingLastName => format!(
            "✅ First Name: <b>{}</b>\n\n<b>Step 2/3:</b> Please enter your <b>Last Name</b>:",
            escape_html(&session.fields.first_name)
        ),
        WizardState::AwaitingOrganization => format!(
            "✅ Last Name: <b>{}</b>\n\n<b>Step 3/3:</b> Please enter your <b>Organization Name</b>:",
            escape_html(&session.fields.last_name)
        ),
        WizardState::AwaitingFirstName | WizardState::Idle => setup_started().to_string(),
    }
}

pub fn wizard_rejected(state: WizardState) -> String {
    let field = match state {
        WizardState::AwaitingLastName => "Last Name",
        WizardState::AwaitingOrganization => "Organization Name",
        WizardState::AwaitingFirstName | WizardState::Idle => "First Name",
    };
    format!("❌ Value cannot be empty. Please enter your <b>{field}</b>:")
}

pub fn setup_complete(session: &UserSession) -> String {
    let f = &session.fields;
    format!(
        "✅ Organization: <b>{org}</b>\n\n\
         <b>🎉 Setup Complete!</b>\n\n\
         <b>Your Configuration:</b>\n\
         • First Name: <b>{first}</b>\n\
         • Last Name: <b>{last}</b>\n\
         • Organization: <b>{org}</b>\n\
         • Workers: <b>{workers}</b>\n\n\
         <b>Next Steps:</b>\n\
         1. Upload files (emails.txt, events.txt)\n\
         2. Optional: /workers &lt;number&gt; to change workers\n\
         3. /register to start campaign",
        org = escape_html(&f.organization),
        first = escape_html(&f.first_name),
        last = escape_html(&f.last_name),
        workers = session.concurrency,
    )
}

pub fn workers_current(current: usize, max: usize) -> String {
    format!(
        "<b>⚙️ Worker Configuration</b>\n\n\
         Current: <b>{current} workers</b>\n\n\
         <b>Usage:</b> /workers &lt;number&gt;\n\
         Example: <code>/workers 50</code>\n\n\
         Allowed range: 1-{max}"
    )
}

pub fn workers_out_of_range(max: usize) -> String {
    format!("❌ Please provide a number between 1 and {max}")
}

pub fn workers_updated(workers: usize) -> String {
    format!("✅ <b>Workers updated!</b>\n\nMax Workers: <b>{workers}</b>")
}

pub fn config(session: &UserSession, max_attempts: u32) -> String {
    let f = &session.fields;
    let or_unset = |v: &str| {
        if v.is_empty() {
            "<i>not set</i>".to_string()
        } else {
            format!("<b>{}</b>", escape_html(v))
        }
    };
    format!(
        "<b>⚙️ Your Configuration</b>\n\n\
         <b>Personal Details:</b>\n\
         • First Name: {}\n\
         • Last Name: {}\n\
         • Organization: {}\n\n\
         <b>Files:</b>\n\
         • Emails: <code>{}</code>\n\
         • Events: <code>{}</code>\n\
         • Proxies: <code>{}</code>\n\n\
         <b>Performance:</b>\n\
         • Max Workers: <b>{}</b>\n\
         • Retry Attempts: {}\n\n\
         Send /setup or /workers to change",
        or_unset(&f.first_name),
        or_unset(&f.last_name),
        or_unset(&f.organization),
        escape_html(&session.identities_path.display().to_string()),
        escape_html(&session.targets_path.display().to_string()),
        escape_html(&session.proxies_path.display().to_string()),
        session.concurrency,
        max_attempts,
    )
}

pub fn load_failed(label: &str, path: &Path, reason: &str) -> String {
    format!(
        "❌ Failed to load {} from <code>{}</code>\n{}\n\nPlease upload {}.txt",
        label.to_lowercase(),
        escape_html(&path.display().to_string()),
        escape_html(reason),
        label.to_lowercase(),
    )
}

pub struct LaunchInfo<'a> {
    pub session: &'a UserSession,
    pub identities: usize,
    pub targets: usize,
    pub proxies: usize,
}

pub fn campaign_started(info: &LaunchInfo<'_>) -> String {
    let f = &info.session.fields;
    format!(
        "🚀 <b>Campaign Started!</b>\n\n\
         👤 Name: <b>{} {}</b>\n\
         🏢 Organization: <b>{}</b>\n\
         ⚙️ Workers: <b>{}</b>\n\n\
         📧 Emails: {}\n\
         🎫 Events: {}\n\
         🔄 Total tasks: {}\n\
         🌐 Proxies: {}\n\n\
         Use /status to check progress",
        escape_html(&f.first_name),
        escape_html(&f.last_name),
        escape_html(&f.organization),
        info.session.concurrency,
        info.identities,
        info.targets,
        info.identities * info.targets,
        info.proxies,
    )
}

pub fn campaign_completed(summary: &CampaignSummary, results_file: Option<&Path>) -> String {
    let mut msg = format!(
        "✅ <b>Campaign Completed!</b>\n\n\
         ━━━━━━━━━━━━━━━━━━━━\n\
         📊 Total: {}\n\
         ✅ Successful: {}\n\
         ❌ Failed: {}\n\
         📈 Success Rate: {:.1}%\n\
         ⏱️ Duration: {}\n\
         ⚡ Rate: {:.1} tasks/sec\n\
         ━━━━━━━━━━━━━━━━━━━━\n\n",
        summary.total,
        summary.succeeded,
        summary.failed,
        summary.success_rate(),
        round_secs(summary.duration),
        summary.rate_per_sec(),
    );
    if let Some(path) = results_file {
        msg.push_str(&format!(
            "💾 Saved to <code>{}</code>\n",
            escape_html(&path.display().to_string())
        ));
    }
    msg.push_str("Send /results for details");
    msg
}

pub fn status_running(elapsed: Duration, completed: usize, succeeded: usize, total: usize) -> String {
    format!(
        "🚀 <b>Campaign Running</b>\n\n\
         ⏱️ Duration: {}\n\
         📊 Completed: {completed}/{total}\n\
         ✅ Successful: {succeeded}\n\
         ❌ Failed: {}",
        round_secs(elapsed),
        completed.saturating_sub(succeeded),
    )
}

pub fn status_idle() -> &'static str {
    "⏸️ No campaign running\n\nSend /register to start"
}

/// The last `limit` results, oldest first.
pub fn recent_results(results: &[RegistrationResult], limit: usize) -> String {
    let tail = &results[results.len().saturating_sub(limit)..];
    let mut msg = format!("<b>📊 Last {} Results</b>\n\n", tail.len());
    for r in tail {
        let icon = match r.status {
            RegistrationStatus::Success => "✅",
            RegistrationStatus::Failed => "❌",
        };
        msg.push_str(&format!(
            "{icon} <code>{}</code>\n   Event: {}\n   {}\n\n",
            escape_html(&truncate_chars(&r.identity, 30)),
            escape_html(&r.target),
            escape_html(&r.message),
        ));
    }
    msg
}

pub struct Stats {
    pub running: bool,
    pub identities: usize,
    pub targets: usize,
    pub proxies: usize,
    pub concurrency: usize,
    pub cached_results: usize,
    pub sessions: usize,
    pub chat_id: i64,
}

pub fn stats(s: &Stats) -> String {
    let status = if s.running { "🚀 Running" } else { "⏸️ Idle" };
    format!(
        "<b>📊 System Statistics</b>\n\n\
         <b>Status:</b> {status}\n\n\
         <b>Configuration:</b>\n\
         📧 Emails loaded: {}\n\
         🎫 Events loaded: {}\n\
         🌐 Proxies loaded: {}\n\
         👥 Max workers: {}\n\n\
         <b>Campaign:</b>\n\
         📝 Results cached: {}\n\
         👥 Active sessions: {}\n\
         🆔 Your Chat ID: <code>{}</code>",
        s.identities, s.targets, s.proxies, s.concurrency, s.cached_results, s.sessions, s.chat_id,
    )
}

pub fn upload_saved(label: &str, dest: &Path, entries: usize) -> String {
    format!(
        "✅ {label} file uploaded successfully!\n\n\
         File: <code>{}</code>\n\
         Entries: {entries}",
        escape_html(&dest.display().to_string()),
    )
}

pub fn upload_failed(reason: &str) -> String {
    format!("❌ Failed to download file: {}", escape_html(reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::Job;

    #[test]
    fn round_secs_formats() {
        assert_eq!(round_secs(Duration::from_millis(4_400)), "4s");
        assert_eq!(round_secs(Duration::from_secs(125)), "2m5s");
        assert_eq!(round_secs(Duration::from_secs(3_725)), "1h2m5s");
    }

    #[test]
    fn recent_results_keeps_last_ten() {
        let results: Vec<_> = (0..15)
            .map(|i| {
                RegistrationResult::failed(&Job::new("https://x.com/e", format!("u{i}@x.com"), 0), 3, "boom".into())
            })
            .collect();
        let msg = recent_results(&results, 10);
        assert!(msg.starts_with("<b>📊 Last 10 Results</b>"));
        assert!(!msg.contains("u4@x.com"));
        assert!(msg.contains("u5@x.com"));
        assert!(msg.contains("u14@x.com"));
        assert_eq!(msg.matches('❌').count(), 10);
    }

    #[test]
    fn setup_complete_escapes_user_values() {
        let mut session = UserSession::new(1, Path::new("data"), 20);
        session.fields.first_name = "<Ada>".into();
        session.fields.last_name = "L".into();
        session.fields.organization = "A&B".into();
        let msg = setup_complete(&session);
        assert!(msg.contains("&lt;Ada&gt;"));
        assert!(msg.contains("A&amp;B"));
        assert!(msg.contains("Workers: <b>20</b>"));
    }

    #[test]
    fn completion_mentions_results_file() {
        let summary = CampaignSummary {
            total: 4,
            succeeded: 3,
            failed: 1,
            duration: Duration::from_secs(2),
        };
        let msg = campaign_completed(&summary, Some(Path::new("results/results_1.json")));
        assert!(msg.contains("📊 Total: 4"));
        assert!(msg.contains("Success Rate: 75.0%"));
        assert!(msg.contains("Rate: 2.0 tasks/sec"));
        assert!(msg.contains("results/results_1.json"));
    }

    #[test]
    fn status_running_counts_failures() {
        let msg = status_running(Duration::from_secs(3), 5, 3, 10);
        assert!(msg.contains("Completed: 5/10"));
        assert!(msg.contains("Failed: 2"));
    }
}
