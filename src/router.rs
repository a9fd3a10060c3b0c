//! Routing of inbound chat traffic: command parsing and upload classification.

/// Role an uploaded file plays in a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Identities,
    Targets,
    Proxies,
}

impl FileRole {
    pub fn label(self) -> &'static str {
        match self {
            FileRole::Identities => "Emails",
            FileRole::Targets => "Events",
            FileRole::Proxies => "Proxies",
        }
    }
}

/// Classifies uploads by filename keywords.
pub struct FileRoleRouter;

impl FileRoleRouter {
    /// Keyword table, checked in order; the first hit wins.
    const KEYWORDS: &'static [(&'static str, FileRole)] = &[
        ("email", FileRole::Identities),
        ("event", FileRole::Targets),
        ("list", FileRole::Targets),
        ("proxy", FileRole::Proxies),
        ("proxies", FileRole::Proxies),
    ];

    pub fn classify(file_name: &str) -> Option<FileRole> {
        let lower = file_name.to_lowercase();
        Self::KEYWORDS
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|&(_, role)| role)
    }
}

/// A parsed control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Start,
    Help,
    Setup,
    /// `/workers` with its raw arguments; validation happens at dispatch.
    Workers(Vec<String>),
    Config,
    Register,
    Stop,
    Status,
    Results,
    Stats,
    Unknown(String),
}

impl ChatCommand {
    /// Parse a trimmed text line. `/cmd@BotName` addresses the same command.
    pub fn parse(text: &str) -> Self {
        let mut parts = text.split_whitespace();
        let head = parts.next().unwrap_or_default();
        let name = head.split('@').next().unwrap_or(head).to_lowercase();
        let args: Vec<String> = parts.map(str::to_string).collect();

        match name.as_str() {
            "/start" => ChatCommand::Start,
            "/help" => ChatCommand::Help,
            "/setup" => ChatCommand::Setup,
            "/workers" => ChatCommand::Workers(args),
            "/config" => ChatCommand::Config,
            "/register" => ChatCommand::Register,
            "/stop" => ChatCommand::Stop,
            "/status" => ChatCommand::Status,
            "/results" => ChatCommand::Results,
            "/stats" => ChatCommand::Stats,
            _ => ChatCommand::Unknown(text.to_string()),
        }
    }
}
