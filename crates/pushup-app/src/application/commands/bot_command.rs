use once_cell::sync::Lazy;
use regex::Regex;

/// `/name`, optional `@botname`, optional arguments that may span lines
static COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^/([A-Za-z_]+)(?:@[A-Za-z0-9_]+)?(?:\s+(.*))?$").expect("Invalid command pattern")
});

/// Chat commands the bot answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    MyStats,
    Stats,
    /// `None` when the argument is missing or not a non-negative integer
    ChangeMyDailyStats(Option<u32>),
    SetGroup,
    Config,
    AdminStats,
}

impl BotCommand {
    /// Recognize a command; anything else (including unknown commands) is `None`
    pub fn parse(text: &str) -> Option<Self> {
        let caps = COMMAND.captures(text.trim())?;
        let name = caps.get(1)?.as_str().to_lowercase();
        let args: Vec<&str> = caps
            .get(2)
            .map(|m| m.as_str().split_whitespace().collect())
            .unwrap_or_default();

        let command = match name.as_str() {
            "start" => BotCommand::Start,
            "help" => BotCommand::Help,
            "mystats" => BotCommand::MyStats,
            "stats" => BotCommand::Stats,
            "changemydailystats" => BotCommand::ChangeMyDailyStats(parse_count(args.first())),
            "setgroup" => BotCommand::SetGroup,
            "config" => BotCommand::Config,
            "adminstats" => BotCommand::AdminStats,
            _ => return None,
        };
        Some(command)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BotCommand::Start => "start",
            BotCommand::Help => "help",
            BotCommand::MyStats => "mystats",
            BotCommand::Stats => "stats",
            BotCommand::ChangeMyDailyStats(_) => "changemydailystats",
            BotCommand::SetGroup => "setgroup",
            BotCommand::Config => "config",
            BotCommand::AdminStats => "adminstats",
        }
    }
}

/// Digits only, so signs and decimals are rejected
fn parse_count(arg: Option<&&str>) -> Option<u32> {
    let arg = arg?;
    if arg.is_empty() || !arg.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    arg.parse().ok()
}
