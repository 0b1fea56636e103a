mod bot_command;

pub use bot_command::BotCommand;
