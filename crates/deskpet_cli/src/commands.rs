//! Terminal input parsing
//!
//! Anything that is not a slash command counts as typing.

use deskpet_expression::FrameObservation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A plain line: the user is typing
    Key,
    Pat,
    /// Report a smile directly, skipping the camera debounce
    Smile,
    /// Feed one synthetic camera frame
    Frame(FrameObservation),
    Chat(String),
    Stats,
    Quests,
    Unlocks,
    Unlock { category: String, name: String },
    ResetQuests,
    State,
    Help,
    Quit,
    Invalid(String),
}

pub const HELP: &str = "\
Type anything to count as keyboard activity. Commands:
  /pat                     pat the pet
  /smile                   pretend the camera saw a smile
  /frame face|smile|none   feed one camera frame
  /chat <message>          talk to the pet
  /stats  /quests  /unlocks
  /unlock <category> <name>
  /reset-quests
  /state
  /help  /quit";

pub fn parse(line: &str) -> Command {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Key;
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "pat" => Command::Pat,
        "smile" => Command::Smile,
        "frame" => match arg {
            "face" => Command::Frame(FrameObservation::face()),
            "smile" => Command::Frame(FrameObservation::smile()),
            "none" => Command::Frame(FrameObservation::none()),
            _ => Command::Invalid("usage: /frame face|smile|none".into()),
        },
        "chat" if !arg.is_empty() => Command::Chat(arg.to_string()),
        "chat" => Command::Invalid("usage: /chat <message>".into()),
        "stats" => Command::Stats,
        "quests" => Command::Quests,
        "unlocks" => Command::Unlocks,
        "unlock" => match arg.split_whitespace().collect::<Vec<_>>()[..] {
            [category, name] => Command::Unlock {
                category: category.to_string(),
                name: name.to_string(),
            },
            _ => Command::Invalid("usage: /unlock <category> <name>".into()),
        },
        "reset-quests" => Command::ResetQuests,
        "state" => Command::State,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Invalid(format!("unknown command /{other}, try /help")),
    }
}
