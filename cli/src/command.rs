use std::path::PathBuf;

use chat_composer::split_selected_paths;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Append a line of text to the draft.
    Text(String),
    Attach(Vec<PathBuf>),
    /// 1-based position, as shown by `/list`.
    Remove(usize),
    Clear,
    List,
    Send,
    Agent(String),
    Team(String),
    Help,
    Quit,
}

pub const HELP: &str = "\
Type text to add it to the draft. Commands:
  /attach <path>...   stage image files (jpeg, png, gif, webp; up to 5, 10MB each)
  /remove <n>         remove attachment n
  /clear              remove all attachments
  /list               show the draft
  /send               send the draft (an empty line does the same)
  /agent <id>         address the next message to an agent
  /team <id>          address the next message to a team
  /quit               exit";

/// Parse one line of input. Lines not starting with `/` are draft text.
pub fn parse_command(line: &str) -> Result<Command, String> {
    if line.trim().is_empty() {
        return Ok(Command::Send);
    }
    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return Ok(Command::Text(line.to_string()));
    };
    let (name, args) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(name, args)| (name, args.trim()));

    match name {
        "attach" => {
            let paths =
                split_selected_paths(args).ok_or_else(|| "unbalanced quotes in path".to_string())?;
            if paths.is_empty() {
                return Err("usage: /attach <path>...".to_string());
            }
            Ok(Command::Attach(paths))
        }
        "remove" => match args.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(Command::Remove(n)),
            _ => Err("usage: /remove <n> (n starts at 1)".to_string()),
        },
        "clear" => Ok(Command::Clear),
        "list" => Ok(Command::List),
        "send" => Ok(Command::Send),
        "agent" if !args.is_empty() => Ok(Command::Agent(args.to_string())),
        "team" if !args.is_empty() => Ok(Command::Team(args.to_string())),
        "agent" | "team" => Err(format!("usage: /{name} <id>")),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        // `//text` escapes a leading slash.
        _ if name.starts_with('/') => Ok(Command::Text(rest.to_string())),
        _ => Err(format!("unknown command: /{name} (try /help)")),
    }
}
