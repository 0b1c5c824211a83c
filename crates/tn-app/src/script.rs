//! Line-oriented command scripts driving a navigator session

use anyhow::{anyhow, bail, Context, Result};

/// One scripted user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start { level: String, value: String, label: Option<String> },
    Forward(String),
    Back,
    Toggle(String),
    Remove { level: usize, value: String },
    Show,
}

/// Parse one script line. Blank lines and `#` comments yield `None`.
///
/// Taxon names may contain spaces ("Quercus robur"), so the last argument
/// of each command takes the rest of the line.
pub fn parse_line(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (verb, rest) = split_word(line);
    let command = match verb {
        "start" => {
            let (level, rest) = split_word(rest);
            let (value, label) = split_word(rest);
            if level.is_empty() || value.is_empty() {
                bail!("usage: start <rank> <value> [label]");
            }
            Command::Start {
                level: level.to_string(),
                value: value.to_string(),
                label: (!label.is_empty()).then(|| label.to_string()),
            }
        }
        "forward" => Command::Forward(required(rest, "forward <value>")?),
        "toggle" => Command::Toggle(required(rest, "toggle <value>")?),
        "remove" => {
            let (level, value) = split_word(rest);
            let level = level
                .parse::<usize>()
                .with_context(|| format!("invalid level index '{}'", level))?;
            Command::Remove {
                level,
                value: required(value, "remove <levelIndex> <value>")?,
            }
        }
        "back" => Command::Back,
        "show" => Command::Show,
        other => return Err(anyhow!("unknown command '{}'", other)),
    };

    Ok(Some(command))
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    }
}

fn required(rest: &str, usage: &str) -> Result<String> {
    let rest = rest.trim();
    if rest.is_empty() {
        bail!("usage: {}", usage);
    }
    Ok(rest.to_string())
}
