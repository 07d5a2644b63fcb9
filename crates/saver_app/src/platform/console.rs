//! Line commands read from stdin.

use std::io::{self, BufRead};
use std::sync::mpsc::Sender;
use std::thread;

use engine_logging::engine_warn;
use saver_core::Msg;

use super::app::AppInput;

pub(crate) const HELP: &str = "\
commands:
  add <name|url> [quality] [alias...]   track a channel (quality defaults to maximum)
  remove <name>                         stop tracking a channel
  edit <name> <quality> [alias...]      change quality and alias
  start | stop                          start or stop scanning and recording
  kill <pid>                            stop one recording
  scan                                  scan all channels now
  hide on|off                           hide finished recordings
  list                                  show channels and recordings
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Msg(Msg),
    List,
    Help,
    Quit,
}

pub(crate) fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();

    let command = match (verb.to_ascii_lowercase().as_str(), rest.as_slice()) {
        ("add", [input]) => Command::Msg(Msg::AddChannel {
            input: input.to_string(),
            alias: None,
            quality: "maximum".to_string(),
        }),
        ("add", [input, quality, alias @ ..]) => Command::Msg(Msg::AddChannel {
            input: input.to_string(),
            alias: join_alias(alias),
            quality: quality.to_string(),
        }),
        ("remove", [name]) => Command::Msg(Msg::RemoveChannel {
            name: name.to_string(),
        }),
        ("edit", [name, quality, alias @ ..]) => Command::Msg(Msg::EditChannel {
            name: name.to_string(),
            alias: join_alias(alias),
            quality: quality.to_string(),
        }),
        ("start", []) => Command::Msg(Msg::StartClicked),
        ("stop", []) => Command::Msg(Msg::StopClicked),
        ("kill", [pid]) => {
            let pid = pid
                .parse()
                .map_err(|_| format!("not a process id: {pid}"))?;
            Command::Msg(Msg::StopProcessClicked { pid })
        }
        ("scan", []) => Command::Msg(Msg::ScanNowClicked),
        ("hide", ["on"]) => Command::Msg(Msg::HideFinishedToggled(true)),
        ("hide", ["off"]) => Command::Msg(Msg::HideFinishedToggled(false)),
        ("list", []) => Command::List,
        ("help", []) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,
        _ => return Err(format!("unrecognized command: {}", line.trim())),
    };
    Ok(Some(command))
}

fn join_alias(words: &[&str]) -> Option<String> {
    (!words.is_empty()).then(|| words.join(" "))
}

/// Forwards parsed stdin lines to the app loop; EOF counts as `quit`.
pub(crate) fn spawn_reader(tx: Sender<AppInput>) -> io::Result<()> {
    thread::Builder::new()
        .name("console-reader".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        engine_warn!("Reading stdin failed: {err}");
                        break;
                    }
                };
                let input = match parse_command(&line) {
                    Ok(Some(command)) => AppInput::Command(command),
                    Ok(None) => continue,
                    Err(message) => AppInput::Invalid(message),
                };
                if tx.send(input).is_err() {
                    return;
                }
            }
            let _ = tx.send(AppInput::Command(Command::Quit));
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_takes_optional_quality_and_alias() {
        assert_eq!(
            parse_command("add @alpha"),
            Ok(Some(Command::Msg(Msg::AddChannel {
                input: "@alpha".to_string(),
                alias: None,
                quality: "maximum".to_string(),
            })))
        );
        assert_eq!(
            parse_command("add alpha 720p Alpha TV"),
            Ok(Some(Command::Msg(Msg::AddChannel {
                input: "alpha".to_string(),
                alias: Some("Alpha TV".to_string()),
                quality: "720p".to_string(),
            })))
        );
    }

    #[test]
    fn kill_requires_a_numeric_pid() {
        assert_eq!(
            parse_command("kill 42"),
            Ok(Some(Command::Msg(Msg::StopProcessClicked { pid: 42 })))
        );
        assert!(parse_command("kill abc").is_err());
    }

    #[test]
    fn blank_lines_are_ignored_and_unknown_ones_rejected() {
        assert_eq!(parse_command("   "), Ok(None));
        assert!(parse_command("dance").is_err());
        assert!(parse_command("start now").is_err());
        assert_eq!(parse_command("QUIT"), Ok(Some(Command::Quit)));
    }
}
