//! Line-oriented front end. One command per line, output written after each.

use std::io::{self, BufRead, Write};

use thiserror::Error;
use tracing::debug;

use crate::{
    app::{Action, App},
    document::{DocumentId, store::KeyValueBackend},
    editor::commands::{Position, Selection},
    ui::toolbar::Affordance,
};

const HELP: &str = "\
formatting: bold italic strike h1 h2 h3 bullet ordered left center right
colour:     palette (toggle), color N (pick swatch 1-3), dismiss
editing:    type TEXT, enter, select BLOCK:OFFSET [BLOCK:OFFSET], all
documents:  save, cancel, list, load ID, delete ID
views:      html, json, toolbar, status
            help, quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Act(Action),
    List,
    Html,
    Json,
    Toolbar,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command `{0}`, try `help`")]
    Unknown(String),

    #[error("`{command}` needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },

    #[error("invalid {what}: `{value}`")]
    Invalid { what: &'static str, value: String },
}

impl Command {
    /// Parses one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest),
            None => (trimmed, ""),
        };
        let arg = rest.trim();

        let command = match word.to_ascii_lowercase().as_str() {
            "type" => {
                if rest.is_empty() {
                    return Err(ParseError::MissingArgument {
                        command: "type",
                        what: "some text",
                    });
                }
                Self::Act(Action::Type(rest.to_string()))
            }
            "palette" => Self::Act(Action::Format(Affordance::ApplyColor)),
            "color" | "colour" if !arg.is_empty() => Self::Act(Action::PickColor(parse_swatch(arg)?)),
            "dismiss" => Self::Act(Action::DismissPalette),
            "enter" => Self::Act(Action::Enter),
            "select" => Self::Act(Action::Select(parse_selection(arg)?)),
            "all" => Self::Act(Action::SelectAll),
            "save" => Self::Act(Action::Save),
            "cancel" => Self::Act(Action::Cancel),
            "load" => Self::Act(Action::Load(required_id("load", arg)?)),
            "delete" => Self::Act(Action::Delete(required_id("delete", arg)?)),
            "list" => Self::List,
            "html" => Self::Html,
            "json" => Self::Json,
            "toolbar" => Self::Toolbar,
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => match Affordance::from_id(other) {
                Some(affordance) => Self::Act(Action::Format(affordance)),
                None => return Err(ParseError::Unknown(other.to_string())),
            },
        };
        Ok(Some(command))
    }
}

fn parse_swatch(arg: &str) -> Result<usize, ParseError> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(ParseError::Invalid {
            what: "swatch number",
            value: arg.to_string(),
        }),
    }
}

fn parse_position(token: &str) -> Result<Position, ParseError> {
    let invalid = || ParseError::Invalid {
        what: "position",
        value: token.to_string(),
    };
    let (block, offset) = token.split_once(':').unwrap_or((token, "0"));
    let block = block.parse().map_err(|_| invalid())?;
    let offset = offset.parse().map_err(|_| invalid())?;
    Ok(Position::new(block, offset))
}

fn parse_selection(arg: &str) -> Result<Selection, ParseError> {
    let mut tokens = arg.split_whitespace();
    let Some(first) = tokens.next() else {
        return Err(ParseError::MissingArgument {
            command: "select",
            what: "a position like 0:3",
        });
    };
    let anchor = parse_position(first)?;
    let head = match tokens.next() {
        Some(token) => parse_position(token)?,
        None => anchor,
    };
    Ok(Selection::range(anchor, head))
}

fn required_id(command: &'static str, arg: &str) -> Result<DocumentId, ParseError> {
    if arg.is_empty() {
        return Err(ParseError::MissingArgument {
            command,
            what: "a document id",
        });
    }
    Ok(DocumentId::new(arg))
}

/// Reads commands from `input` until end of input or `quit`.
pub fn run<B, R, W>(app: &mut App<B>, input: R, output: &mut W) -> io::Result<()>
where
    B: KeyValueBackend,
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line?;
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(error) => {
                writeln!(output, "error: {error}")?;
                continue;
            }
        };
        debug!(?command, "shell command");
        if command == Command::Quit {
            break;
        }
        execute(app, command, output)?;
    }
    output.flush()
}

fn execute<B, W>(app: &mut App<B>, command: Command, output: &mut W) -> io::Result<()>
where
    B: KeyValueBackend,
    W: Write,
{
    match command {
        Command::Act(action) => {
            let missing = match &action {
                Action::Load(id) | Action::Delete(id) => app.session().document(id).is_none().then(|| id.clone()),
                _ => None,
            };
            let applied = app.handle(action);
            for toast in app.toasts_mut().drain() {
                writeln!(output, "[{}] {}: {}", toast.level.tag(), toast.title, toast.body)?;
            }
            if let Some(id) = missing {
                writeln!(output, "no document with id {id}")?;
            } else if !applied {
                writeln!(output, "(unchanged)")?;
            }
        }
        Command::List => {
            let list = app.saved_list();
            if list.is_visible() {
                write!(output, "{list}")?;
            } else {
                writeln!(output, "no saved documents")?;
            }
        }
        Command::Html => writeln!(output, "{}", app.preview().html)?,
        Command::Json => writeln!(output, "{}", app.preview().json)?,
        Command::Toolbar => writeln!(output, "{}", app.preview().toolbar)?,
        Command::Status => {
            let mode = match app.session().editing_target() {
                Some(id) => format!("editing {id}"),
                None => "composing".to_string(),
            };
            let palette = if app.picker().is_open() { "open" } else { "closed" };
            writeln!(
                output,
                "{mode} | button: {} | cancel: {} | palette: {palette}",
                app.save_label(),
                if app.cancel_visible() { "shown" } else { "hidden" },
            )?;
        }
        Command::Help => writeln!(output, "{HELP}")?,
        Command::Quit => {}
    }
    Ok(())
}
