use super::CommandResult;
use crate::core::app::App;

pub type CommandHandler = fn(&mut App, CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub input: &'a str,
    pub args: &'a str,
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

/// Commands whose name starts with `prefix`, for completion hints.
pub fn matching_commands(prefix: &str) -> Vec<&'static Command> {
    let prefix = prefix.to_ascii_lowercase();
    all_commands()
        .iter()
        .filter(|command| command.name.starts_with(&prefix))
        .collect()
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "/help",
        help: "Show available commands.",
        handler: super::handle_help,
    },
    Command {
        name: "new",
        usage: "/new",
        help: "Start a new session.",
        handler: super::handle_new,
    },
    Command {
        name: "list",
        usage: "/list",
        help: "List sessions, newest first.",
        handler: super::handle_list,
    },
    Command {
        name: "open",
        usage: "/open <n>",
        help: "Switch to session number n from /list.",
        handler: super::handle_open,
    },
    Command {
        name: "rename",
        usage: "/rename <title>",
        help: "Rename the active session.",
        handler: super::handle_rename,
    },
    Command {
        name: "delete",
        usage: "/delete [n]",
        help: "Delete session n, or the active session.",
        handler: super::handle_delete,
    },
    Command {
        name: "image",
        usage: "/image <path>",
        help: "Attach an image to the next message.",
        handler: super::handle_image,
    },
    Command {
        name: "noimage",
        usage: "/noimage",
        help: "Remove the attached image.",
        handler: super::handle_noimage,
    },
    Command {
        name: "style",
        usage: "/style [professional|friendly|concise]",
        help: "Show or set the response style.",
        handler: super::handle_style,
    },
    Command {
        name: "model",
        usage: "/model [name]",
        help: "Show or set the chat model.",
        handler: super::handle_model,
    },
    Command {
        name: "theme",
        usage: "/theme [light|dark]",
        help: "Toggle or set the theme.",
        handler: super::handle_theme,
    },
    Command {
        name: "font",
        usage: "/font [small|medium|large]",
        help: "Show or set the font size.",
        handler: super::handle_font,
    },
    Command {
        name: "reader",
        usage: "/reader",
        help: "Toggle screen reader mode.",
        handler: super::handle_reader,
    },
    Command {
        name: "voice",
        usage: "/voice",
        help: "Start or stop voice input.",
        handler: super::handle_voice,
    },
    Command {
        name: "key",
        usage: "/key [<api-key>|clear]",
        help: "Show, set or forget the API key.",
        handler: super::handle_key,
    },
    Command {
        name: "status",
        usage: "/status",
        help: "Show connection, model and latency.",
        handler: super::handle_status,
    },
    Command {
        name: "health",
        usage: "/health",
        help: "Probe the API now.",
        handler: super::handle_health,
    },
    Command {
        name: "log",
        usage: "/log [filename]",
        help: "Toggle transcript logging or set the log file.",
        handler: super::handle_log,
    },
    Command {
        name: "quit",
        usage: "/quit",
        help: "Leave the chat.",
        handler: super::handle_quit,
    },
];
