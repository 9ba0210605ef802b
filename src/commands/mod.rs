mod registry;

pub use registry::{all_commands, matching_commands, CommandInvocation};

use std::path::PathBuf;

use crate::core::app::{App, NoticeLevel, VoiceToggle};
use crate::core::config::{FontSize, Theme};
use crate::core::style::StyleProfile;

/// What the chat loop should do after a line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    /// The active session changed; redraw its messages.
    ShowTranscript,
    /// Validate and store this key (needs the network).
    SetCredential(String),
    CheckHealth,
    /// Voice capture produced text for the user to review before sending.
    Dictated(String),
    Quit,
}

pub fn process_input(app: &mut App, input: &str) -> CommandResult {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return CommandResult::ProcessAsMessage(input.to_string());
    }

    let mut parts = trimmed[1..].splitn(2, ' ');
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    if let Some(command) = registry::find_command(command_name) {
        let invocation = CommandInvocation {
            input: trimmed,
            args,
        };
        (command.handler)(app, invocation)
    } else {
        CommandResult::ProcessAsMessage(input.to_string())
    }
}

fn info(app: &mut App, text: impl Into<String>) -> CommandResult {
    app.notify(NoticeLevel::Info, text);
    CommandResult::Continue
}

fn error(app: &mut App, text: impl Into<String>) -> CommandResult {
    app.notify(NoticeLevel::Error, text);
    CommandResult::Continue
}

/// Parse a one-based session number from `/list`.
fn session_index(args: &str) -> Option<usize> {
    args.parse::<usize>().ok().filter(|n| *n > 0).map(|n| n - 1)
}

pub(super) fn handle_help(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let mut help = String::from("Commands:");
    for command in all_commands() {
        help.push_str(&format!("\n  {:<40} {}", command.usage, command.help));
    }
    info(app, help)
}

pub(super) fn handle_new(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    match app.new_session() {
        Ok(_) => CommandResult::ShowTranscript,
        Err(err) => error(app, format!("Could not create session: {err}")),
    }
}

pub(super) fn handle_list(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let active = app.active_index();
    let mut listing = String::from("Sessions:");
    for (index, session) in app.sessions().iter().enumerate() {
        let marker = if Some(index) == active { '*' } else { ' ' };
        listing.push_str(&format!(
            "\n{marker} {:>2}. {} | {} | {}",
            index + 1,
            session.display_title(),
            session.created_at.format("%Y-%m-%d %H:%M"),
            session.preview.replace('\n', " ")
        ));
    }
    info(app, listing)
}

pub(super) fn handle_open(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let Some(index) = session_index(invocation.args) else {
        return error(app, "Usage: /open <n>");
    };
    match app.select_session_at(index) {
        Ok(_) => CommandResult::ShowTranscript,
        Err(_) => error(app, format!("No session #{}", index + 1)),
    }
}

pub(super) fn handle_rename(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    match app.rename_active_session(invocation.args) {
        Ok(true) => info(app, format!("Session renamed: {}", invocation.args)),
        Ok(false) => error(app, "Usage: /rename <title>"),
        Err(err) => error(app, format!("Rename failed: {err}")),
    }
}

pub(super) fn handle_delete(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let result = if invocation.args.is_empty() {
        match app.active_index() {
            Some(index) => app.delete_session_at(index),
            None => return error(app, "No active session"),
        }
    } else {
        match session_index(invocation.args) {
            Some(index) => app.delete_session_at(index),
            None => return error(app, "Usage: /delete [n]"),
        }
    };

    match result {
        Ok(()) => {
            app.notify(NoticeLevel::Info, "Session deleted");
            CommandResult::ShowTranscript
        }
        Err(err) => error(app, format!("Delete failed: {err}")),
    }
}

pub(super) fn handle_image(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        return error(app, "Usage: /image <path>");
    }
    let path = PathBuf::from(invocation.args);
    match app.attach_image(&path) {
        Ok(image) => {
            let text = format!(
                "Image attached: {} ({}, ~{} KB)",
                path.display(),
                image.mime_type,
                image.approximate_size().div_ceil(1024)
            );
            info(app, text)
        }
        Err(err) => error(app, err.to_string()),
    }
}

pub(super) fn handle_noimage(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    if app.remove_image() {
        info(app, "Image removed")
    } else {
        info(app, "No image attached")
    }
}

pub(super) fn handle_style(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        let current = app.style();
        let names: Vec<&str> = StyleProfile::ALL.iter().map(|style| style.id()).collect();
        return info(
            app,
            format!("Style: {} (available: {})", current.id(), names.join(", ")),
        );
    }
    let style = match invocation.args.parse::<StyleProfile>() {
        Ok(style) => style,
        Err(err) => return error(app, err),
    };
    match app.set_style(style) {
        Ok(()) => info(app, format!("Style set: {}", style.display_name())),
        Err(err) => error(app, format!("Style set: {} (unsaved: {err})", style.display_name())),
    }
}

pub(super) fn handle_model(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        let current = app.gateway().model();
        let vision = app.gateway().vision_model().to_string();
        return info(app, format!("Model: {current} (images use {vision})"));
    }
    match app.set_model(invocation.args) {
        Ok(()) => info(app, format!("Model set: {}", invocation.args)),
        Err(err) => error(app, format!("Model set: {} (unsaved: {err})", invocation.args)),
    }
}

pub(super) fn handle_theme(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let result = if invocation.args.is_empty() {
        app.toggle_theme()
    } else {
        match invocation.args.parse::<Theme>() {
            Ok(theme) => app.set_theme(theme).map(|()| theme),
            Err(err) => return error(app, err),
        }
    };
    match result {
        Ok(theme) => info(app, format!("Theme set: {theme}")),
        Err(err) => error(app, format!("Theme error: {err}")),
    }
}

pub(super) fn handle_font(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    if invocation.args.is_empty() {
        let size = app.preferences().font_size;
        return info(app, format!("Font size: {size} ({}px)", size.pixels()));
    }
    let size = match invocation.args.parse::<FontSize>() {
        Ok(size) => size,
        Err(err) => return error(app, err),
    };
    match app.set_font_size(size) {
        Ok(()) => info(app, format!("Font size set: {size}")),
        Err(err) => error(app, format!("Font size error: {err}")),
    }
}

pub(super) fn handle_reader(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    match app.toggle_screen_reader() {
        Ok(true) => info(app, "Screen reader mode on"),
        Ok(false) => info(app, "Screen reader mode off"),
        Err(err) => error(app, format!("Screen reader error: {err}")),
    }
}

pub(super) fn handle_voice(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    match app.toggle_voice() {
        Ok(VoiceToggle::Started) => info(app, "Listening... run /voice again to stop"),
        Ok(VoiceToggle::Stopped(Some(text))) => CommandResult::Dictated(text),
        Ok(VoiceToggle::Stopped(None)) => info(app, "Voice input stopped"),
        Err(err) => error(app, err.to_string()),
    }
}

pub(super) fn handle_key(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    match invocation.args {
        "" => {
            let state = if app.has_credential() {
                "configured"
            } else {
                "not configured"
            };
            info(app, format!("API key {state}"))
        }
        "clear" => match app.clear_credential() {
            Ok(true) => info(app, "API key removed"),
            Ok(false) => info(app, "No stored API key"),
            Err(err) => error(app, format!("Could not remove API key: {err}")),
        },
        key => CommandResult::SetCredential(key.to_string()),
    }
}

pub(super) fn handle_status(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let mut text = app.status().summary();
    if app.is_generating_title() {
        text.push_str(" | generating title");
    }
    text.push_str(&format!(" | log: {}", app.transcript().status_string()));
    info(app, text)
}

pub(super) fn handle_health(_app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::CheckHealth
}

pub(super) fn handle_log(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let parts: Vec<&str> = invocation.args.split_whitespace().collect();

    match parts.as_slice() {
        [] => match app.transcript_mut().toggle_logging("Logging paused") {
            Ok(message) => info(app, message),
            Err(err) => error(app, format!("Log error: {err}")),
        },
        [filename] => match app.transcript_mut().set_log_file(PathBuf::from(filename)) {
            Ok(message) => info(app, message),
            Err(err) => error(app, format!("Logfile error: {err}")),
        },
        _ => error(app, "Usage: /log [filename]"),
    }
}

pub(super) fn handle_quit(_app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    CommandResult::Quit
}
