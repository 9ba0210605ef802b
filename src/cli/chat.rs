//! Line-oriented chat loop

use std::error::Error;
use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::cli::say::render_reply;
use crate::commands::{process_input, CommandResult};
use crate::core::app::{App, AppError};
use crate::core::message::{Message, Role};
use crate::core::status::{HealthMonitor, HealthStatus, HEALTH_CHECK_INTERVAL};

pub async fn run_chat(mut app: App) -> Result<(), Box<dyn Error>> {
    let monitor = HealthMonitor::spawn(
        app.gateway().clone(),
        app.status_feed().clone(),
        HEALTH_CHECK_INTERVAL,
    );
    let mut status = app.subscribe_status();
    let mut last_health = status.borrow().api_health;

    print_transcript(&app);
    println!("Type /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut draft: Option<String> = None;

    loop {
        print_prompt(&app, draft.as_deref())?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let line = match draft.take() {
            Some(dictated) if line.trim().is_empty() => dictated,
            _ => line,
        };
        if line.trim().is_empty() && app.pending_image().is_none() {
            continue;
        }

        match process_input(&mut app, &line) {
            CommandResult::Continue => {}
            CommandResult::ProcessAsMessage(text) => send(&mut app, &text).await,
            CommandResult::ShowTranscript => print_transcript(&app),
            CommandResult::SetCredential(key) => {
                println!("Checking the key...");
                if let Err(err) = app.set_credential(&key).await {
                    debug!(error = %err, "API key not saved");
                    if !matches!(err, AppError::CredentialRejected) {
                        eprintln!("❌ {err}");
                    }
                }
            }
            CommandResult::CheckHealth => {
                let report = app.check_health().await;
                last_health = report.status;
                println!("{}", app.status().summary());
            }
            CommandResult::Dictated(text) => {
                println!("🎤 {text}");
                println!("(press Enter to send, or type a different message)");
                draft = Some(text);
            }
            CommandResult::Quit => break,
        }

        print_notices(&mut app);

        if status.has_changed().unwrap_or(false) {
            let snapshot = status.borrow_and_update().clone();
            if snapshot.api_health != last_health && snapshot.api_health != HealthStatus::Unknown {
                println!("● {}", snapshot.summary());
                last_health = snapshot.api_health;
            }
        }
    }

    monitor.stop();
    Ok(())
}

async fn send(app: &mut App, text: &str) {
    println!("… thinking");
    match app.submit_turn(text).await {
        Ok(outcome) => {
            println!();
            print!("{}", render_reply(&outcome.reply));
            println!();
        }
        // Gateway failures are already queued as notices.
        Err(AppError::Gateway(_)) => {}
        Err(err) => eprintln!("❌ {err}"),
    }
}

fn print_prompt(app: &App, draft: Option<&str>) -> std::io::Result<()> {
    let mut prompt = String::new();
    if app.pending_image().is_some() {
        prompt.push_str("[image] ");
    }
    if draft.is_some() {
        prompt.push_str("[voice] ");
    }
    prompt.push_str("you> ");
    let mut stdout = std::io::stdout();
    write!(stdout, "{prompt}")?;
    stdout.flush()
}

fn print_notices(app: &mut App) {
    for notice in app.take_notices() {
        println!("{notice}");
    }
}

fn print_transcript(app: &App) {
    let Some(session) = app.active_session() else {
        return;
    };
    let screen_reader = app.preferences().screen_reader;
    println!();
    println!("== {} ==", session.display_title());
    for message in &session.messages {
        println!("{}", render_message(message, screen_reader));
    }
}

/// Render a stored message. Screen reader mode drops pictographs.
pub fn render_message(message: &Message, screen_reader: bool) -> String {
    let label = match (message.role, screen_reader) {
        (Role::User, _) => "You",
        (Role::Assistant, true) => "Assistant",
        (Role::Assistant, false) => "AI",
    };
    let mut out = format!("{label}: {}", message.text_without_image());
    if message.text_without_image().len() != message.content.len() {
        out.push_str(" [image]");
    }

    let Some(metadata) = message.metadata.as_ref().filter(|m| !m.is_empty()) else {
        return out;
    };
    let (thought, confidence, sources) = if screen_reader {
        ("Reasoning:", "Confidence:", "Sources:")
    } else {
        ("💡", "📊", "📚")
    };
    if let Some(text) = &metadata.thought_process {
        out.push_str(&format!("\n  {thought} {}", text.trim()));
    }
    if let Some(score) = metadata.confidence_score {
        out.push_str(&format!("\n  {confidence} {:.0}%", score * 100.0));
    }
    if !metadata.sources.is_empty() {
        let titles: Vec<&str> = metadata
            .sources
            .iter()
            .map(|source| source.title.as_str())
            .collect();
        out.push_str(&format!("\n  {sources} {}", titles.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::image::PendingImage;
    use crate::core::message::{compose_user_content, MessageMetadata, Source};

    #[test]
    fn user_message_with_image_is_flagged() {
        let image = PendingImage::from_bytes(b"png", "image/png");
        let message = Message::user(compose_user_content("What is this?", Some(&image)));
        assert_eq!(render_message(&message, false), "You: What is this? [image]");
    }

    #[test]
    fn metadata_is_listed_under_the_reply() {
        let message = Message::assistant("It is a cat.").with_metadata(MessageMetadata {
            thought_process: Some("Whiskers and ears.".to_string()),
            confidence_score: Some(0.9),
            sources: vec![Source {
                title: "Cats".to_string(),
                url: "https://example.com".to_string(),
            }],
        });

        assert_eq!(
            render_message(&message, false),
            "AI: It is a cat.\n  💡 Whiskers and ears.\n  📊 90%\n  📚 Cats"
        );
        assert_eq!(
            render_message(&message, true),
            "Assistant: It is a cat.\n  Reasoning: Whiskers and ears.\n  Confidence: 90%\n  Sources: Cats"
        );
    }
}
