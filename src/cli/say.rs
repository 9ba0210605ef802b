//! One-shot "say" command

use std::error::Error;
use std::path::PathBuf;

use crate::core::app::{App, AppError};
use crate::core::gateway::{GatewayError, TurnReply};

pub async fn run_say(
    mut app: App,
    prompt: Vec<String>,
    image: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() && image.is_none() {
        eprintln!("Usage: causerie say <prompt> [--image <path>]");
        std::process::exit(1);
    }

    if let Some(path) = image {
        if let Err(err) = app.attach_image(&path) {
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
    }

    // One session per invocation.
    app.new_session()?;

    match app.submit_turn(&prompt).await {
        Ok(outcome) => {
            print!("{}", render_reply(&outcome.reply));
            Ok(())
        }
        Err(AppError::Gateway(GatewayError::Unauthenticated)) => {
            eprintln!("❌ No API key configured.");
            eprintln!();
            eprintln!("💡 Quick fixes:");
            eprintln!("  • causerie auth");
            eprintln!("  • export XAI_API_KEY=...");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("❌ Error: {err}");
            std::process::exit(1);
        }
    }
}

/// Plain-text rendering of a reply with its metadata footer.
pub fn render_reply(reply: &TurnReply) -> String {
    let mut out = String::new();
    out.push_str(reply.content.trim_end());
    out.push('\n');

    if let Some(thought) = &reply.thought_process {
        out.push_str(&format!("\n💡 Reasoning: {}\n", thought.trim()));
    }
    if !reply.sources.is_empty() {
        out.push_str("\n📚 Sources:\n");
        for source in &reply.sources {
            out.push_str(&format!("  • {} <{}>\n", source.title, source.url));
        }
    }
    out.push_str(&format!(
        "\n📊 Confidence {:.0}% · {} · {} ms\n",
        reply.confidence_score * 100.0,
        reply.model_used,
        reply.latency.as_millis()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Source;
    use std::time::Duration;

    fn reply() -> TurnReply {
        TurnReply {
            content: "Paris is the capital of France.\n".to_string(),
            thought_process: None,
            confidence_score: 0.95,
            sources: Vec::new(),
            model_used: "grok-beta".to_string(),
            latency: Duration::from_millis(420),
        }
    }

    #[test]
    fn plain_reply_has_confidence_footer() {
        let rendered = render_reply(&reply());
        assert_eq!(
            rendered,
            "Paris is the capital of France.\n\n📊 Confidence 95% · grok-beta · 420 ms\n"
        );
    }

    #[test]
    fn reasoning_and_sources_are_listed() {
        let mut reply = reply();
        reply.thought_process = Some(" The question asks for a capital. ".to_string());
        reply.sources = vec![Source {
            title: "Atlas".to_string(),
            url: "https://example.com/atlas".to_string(),
        }];

        let rendered = render_reply(&reply);
        assert!(rendered.contains("💡 Reasoning: The question asks for a capital.\n"));
        assert!(rendered.contains("  • Atlas <https://example.com/atlas>\n"));
    }
}
