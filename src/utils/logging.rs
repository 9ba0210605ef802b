//! Opt-in plain-text transcript of the conversation.

use crate::core::message::{Message, Role};
use std::error::Error;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const USER_PREFIX: &str = "You";

pub struct TranscriptLog {
    file_path: Option<PathBuf>,
    is_active: bool,
}

impl TranscriptLog {
    /// A log file given at startup starts active.
    pub fn new(log_file: Option<PathBuf>) -> Result<Self, Box<dyn Error>> {
        let mut log = TranscriptLog {
            file_path: None,
            is_active: false,
        };
        if let Some(path) = log_file {
            log.set_log_file(path)?;
        }
        Ok(log)
    }

    pub fn set_log_file(&mut self, path: PathBuf) -> Result<String, Box<dyn Error>> {
        test_file_access(&path)?;

        let message = format!("Logging enabled to: {}", path.display());
        self.file_path = Some(path);
        self.is_active = true;
        Ok(message)
    }

    pub fn toggle_logging(&mut self, pause_message: &str) -> Result<String, Box<dyn Error>> {
        let Some(path) = self.file_path.clone() else {
            return Err("No log file specified. Use /log <filename> to enable logging first.".into());
        };
        if self.is_active {
            self.log_note(pause_message)?;
            self.is_active = false;
            Ok(format!("Logging paused (file: {})", path.display()))
        } else {
            self.is_active = true;
            Ok(format!("Logging resumed to: {}", path.display()))
        }
    }

    /// Append one message; user turns are prefixed, image payloads are left out.
    pub fn log_message(&self, message: &Message) -> Result<(), Box<dyn Error>> {
        match message.role {
            Role::User => {
                let mut text = format!("{USER_PREFIX}: {}", message.text_without_image());
                if message.text_without_image().len() < message.content.len() {
                    text.push_str(" [image]");
                }
                self.write_entry(&text)
            }
            Role::Assistant => self.write_entry(&message.content),
        }
    }

    /// Append an application note, marked with `##`.
    pub fn log_note(&self, note: &str) -> Result<(), Box<dyn Error>> {
        self.write_entry(&format!("## {note}"))
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn status_string(&self) -> String {
        let name = |path: &Path| {
            path.file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .into_owned()
        };
        match (&self.file_path, self.is_active) {
            (None, _) => "disabled".to_string(),
            (Some(path), true) => format!("active ({})", name(path)),
            (Some(path), false) => format!("paused ({})", name(path)),
        }
    }

    fn write_entry(&self, content: &str) -> Result<(), Box<dyn Error>> {
        let Some(file_path) = self.file_path.as_ref().filter(|_| self.is_active) else {
            return Ok(());
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;
        let mut writer = BufWriter::new(file);
        for line in content.lines() {
            writeln!(writer, "{line}")?;
        }
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

fn test_file_access(path: &Path) -> Result<(), Box<dyn Error>> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::image::PendingImage;
    use crate::core::message::compose_user_content;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn transcript_records_turns_and_pauses() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("chat.log");
        let mut log = TranscriptLog::new(Some(path.clone())).expect("log");
        assert!(log.is_active());
        assert_eq!(log.status_string(), "active (chat.log)");

        let image = PendingImage::from_bytes(b"GIF89a", "image/gif");
        log.log_message(&Message::user(compose_user_content("What is this?", Some(&image))))
            .expect("write user");
        log.log_message(&Message::assistant("A tiny GIF.\nNothing else."))
            .expect("write reply");
        log.toggle_logging("Logging paused").expect("pause");
        log.log_message(&Message::user("not logged")).expect("skip");

        let contents = fs::read_to_string(&path).expect("read");
        assert_eq!(
            contents,
            "You: What is this? [image]\n\nA tiny GIF.\nNothing else.\n\n## Logging paused\n\n"
        );
        assert_eq!(log.status_string(), "paused (chat.log)");

        log.toggle_logging("unused").expect("resume");
        assert!(log.is_active());
    }

    #[test]
    fn toggle_without_file_is_an_error() {
        let mut log = TranscriptLog::new(None).expect("log");
        assert_eq!(log.status_string(), "disabled");
        assert!(log.toggle_logging("pause").is_err());
        log.log_note("ignored").expect("inactive log ignores notes");
    }

    #[test]
    fn unwritable_path_is_rejected() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut log = TranscriptLog::new(None).expect("log");
        let missing_dir = temp_dir.path().join("missing").join("chat.log");
        assert!(log.set_log_file(missing_dir).is_err());
        assert!(!log.is_active());
    }
}
