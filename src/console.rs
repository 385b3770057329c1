use chrono::Local;
use log::warn;
use std::error::Error;
use std::io::Write;
use std::path::Path;
use tokio::io::{ AsyncBufReadExt, BufReader };

use crate::agent::ChatAgent;
use crate::config::prompt::{ with_subject_prefix, SUBJECTS };
use crate::models::chat::{ ChatMessage, ImageAttachment, Role };

const BOLD_ON: &str = "\x1b[1m";
const BOLD_OFF: &str = "\x1b[22m";

const HELP: &str = "\
Commands:
  <question>                  ask the assistant
  /in <subject> <question>    ask within a subject (Mathematics, Statistics, PMS, IT Skills, FEEE)
  /image <path> [question]    attach an image to the question
  /edit <id> <text>           rewrite one of your questions and regenerate the answer (later messages are dropped)
  /delete <id>                remove one message
  /list                       show the conversation
  /new                        start a new chat
  /quit                       exit";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Image {
        path: String,
        text: String,
    },
    Edit {
        id: String,
        text: String,
    },
    Delete(String),
    List,
    New,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim_start()),
        None => (s, ""),
    }
}

fn split_subject(rest: &str) -> Option<(&'static str, &str)> {
    SUBJECTS.iter()
        .copied()
        .filter(|s| {
            rest.get(..s.len()).map_or(false, |head| head.eq_ignore_ascii_case(s)) &&
                rest[s.len()..].chars().next().map_or(true, char::is_whitespace)
        })
        .max_by_key(|s| s.len())
        .map(|s| (s, rest[s.len()..].trim_start()))
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    if !line.starts_with('/') {
        return Command::Ask(line.to_string());
    }

    let (cmd, rest) = split_word(line);
    match cmd {
        "/quit" | "/exit" => Command::Quit,
        "/help" => Command::Help,
        "/list" => Command::List,
        "/new" => Command::New,
        "/delete" if !rest.is_empty() => Command::Delete(rest.to_string()),
        "/delete" => Command::Invalid("usage: /delete <id>".to_string()),
        "/edit" => {
            let (id, text) = split_word(rest);
            if id.is_empty() || text.is_empty() {
                Command::Invalid("usage: /edit <id> <text>".to_string())
            } else {
                Command::Edit { id: id.to_string(), text: text.to_string() }
            }
        }
        "/image" if !rest.is_empty() => {
            let (path, text) = split_word(rest);
            Command::Image { path: path.to_string(), text: text.to_string() }
        }
        "/image" => Command::Invalid("usage: /image <path> [text]".to_string()),
        "/in" =>
            match split_subject(rest) {
                Some((subject, question)) if !question.is_empty() => {
                    Command::Ask(with_subject_prefix(subject, question))
                }
                _ => Command::Invalid(format!("usage: /in <subject> <question>; subjects: {}", SUBJECTS.join(", "))),
            }
        _ => Command::Invalid(format!("unknown command {}; type /help", cmd)),
    }
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}

async fn load_image(path: &str) -> Result<ImageAttachment, Box<dyn Error + Send + Sync>> {
    let path = Path::new(path);
    let mime = mime_for_path(path).ok_or_else(|| format!("unsupported image type: {}", path.display()))?;
    let data = tokio::fs::read(path).await.map_err(|e| format!("could not read {}: {}", path.display(), e))?;
    Ok(ImageAttachment::new(data, mime))
}

/// Turns paired `**` delimiters into terminal bold. An unpaired trailing
/// delimiter is printed as-is.
pub fn render_markup(text: &str) -> String {
    let segments: Vec<&str> = text.split("**").collect();
    let paired = segments.len() % 2 == 1;
    let mut out = String::with_capacity(text.len());
    for (i, segment) in segments.iter().enumerate() {
        let is_last = i + 1 == segments.len();
        if i % 2 == 1 {
            if !paired && is_last {
                out.push_str("**");
                out.push_str(segment);
            } else {
                out.push_str(BOLD_ON);
                out.push_str(segment);
                out.push_str(BOLD_OFF);
            }
        } else {
            out.push_str(segment);
        }
    }
    out
}

fn print_message(msg: &ChatMessage) {
    let who = match msg.role {
        Role::User => "You",
        Role::Bot => "TTT JNAN",
    };
    let time = msg.timestamp.with_timezone(&Local).format("%H:%M");
    let attachment = match &msg.image {
        Some(img) => format!(" [image {}]", img.mime_type),
        None => String::new(),
    };
    println!("[{}] {} {}{}:\n{}\n", msg.id, who, time, attachment, render_markup(&msg.content));
}

fn show_status(status: &str) {
    eprintln!("... {}", status);
}

pub async fn run_console(agent: &mut ChatAgent) -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("TTT JNAN ChatBot. Type /help for commands.\n");
    for msg in agent.messages() {
        print_message(msg);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_command(&line) {
            Command::Empty => {}
            Command::Quit => break,
            Command::Help => println!("{}", HELP),
            Command::List => {
                for msg in agent.messages() {
                    print_message(msg);
                }
            }
            Command::New => {
                agent.new_chat().await;
                println!("Started a new chat.");
            }
            Command::Delete(id) => {
                if !agent.delete(&id).await {
                    println!("No message with id {}", id);
                }
            }
            Command::Edit { id, text } => {
                if agent.edit(&id, &text, &show_status).await {
                    if let Some(reply) = agent.messages().last().filter(|m| m.role == Role::Bot) {
                        print_message(reply);
                    }
                } else {
                    println!("No question of yours with id {}", id);
                }
            }
            Command::Ask(text) => {
                if let Some(reply) = agent.send(&text, None, &show_status).await? {
                    println!("{}\n", render_markup(&reply));
                }
            }
            Command::Image { path, text } =>
                match load_image(&path).await {
                    Ok(image) => {
                        if let Some(reply) = agent.send(&text, Some(image), &show_status).await? {
                            println!("{}\n", render_markup(&reply));
                        }
                    }
                    Err(e) => {
                        warn!("Image not attached: {}", e);
                        println!("{}", e);
                    }
                }
            Command::Invalid(msg) => println!("{}", msg),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_question() {
        assert_eq!(parse_command("  What is Ohm's law? "), Command::Ask("What is Ohm's law?".to_string()));
        assert_eq!(parse_command("   "), Command::Empty);
    }

    #[test]
    fn edit_keeps_the_rest_of_the_line() {
        assert_eq!(
            parse_command("/edit 1700000000000 What is Kirchhoff's law?"),
            Command::Edit { id: "1700000000000".to_string(), text: "What is Kirchhoff's law?".to_string() }
        );
        assert!(matches!(parse_command("/edit 17"), Command::Invalid(_)));
    }

    #[test]
    fn subject_shortcut_handles_multi_word_subjects() {
        assert_eq!(
            parse_command("/in it skills What is RAM?"),
            Command::Ask("In IT Skills: What is RAM?".to_string())
        );
        assert_eq!(parse_command("/in feee define EMF"), Command::Ask("In FEEE: define EMF".to_string()));
        assert!(matches!(parse_command("/in History who won?"), Command::Invalid(_)));
    }

    #[test]
    fn image_command_takes_optional_text() {
        assert_eq!(
            parse_command("/image ./q.png"),
            Command::Image { path: "./q.png".to_string(), text: String::new() }
        );
        assert_eq!(
            parse_command("/image q.jpg solve this"),
            Command::Image { path: "q.jpg".to_string(), text: "solve this".to_string() }
        );
    }

    #[test]
    fn unknown_commands_are_reported() {
        assert!(matches!(parse_command("/frobnicate"), Command::Invalid(_)));
        assert_eq!(parse_command("/delete 42"), Command::Delete("42".to_string()));
    }

    #[test]
    fn commands_missing_their_argument_print_usage() {
        assert_eq!(parse_command("/delete"), Command::Invalid("usage: /delete <id>".to_string()));
        assert_eq!(parse_command("/delete   "), Command::Invalid("usage: /delete <id>".to_string()));
        assert!(matches!(parse_command("/image"), Command::Invalid(ref m) if m.starts_with("usage: /image")));
    }

    #[test]
    fn mime_comes_from_extension() {
        assert_eq!(mime_for_path(Path::new("a/b.JPG")), Some("image/jpeg"));
        assert_eq!(mime_for_path(Path::new("scan.webp")), Some("image/webp"));
        assert_eq!(mime_for_path(Path::new("notes.txt")), None);
        assert_eq!(mime_for_path(Path::new("noext")), None);
    }

    #[test]
    fn markup_bolds_paired_delimiters() {
        assert_eq!(render_markup("a **b** c"), format!("a {}b{} c", BOLD_ON, BOLD_OFF));
        assert_eq!(render_markup("no markup"), "no markup");
        assert_eq!(render_markup("x **y"), "x **y");
    }
}
