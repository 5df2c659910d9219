//! Prints replies to stdout: content, elements, then numbered actions.

use ava::{Element, EventEmitter, MediaType, Reply, ReplyKind};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

/// Prints streamed tokens as they arrive and remembers whether any did, so
/// the final content is not printed twice.
#[derive(Default)]
pub struct TerminalEmitter {
    streamed: AtomicBool,
}

impl TerminalEmitter {
    pub fn reset(&self) {
        self.streamed.store(false, Ordering::SeqCst);
    }

    pub fn streamed(&self) -> bool {
        self.streamed.load(Ordering::SeqCst)
    }
}

impl EventEmitter for TerminalEmitter {
    fn emit(&self, event: &str, data: serde_json::Value) {
        if event != "token" {
            return;
        }
        if let Some(token) = data.get("token").and_then(|t| t.as_str()) {
            self.streamed.store(true, Ordering::SeqCst);
            print!("{}", token);
            let _ = std::io::stdout().flush();
        }
    }
}

pub fn print_reply(reply: &Reply, already_streamed: bool) {
    if already_streamed {
        println!();
        // Streamed text is the raw answer; show any heading the handler added
        if let Some((heading, _)) = reply.content.split_once("\n\n") {
            if heading.starts_with("## ") {
                println!("{}", heading);
            }
        }
    } else {
        println!("{}", reply.content);
    }

    for element in &reply.elements {
        match element {
            Element::Text { name, content } => println!("\n{}\n{}", name, content),
            Element::Image { name, mime, bytes } => match save_image(name, mime, bytes) {
                Ok(path) => println!("\n{} saved to {}", name, path.display()),
                Err(e) => tracing::warn!(error = %e, "Could not write image"),
            },
            Element::ImageUrl { name, url } => println!("{}: {}", name, url),
            Element::Html { content } => println!("\n[embed] {}", content),
        }
    }

    match &reply.kind {
        ReplyKind::RequestUpload { accept } => {
            let types = accept.iter().map(MediaType::label).collect::<Vec<_>>().join(", ");
            println!("(use /upload <path>; accepted: {})", types);
        }
        ReplyKind::Normal => {}
        kind => tracing::debug!(kind = ?kind, "Non-normal reply"),
    }

    if !reply.actions.is_empty() {
        println!();
        for (idx, action) in reply.actions.iter().enumerate() {
            println!("  [{}] {}: {}", idx + 1, action.name, action.description);
        }
    }
    println!("___");
}

fn save_image(name: &str, mime: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
    let ext = match mime {
        "image/svg+xml" => "svg",
        other => other.rsplit('/').next().unwrap_or("bin"),
    };
    let stem: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let path = std::env::temp_dir().join(format!("ava-{}.{}", stem, ext));
    std::fs::write(&path, bytes)?;
    Ok(path)
}
