// src/clipboard.rs
use arboard::Clipboard;
use log;

/// Puts `text` on the system clipboard. `what` only names the value in logs.
pub fn copy_text(text: &str, what: &str) -> Result<(), arboard::Error> {
    let mut clipboard = Clipboard::new().map_err(|e| {
        log::error!("Error initializing clipboard: {}", e);
        e
    })?;
    clipboard.set_text(text.to_string()).map_err(|e| {
        log::error!("Error setting clipboard text for {}: {}", what, e);
        e
    })?;
    log::info!("Copied {} to clipboard.", what);
    Ok(())
}
