//! Message formatting and chunking helpers
//!
//! Discord embed descriptions are capped at 2048 characters; anything the
//! bot sends as an embed goes through [`chunk_text`] first.

/// Maximum characters in one embed description.
pub const EMBED_MAX_CHARACTERS: usize = 2048;

/// Deep link back to the message a reminder was created from.
pub fn craft_message_link(server_id: u64, channel_id: u64, message_id: u64) -> String {
    format!("https://discord.com/channels/{server_id}/{channel_id}/{message_id}")
}

/// Split `text` into chunks of at most `max_len` characters.
///
/// Splits on line boundaries where possible; a single line longer than
/// `max_len` is hard-split at character boundaries.
pub fn chunk_text(text: &str, max_len: usize) -> Vec<String> {
    assert!(max_len > 0);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in text.split_inclusive('\n') {
        if current.chars().count() + line.chars().count() > max_len && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if line.chars().count() > max_len {
            // Hard-split an overlong line
            let mut piece = String::new();
            for c in line.chars() {
                if piece.chars().count() == max_len {
                    chunks.push(std::mem::take(&mut piece));
                }
                piece.push(c);
            }
            current = piece;
        } else {
            current.push_str(line);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
