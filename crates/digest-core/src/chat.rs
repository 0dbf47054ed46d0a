//! Conversation naming from export file names.

const WHATSAPP_PREFIX: &str = "WhatsApp Chat with ";
const WHATSAPP_SUFFIX: &str = ".txt";

/// Returns the chat name embedded in an exported file name, if any.
///
/// Only the file name is inspected; directories are ignored.
pub fn chat_name_from_file(file_name: &str) -> Option<&str> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    base.strip_prefix(WHATSAPP_PREFIX)?
        .strip_suffix(WHATSAPP_SUFFIX)
        .filter(|name| !name.is_empty())
}
