//! Paragraph-aware text chunking
//!
//! Paragraphs (blank-line separated) are packed into chunks of at most
//! `max_chars` characters. A paragraph longer than that is hard-split on
//! char boundaries. Chunks are trimmed and never empty.

/// Split `text` into chunks of at most `max_chars` characters
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let len = paragraph.chars().count();

        if len > max_chars {
            flush(&mut chunks, &mut current, &mut current_len);
            chunks.extend(hard_split(paragraph, max_chars));
            continue;
        }

        // Two chars for the "\n\n" joiner
        let joined_len = if current.is_empty() { len } else { current_len + 2 + len };
        if joined_len > max_chars {
            flush(&mut chunks, &mut current, &mut current_len);
        }

        if !current.is_empty() {
            current.push_str("\n\n");
            current_len += 2;
        }
        current.push_str(paragraph);
        current_len += len;
    }

    flush(&mut chunks, &mut current, &mut current_len);
    chunks
}

fn flush(chunks: &mut Vec<String>, current: &mut String, current_len: &mut usize) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
    current.clear();
    *current_len = 0;
}

fn hard_split(paragraph: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = paragraph.chars().collect();
    chars
        .chunks(max_chars)
        .map(|piece| piece.iter().collect::<String>().trim().to_string())
        .filter(|piece| !piece.is_empty())
        .collect()
}
