//! Sliding-window text splitting with fixed overlap.

use docsearch_core::{ChunkConfig, ChunkError};

/// Split `text` into overlapping windows of `config.chunk_size` characters.
///
/// Sizing is in characters (Unicode scalar values), never bytes, so windows
/// cannot split a code point. Window `i` starts at `i * (chunk_size -
/// overlap)`; the last window may be shorter. The output depends only on the
/// input text and the config, and dropping the first `overlap` characters of
/// every chunk after the first and concatenating reproduces `text` exactly.
///
/// Empty input yields an empty sequence, not an error.
pub fn split_text(text: &str, config: &ChunkConfig) -> Result<Vec<String>, ChunkError> {
    validate(config)?;

    if text.is_empty() {
        return Ok(vec![]);
    }

    let chars: Vec<char> = text.chars().collect();
    let total_chars = chars.len();
    let step = config.chunk_size - config.overlap;

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < total_chars {
        let end = (start + config.chunk_size).min(total_chars);
        chunks.push(chars[start..end].iter().collect());
        if end >= total_chars {
            break;
        }
        start += step;
    }

    Ok(chunks)
}

fn validate(config: &ChunkConfig) -> Result<(), ChunkError> {
    if config.chunk_size == 0 {
        return Err(ChunkError::InvalidConfig(
            "chunk_size must be > 0".to_string(),
        ));
    }
    if config.overlap >= config.chunk_size {
        return Err(ChunkError::InvalidConfig(format!(
            "overlap {} must be smaller than chunk_size {}",
            config.overlap, config.chunk_size
        )));
    }
    Ok(())
}
