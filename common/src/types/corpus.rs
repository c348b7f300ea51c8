use serde::{Deserialize, Serialize};

use super::{lenient_optional_string, lenient_string};

/// One entry of the searchable corpus as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusBlock {
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub pid: String,
}

/// A block of corpus text addressed by its position in the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBlock<'a> {
    pub location: usize,
    pub pid: &'a str,
    pub content: &'a str,
}

/// Blocks without textual content keep their location slot but are never yielded.
pub fn text_blocks(corpus: &[CorpusBlock]) -> impl Iterator<Item = TextBlock<'_>> {
    corpus.iter().enumerate().filter_map(|(location, block)| {
        block.content.as_deref().map(|content| TextBlock {
            location,
            pid: &block.pid,
            content,
        })
    })
}
