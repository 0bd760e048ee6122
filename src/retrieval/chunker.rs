/// Splits text into overlapping word windows for embedding.
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Vec::new();
        }

        let step = self.chunk_size.saturating_sub(self.chunk_overlap).max(1);
        let mut chunks = Vec::new();

        for i in (0..words.len()).step_by(step) {
            let end = (i + self.chunk_size).min(words.len());
            chunks.push(words[i..end].join(" "));
            if end == words.len() {
                break;
            }
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let chunker = TextChunker::new(10, 2);
        let chunks = chunker.chunk("a basic bronze plan with dental coverage");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "a basic bronze plan with dental coverage");
    }

    #[test]
    fn long_text_overlaps() {
        let chunker = TextChunker::new(4, 2);
        let chunks = chunker.chunk("one two three four five six seven eight");
        assert_eq!(chunks[0], "one two three four");
        assert_eq!(chunks[1], "three four five six");
        assert_eq!(chunks[2], "five six seven eight");
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn empty_text_yields_nothing() {
        let chunker = TextChunker::new(4, 2);
        assert!(chunker.chunk("   ").is_empty());
    }

    #[test]
    fn degenerate_overlap_still_advances() {
        let chunker = TextChunker::new(2, 2);
        let chunks = chunker.chunk("one two three");
        assert!(!chunks.is_empty());
        assert!(chunks.len() <= 3);
    }
}
