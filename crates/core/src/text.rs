//! Counting user-perceived characters.
//!
//! Limits shown to users ("12/50") count graphemes, so a flag emoji or an
//! accented letter built from combining marks counts once.

use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SegmentationError {
    #[error("grapheme segmentation is unavailable")]
    Unavailable,
    #[error("grapheme segmentation failed: {0}")]
    Failed(String),
}

/// Strategy that splits text into extended grapheme clusters.
pub trait Segmenter: Send + Sync {
    /// # Errors
    ///
    /// Returns `SegmentationError` when the text cannot be segmented.
    fn grapheme_count(&self, text: &str) -> Result<usize, SegmentationError>;
}

/// UAX #29 extended grapheme clusters.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeSegmenter;

impl Segmenter for UnicodeSegmenter {
    fn grapheme_count(&self, text: &str) -> Result<usize, SegmentationError> {
        Ok(text.graphemes(true).count())
    }
}

/// Grapheme count of `text`.
#[must_use]
pub fn count_graphemes(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Length in UTF-16 code units, the degraded measure used when segmentation
/// is not available.
#[must_use]
pub fn code_unit_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Memoizing counter for a single text input.
///
/// Re-counting only happens when the text changes.
pub struct GraphemeCounter {
    segmenter: Option<Box<dyn Segmenter>>,
    last: Option<(String, usize)>,
}

impl GraphemeCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_segmenter(Box::new(UnicodeSegmenter))
    }

    #[must_use]
    pub fn with_segmenter(segmenter: Box<dyn Segmenter>) -> Self {
        Self {
            segmenter: Some(segmenter),
            last: None,
        }
    }

    /// A counter that always uses the code-unit fallback.
    #[must_use]
    pub fn without_segmentation() -> Self {
        Self {
            segmenter: None,
            last: None,
        }
    }

    pub fn count(&mut self, text: &str) -> usize {
        if let Some((cached, count)) = &self.last {
            if cached == text {
                return *count;
            }
        }
        let count = self.measure(text);
        self.last = Some((text.to_string(), count));
        count
    }

    fn measure(&self, text: &str) -> usize {
        let result = match &self.segmenter {
            Some(segmenter) => segmenter.grapheme_count(text),
            None => Err(SegmentationError::Unavailable),
        };
        match result {
            Ok(count) => count,
            Err(error) => {
                tracing::warn!(%error, "falling back to code-unit length");
                code_unit_len(text)
            }
        }
    }
}

impl Default for GraphemeCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingSegmenter {
        calls: Arc<AtomicUsize>,
    }

    impl Segmenter for CountingSegmenter {
        fn grapheme_count(&self, text: &str) -> Result<usize, SegmentationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            UnicodeSegmenter.grapheme_count(text)
        }
    }

    struct BrokenSegmenter;

    impl Segmenter for BrokenSegmenter {
        fn grapheme_count(&self, _text: &str) -> Result<usize, SegmentationError> {
            Err(SegmentationError::Failed("no data tables".into()))
        }
    }

    #[test]
    fn counts_emoji_as_one_character() {
        let mut counter = GraphemeCounter::new();
        assert_eq!(counter.count("Hello 👋"), 7);
        assert_eq!(counter.count("👍🏽"), 1);
        assert_eq!(counter.count("🇵🇱"), 1);
        assert_eq!(counter.count("e\u{301}"), 1);
        assert_eq!(counter.count(""), 0);
    }

    #[test]
    fn unavailable_segmentation_degrades_to_code_units() {
        let mut counter = GraphemeCounter::without_segmentation();
        assert_eq!(counter.count("Hello 👋"), 8);
        assert_eq!(counter.count("abc"), 3);
    }

    #[test]
    fn failing_segmenter_degrades_instead_of_erroring() {
        let mut counter = GraphemeCounter::with_segmenter(Box::new(BrokenSegmenter));
        assert_eq!(counter.count("🇵🇱"), 4);
    }

    #[test]
    fn repeated_input_is_served_from_memo() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut counter = GraphemeCounter::with_segmenter(Box::new(CountingSegmenter {
            calls: Arc::clone(&calls),
        }));

        counter.count("Zażółć");
        counter.count("Zażółć");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        counter.count("gęślą jaźń");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn free_functions_agree_with_counter() {
        assert_eq!(count_graphemes("Hello 👋"), 7);
        assert_eq!(code_unit_len("Hello 👋"), 8);
    }
}
