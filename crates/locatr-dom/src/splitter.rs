//! Recursive, separator-driven splitter that bounds serialized DOM chunks.
//!
//! Chunks are byte ranges into the input, so consecutive chunks may overlap
//! but never leave a gap.

use regex::Regex;
use std::collections::VecDeque;
use std::ops::Range;
use std::sync::LazyLock;
use tracing::warn;

pub const DEFAULT_CHUNK_SIZE: usize = 4000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Most to least structural. The empty separator means "do not split".
pub const HTML_SEPARATORS: &[&str] = &[
    "<body", "<div", "<p", "<br", "<li", "<h1", "<h2", "<h3", "<h4", "<h5", "<h6", "<span",
    "<table", "<tr", "<td", "<th", "<ul", "<ol", "<header", "<footer", "<nav", "<head",
    "<style", "<script", "<meta", "<title", "",
];

static DEFAULT_SEPARATORS: LazyLock<Vec<Option<Regex>>> =
    LazyLock::new(|| compile(HTML_SEPARATORS).unwrap());

fn compile(separators: &[&str]) -> Result<Vec<Option<Regex>>, regex::Error> {
    separators
        .iter()
        .map(|s| if s.is_empty() { Ok(None) } else { Regex::new(s).map(Some) })
        .collect()
}

#[derive(Debug, Clone)]
pub struct HtmlSplitter {
    separators: Vec<Option<Regex>>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for HtmlSplitter {
    fn default() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }
}

impl HtmlSplitter {
    pub fn new(
        separators: &[&str],
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            separators: compile(separators)?,
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            separators: DEFAULT_SEPARATORS.clone(),
            chunk_size,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }

    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.chunk_overlap = overlap;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn split<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.split_spans(text).into_iter().map(|r| &text[r]).collect()
    }

    /// Chunk byte ranges in order. Each chunk starts at or before the previous
    /// chunk's end; only an atomic fragment may exceed the chunk size.
    pub fn split_spans(&self, text: &str) -> Vec<Range<usize>> {
        let mut chunks = Vec::new();
        self.split_range(text, 0..text.len(), &self.separators, &mut chunks);
        chunks
    }

    fn split_range(
        &self,
        text: &str,
        range: Range<usize>,
        separators: &[Option<Regex>],
        chunks: &mut Vec<Range<usize>>,
    ) {
        let slice = &text[range.clone()];

        // First separator that matches; an empty separator ends the search.
        let mut chosen: Option<&Regex> = None;
        let mut remaining: &[Option<Regex>] = &[];
        for (i, separator) in separators.iter().enumerate() {
            match separator {
                None => break,
                Some(re) if re.is_match(slice) => {
                    chosen = Some(re);
                    remaining = &separators[i + 1..];
                    break;
                }
                Some(_) => {}
            }
        }

        let fragments = match chosen {
            Some(re) => split_keep_separator(re, slice, range.start),
            None if range.is_empty() => Vec::new(),
            None => vec![range],
        };

        let mut good: Vec<Range<usize>> = Vec::new();
        for fragment in fragments {
            if fragment.len() < self.chunk_size {
                good.push(fragment);
                continue;
            }
            if !good.is_empty() {
                self.merge(&good, chunks);
                good.clear();
            }
            if remaining.is_empty() {
                chunks.push(fragment);
            } else {
                self.split_range(text, fragment, remaining, chunks);
            }
        }
        if !good.is_empty() {
            self.merge(&good, chunks);
        }
    }

    /// Sliding-window merge of small fragments, carrying up to the overlap
    /// budget of trailing fragments into the next chunk.
    fn merge(&self, fragments: &[Range<usize>], chunks: &mut Vec<Range<usize>>) {
        let mut window: VecDeque<Range<usize>> = VecDeque::new();
        let mut size = 0usize;

        for fragment in fragments {
            let len = fragment.len();
            if size + len > self.chunk_size {
                if size > self.chunk_size {
                    warn!(size, limit = self.chunk_size, "Created chunk larger than the limit");
                }
                if let (Some(first), Some(last)) = (window.front(), window.back()) {
                    chunks.push(first.start..last.end);
                }
                while size > self.chunk_overlap || (size > 0 && size + len > self.chunk_size) {
                    let Some(dropped) = window.pop_front() else {
                        break;
                    };
                    size -= dropped.len();
                }
            }
            window.push_back(fragment.clone());
            size += len;
        }

        if let (Some(first), Some(last)) = (window.front(), window.back()) {
            chunks.push(first.start..last.end);
        }
    }
}

/// Split at every match, re-attaching each separator to the fragment that
/// follows it. Empty fragments are dropped.
fn split_keep_separator(re: &Regex, slice: &str, offset: usize) -> Vec<Range<usize>> {
    let mut fragments = Vec::new();
    let mut start = 0;
    for m in re.find_iter(slice) {
        if m.start() > start {
            fragments.push(offset + start..offset + m.start());
            start = m.start();
        }
    }
    if slice.len() > start {
        fragments.push(offset + start..offset + slice.len());
    }
    fragments
}

/// Split serialized HTML/XML with the default separators and overlap.
pub fn split_html(text: &str, chunk_size: usize) -> Vec<&str> {
    HtmlSplitter::with_chunk_size(chunk_size).split(text)
}
