//! Splits over-length dialogue text into bounded pages.
//!
//! # Contracts
//! - Pages come out in source order and each holds at most `max_len` chars.
//! - A break falls on the nearest boundary inside the window; a word is only
//!   cut when the window holds no boundary at all.
//! - Pages are trimmed, and whitespace-only pages are never yielded.
//! - `max_len == 0` disables pagination: the trimmed text is the only page.

use serde::{Deserialize, Serialize};

/// Boundary rule used to pick the cut point inside a page window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakPolicy {
    /// Nearest whitespace not past the limit.
    #[default]
    Whitespace,
    /// Nearest sentence end followed by whitespace, then any whitespace.
    Sentence,
}

const SENTENCE_TERMINATORS: [char; 4] = ['.', '!', '?', '…'];

impl BreakPolicy {
    /// Returns the byte offset to cut `text` at, given that the window spans
    /// `text[..window_end]`.
    fn find_break(self, text: &str, window_end: usize) -> Option<usize> {
        match self {
            BreakPolicy::Whitespace => whitespace_break(text, window_end),
            BreakPolicy::Sentence => {
                sentence_break(text, window_end).or_else(|| whitespace_break(text, window_end))
            }
        }
    }
}

fn starts_with_whitespace(text: &str) -> bool {
    text.chars().next().map_or(true, char::is_whitespace)
}

fn whitespace_break(text: &str, window_end: usize) -> Option<usize> {
    if starts_with_whitespace(&text[window_end..]) {
        return Some(window_end);
    }
    text[..window_end]
        .char_indices()
        .rev()
        .find(|(idx, ch)| *idx > 0 && ch.is_whitespace())
        .map(|(idx, _)| idx)
}

fn sentence_break(text: &str, window_end: usize) -> Option<usize> {
    text[..window_end]
        .char_indices()
        .rev()
        .find(|(idx, ch)| {
            SENTENCE_TERMINATORS.contains(ch) && starts_with_whitespace(&text[idx + ch.len_utf8()..])
        })
        .map(|(idx, ch)| idx + ch.len_utf8())
}

/// Lazy iterator over the pages of a text.
#[derive(Clone, Debug)]
pub struct Pages<'a> {
    rest: &'a str,
    max_len: usize,
    policy: BreakPolicy,
}

impl<'a> Iterator for Pages<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            let rest = self.rest.trim_start();
            if rest.is_empty() {
                self.rest = rest;
                return None;
            }
            let (page, remainder) = split_page(rest, self.max_len, self.policy);
            self.rest = remainder;
            let page = page.trim_end();
            if !page.is_empty() {
                return Some(page);
            }
        }
    }
}

fn split_page(text: &str, max_len: usize, policy: BreakPolicy) -> (&str, &str) {
    if max_len == 0 {
        return (text, "");
    }
    let Some((window_end, _)) = text.char_indices().nth(max_len) else {
        return (text, "");
    };
    let cut = policy.find_break(text, window_end).unwrap_or(window_end);
    text.split_at(cut)
}

/// Paginates `text` into pages of at most `max_len` chars.
pub fn paginate(text: &str, max_len: usize, policy: BreakPolicy) -> Pages<'_> {
    Pages {
        rest: text,
        max_len,
        policy,
    }
}

#[cfg(test)]
#[path = "tests/paginate_tests.rs"]
mod tests;
