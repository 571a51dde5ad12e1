//! Tokenization of learned text.
//!
//! Lowercase, strip a fixed punctuation set, split on whitespace and drop
//! anything two characters or shorter.

/// Characters removed before splitting.
pub const PUNCTUATION: &[char] = &[
	'.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`', '~',
	'(', ')',
];

/// Tokens must be longer than this many characters to be kept.
pub const MIN_TOKEN_CHARS: usize = 2;

/// Split text into concept tokens, preserving order and duplicates.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
	let cleaned: String = text
		.to_lowercase()
		.chars()
		.filter(|c| !PUNCTUATION.contains(c))
		.collect();

	cleaned
		.split_whitespace()
		.filter(|token| token.chars().count() > MIN_TOKEN_CHARS)
		.map(str::to_owned)
		.collect()
}
