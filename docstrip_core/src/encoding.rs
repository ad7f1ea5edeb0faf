use std::borrow::Cow;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use encoding_rs::UTF_8;
use encoding_rs::WINDOWS_1252;
use serde::Deserialize;

/// Default number of leading bytes handed to the encoding detector.
pub const DEFAULT_DETECTION_SAMPLE: usize = 4096;

/// Controls how file bytes are turned into text.
///
/// UTF-8 is always the primary encoding. A byte-order mark (UTF-8 or UTF-16)
/// takes precedence over everything else and is stripped from the text.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingOptions {
	/// Sample the leading bytes and try the detected encoding when the bytes
	/// are not valid UTF-8.
	pub detect: bool,
	/// Decode as Windows-1252 as a last resort instead of skipping the file.
	pub legacy_fallback: bool,
	/// How many leading bytes the detector sees.
	pub sample_size: usize,
}

impl Default for EncodingOptions {
	fn default() -> Self {
		Self {
			detect: true,
			legacy_fallback: false,
			sample_size: DEFAULT_DETECTION_SAMPLE,
		}
	}
}

/// How the encoding of a decoded file was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingSource {
	/// A byte-order mark named the encoding.
	ByteOrderMark,
	/// The bytes were valid in the primary encoding.
	Primary,
	/// The detector's guess decoded cleanly.
	Detected,
	/// The legacy single-byte fallback was used.
	LegacyFallback,
}

/// Text recovered from a file's raw bytes.
#[derive(Debug, Clone)]
pub struct DecodedText {
	pub text: String,
	pub encoding: &'static Encoding,
	pub source: EncodingSource,
}

impl DecodedText {
	/// Name of the resolved encoding, e.g. `UTF-8` or `windows-1252`.
	pub fn encoding_name(&self) -> &'static str {
		self.encoding.name()
	}

	/// True when anything other than a BOM or clean UTF-8 decided the
	/// encoding. Callers report this since the output is re-encoded as UTF-8.
	pub fn is_non_primary(&self) -> bool {
		matches!(
			self.source,
			EncodingSource::Detected | EncodingSource::LegacyFallback
		) && self.encoding != UTF_8
	}
}

/// Decode `bytes` into text. Returns `None` when no attempted encoding
/// accepts the bytes, in which case the file must be skipped rather than
/// written back corrupted.
///
/// Valid UTF-8 always wins over the detector: any byte sequence that decodes
/// cleanly as UTF-8 is treated as an ambiguous detection.
pub fn decode_bytes(bytes: &[u8], options: &EncodingOptions) -> Option<DecodedText> {
	let mut payload = bytes;

	if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
		payload = &bytes[bom_len..];
		if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(payload) {
			return Some(DecodedText {
				text: text.into_owned(),
				encoding,
				source: EncodingSource::ByteOrderMark,
			});
		}
	} else if let Some(text) = UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
		return Some(DecodedText {
			text: text.into_owned(),
			encoding: UTF_8,
			source: EncodingSource::Primary,
		});
	}

	// A mark followed by malformed content goes through the same fallbacks as
	// unmarked bytes, with the mark itself removed.
	if options.detect {
		let encoding = detect_encoding(payload, options.sample_size);
		if encoding != UTF_8 {
			if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(payload)
			{
				return Some(DecodedText {
					text: text.into_owned(),
					encoding,
					source: EncodingSource::Detected,
				});
			}
		}
	}

	if options.legacy_fallback {
		let (text, _) = WINDOWS_1252.decode_without_bom_handling(payload);
		return Some(DecodedText {
			text: Cow::into_owned(text),
			encoding: WINDOWS_1252,
			source: EncodingSource::LegacyFallback,
		});
	}

	None
}

/// Guess an encoding from at most `sample_size` leading bytes.
pub fn detect_encoding(bytes: &[u8], sample_size: usize) -> &'static Encoding {
	let sample = &bytes[..bytes.len().min(sample_size.max(1))];
	let mut detector = EncodingDetector::new();
	detector.feed(sample, sample.len() == bytes.len());
	detector.guess(None, true)
}
