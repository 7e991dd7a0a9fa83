//! Last-resort extension recovery for archives decoded without metadata.

/// Guesses a file extension from the first bytes of decoded content.
pub trait ContentSniffer: Send + Sync {
    /// Extension without a leading dot, or `None` if the content is unknown.
    fn sniff(&self, head: &[u8]) -> Option<String>;
}

/// Magic-number signature: `magic` must appear at `offset`.
#[derive(Debug, Clone, Copy)]
struct Signature {
    offset: usize,
    magic: &'static [u8],
    extension: &'static str,
}

const fn sig(offset: usize, magic: &'static [u8], extension: &'static str) -> Signature {
    Signature { offset, magic, extension }
}

// Checked in order; more specific signatures come before shorter prefixes.
const SIGNATURES: &[Signature] = &[
    sig(0, b"\x89PNG\r\n\x1a\n", "png"),
    sig(0, b"\xFF\xD8\xFF", "jpg"),
    sig(0, b"GIF87a", "gif"),
    sig(0, b"GIF89a", "gif"),
    sig(0, b"%PDF-", "pdf"),
    sig(0, b"PK\x03\x04", "zip"),
    sig(0, b"\x1F\x8B", "gz"),
    sig(0, b"BZh", "bz2"),
    sig(0, b"\xFD7zXZ\x00", "xz"),
    sig(0, b"7z\xBC\xAF\x27\x1C", "7z"),
    sig(0, b"Rar!\x1A\x07", "rar"),
    sig(257, b"ustar", "tar"),
    sig(0, b"ID3", "mp3"),
    sig(0, b"fLaC", "flac"),
    sig(0, b"OggS", "ogg"),
    sig(8, b"WAVE", "wav"),
    sig(8, b"WEBP", "webp"),
    sig(4, b"ftyp", "mp4"),
    sig(0, b"\x7FELF", "elf"),
    sig(0, b"MZ", "exe"),
    sig(0, b"BM", "bmp"),
];

/// Built-in sniffer over a fixed table of well-known file signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureSniffer;

impl ContentSniffer for SignatureSniffer {
    fn sniff(&self, head: &[u8]) -> Option<String> {
        SIGNATURES
            .iter()
            .find(|s| {
                head.get(s.offset..s.offset + s.magic.len())
                    .is_some_and(|window| window == s.magic)
            })
            .map(|s| s.extension.to_owned())
    }
}

/// Sniffer that never recognizes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSniffer;

impl ContentSniffer for NoSniffer {
    fn sniff(&self, _head: &[u8]) -> Option<String> {
        None
    }
}
