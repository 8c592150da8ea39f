//! Transparent decompression for fetched objects.
//!
//! Objects in a bucket are frequently stored compressed (`part-0001.csv.gz`).
//! The loader hands every cached stream to [`decompressing_reader`], which picks
//! a [`Codec`] from the object key's extension and falls back to sniffing magic
//! bytes when the key carries no recognizable suffix.
//!
//! ## Built-in Codecs
//!
//! - **Gzip** (`.gz`, `.gzip`) - via `flate2` (feature: `compression-gzip`)
//! - **Zstd** (`.zst`, `.zstd`) - via `zstd` (feature: `compression-zstd`)
//!
//! With both features disabled the functions here are pass-throughs.

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, Read};

/// A decompression codec known to the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    #[cfg(feature = "compression-gzip")]
    Gzip,
    #[cfg(feature = "compression-zstd")]
    Zstd,
}

impl Codec {
    /// Every codec compiled into this build, in detection order.
    pub const ALL: &'static [Codec] = &[
        #[cfg(feature = "compression-gzip")]
        Codec::Gzip,
        #[cfg(feature = "compression-zstd")]
        Codec::Zstd,
    ];

    /// Human-readable codec name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            #[cfg(feature = "compression-gzip")]
            Codec::Gzip => "gzip",
            #[cfg(feature = "compression-zstd")]
            Codec::Zstd => "zstd",
        }
    }

    /// Lowercase key suffixes, leading dot included.
    #[must_use]
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            #[cfg(feature = "compression-gzip")]
            Codec::Gzip => &[".gz", ".gzip"],
            #[cfg(feature = "compression-zstd")]
            Codec::Zstd => &[".zst", ".zstd"],
        }
    }

    /// Leading bytes of a stream written by this codec.
    #[must_use]
    pub fn magic_bytes(self) -> &'static [u8] {
        match self {
            #[cfg(feature = "compression-gzip")]
            Codec::Gzip => &[0x1f, 0x8b],
            #[cfg(feature = "compression-zstd")]
            Codec::Zstd => &[0x28, 0xb5, 0x2f, 0xfd],
        }
    }

    /// Match a codec by the key's extension (case-insensitive).
    #[must_use]
    pub fn from_key(key: &str) -> Option<Codec> {
        let key = key.to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|codec| codec.extensions().iter().any(|ext| key.ends_with(ext)))
    }

    /// Match a codec by the first bytes of a stream.
    #[must_use]
    pub fn from_magic(head: &[u8]) -> Option<Codec> {
        Self::ALL
            .iter()
            .copied()
            .find(|codec| !head.is_empty() && head.starts_with(codec.magic_bytes()))
    }

    fn wrap<R: Read + 'static>(self, reader: R) -> std::io::Result<Box<dyn Read>> {
        match self {
            #[cfg(feature = "compression-gzip")]
            Codec::Gzip => Ok(Box::new(flate2::read::MultiGzDecoder::new(reader))),
            #[cfg(feature = "compression-zstd")]
            Codec::Zstd => {
                zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read>)
            }
        }
    }
}

/// Wrap `reader` with a decompressor when the object looks compressed.
///
/// Detection strategy:
/// 1. the object key's extension
/// 2. magic bytes at the head of the stream
/// 3. otherwise the (buffered) stream is returned as-is
///
/// # Errors
/// Returns an error if the decompressor cannot be initialized.
pub fn decompressing_reader<R: Read + 'static>(reader: R, key: &str) -> Result<Box<dyn Read>> {
    if let Some(codec) = Codec::from_key(key) {
        return codec
            .wrap(reader)
            .with_context(|| format!("wrap {key} with {} codec", codec.name()));
    }

    let mut buffered = BufReader::new(reader);
    let head = buffered
        .fill_buf()
        .with_context(|| format!("peek leading bytes of {key}"))?;
    if let Some(codec) = Codec::from_magic(head) {
        return codec
            .wrap(buffered)
            .with_context(|| format!("wrap {key} with {} codec", codec.name()));
    }

    Ok(Box::new(buffered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn plain_stream_passes_through() -> Result<()> {
        let mut out = String::new();
        decompressing_reader(Cursor::new(b"a,b\n1,2\n".to_vec()), "data/plain.csv")?
            .read_to_string(&mut out)?;
        assert_eq!(out, "a,b\n1,2\n");
        Ok(())
    }

    #[test]
    fn empty_stream_is_not_sniffed() -> Result<()> {
        let mut out = Vec::new();
        decompressing_reader(Cursor::new(Vec::new()), "empty.csv")?.read_to_end(&mut out)?;
        assert!(out.is_empty());
        Ok(())
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn gzip_detected_by_magic_without_extension() -> Result<()> {
        use flate2::write::GzEncoder;
        use std::io::Write;

        let mut enc = GzEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(b"x,y\n3,4\n")?;
        let bytes = enc.finish()?;

        assert_eq!(Codec::from_key("blob"), None);
        assert_eq!(Codec::from_magic(&bytes), Some(Codec::Gzip));

        let mut out = String::new();
        decompressing_reader(Cursor::new(bytes), "blob")?.read_to_string(&mut out)?;
        assert_eq!(out, "x,y\n3,4\n");
        Ok(())
    }

    #[cfg(feature = "compression-zstd")]
    #[test]
    fn zstd_extension_is_case_insensitive() {
        assert_eq!(Codec::from_key("PART-0.CSV.ZST"), Some(Codec::Zstd));
    }

    #[cfg(feature = "compression-zstd")]
    #[test]
    fn zstd_decoded_by_extension_and_by_magic() -> Result<()> {
        let bytes = zstd::encode_all(&b"x,y\n5,6\n"[..], 0)?;
        assert_eq!(Codec::from_magic(&bytes), Some(Codec::Zstd));

        for key in ["data/part-0.csv.zst", "blob"] {
            let mut out = String::new();
            decompressing_reader(Cursor::new(bytes.clone()), key)?.read_to_string(&mut out)?;
            assert_eq!(out, "x,y\n5,6\n", "{key}");
        }
        Ok(())
    }
}
