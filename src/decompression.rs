use flate2::read::MultiGzDecoder;
use std::io::{BufRead, BufReader, Chain, Cursor, Read};

type Prefixed<R> = Chain<Cursor<Vec<u8>>, R>;

/// Streaming decompression wrapper that implements BufRead
/// Detects gzip (1F 8B 08) and zstd (28 B5 2F FD) compression using magic bytes
pub enum DecompressionReader<R: Read> {
    /// Gzip decompression
    Gzip(BufReader<MultiGzDecoder<Prefixed<R>>>),
    /// Zstd decompression - decoder requires BufRead input and provides Read output
    Zstd(BufReader<zstd::Decoder<'static, BufReader<Prefixed<R>>>>),
    /// Passthrough for plain text
    Plain(BufReader<Prefixed<R>>),
}

impl<R: Read> std::fmt::Debug for DecompressionReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecompressionReader::Gzip(_) => write!(f, "DecompressionReader::Gzip"),
            DecompressionReader::Zstd(_) => write!(f, "DecompressionReader::Zstd"),
            DecompressionReader::Plain(_) => write!(f, "DecompressionReader::Plain"),
        }
    }
}

impl<R: Read> BufRead for DecompressionReader<R> {
    fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
        match self {
            DecompressionReader::Gzip(reader) => reader.fill_buf(),
            DecompressionReader::Zstd(reader) => reader.fill_buf(),
            DecompressionReader::Plain(reader) => reader.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            DecompressionReader::Gzip(reader) => reader.consume(amt),
            DecompressionReader::Zstd(reader) => reader.consume(amt),
            DecompressionReader::Plain(reader) => reader.consume(amt),
        }
    }
}

impl<R: Read> Read for DecompressionReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            DecompressionReader::Gzip(reader) => reader.read(buf),
            DecompressionReader::Zstd(reader) => reader.read(buf),
            DecompressionReader::Plain(reader) => reader.read(buf),
        }
    }
}

impl<R: Read> DecompressionReader<R> {
    /// Wrap `reader`, picking a decoder from its first four bytes
    pub fn new(mut reader: R) -> std::io::Result<Self> {
        let mut head = [0u8; 4];
        let n = read_head(&mut reader, &mut head)?;

        // Put the read bytes back in front using a cursor chain
        let chained = Cursor::new(head[..n].to_vec()).chain(reader);

        if is_gzip(&head[..n]) {
            Ok(DecompressionReader::Gzip(BufReader::new(
                MultiGzDecoder::new(chained),
            )))
        } else if is_zstd(&head[..n]) {
            let decoder = zstd::Decoder::new(chained)?;
            Ok(DecompressionReader::Zstd(BufReader::new(decoder)))
        } else {
            Ok(DecompressionReader::Plain(BufReader::new(chained)))
        }
    }

    pub fn is_compressed(&self) -> bool {
        !matches!(self, DecompressionReader::Plain(_))
    }
}

// A single read() may return fewer bytes than available
fn read_head<R: Read>(reader: &mut R, head: &mut [u8; 4]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < head.len() {
        match reader.read(&mut head[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

fn is_gzip(head: &[u8]) -> bool {
    head.len() >= 3 && head[0] == 0x1F && head[1] == 0x8B && head[2] == 0x08
}

fn is_zstd(head: &[u8]) -> bool {
    head.len() >= 4 && head[..4] == [0x28, 0xB5, 0x2F, 0xFD]
}
