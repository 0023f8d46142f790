use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// One primitive both input kinds share: replace `buf` with the next
/// physical line, including its `\n` when the input has one. A return of
/// `0` bytes means end of input.
pub trait Source {
    fn fill_line(&mut self, buf: &mut Vec<u8>) -> io::Result<usize>;
}

/// Byte-for-byte file input.
#[derive(Debug)]
pub struct FileSource {
    inner: BufReader<File>,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            inner: BufReader::new(File::open(path)?),
        })
    }
}

impl Source for FileSource {
    fn fill_line(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        buf.clear();
        self.inner.read_until(b'\n', buf)
    }
}

/// Bounded in-memory input with a cursor; never blocks.
#[derive(Debug)]
pub struct MemorySource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> MemorySource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl Source for MemorySource<'_> {
    fn fill_line(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        buf.clear();
        if self.pos >= self.data.len() {
            return Ok(0);
        }
        let rest = &self.data[self.pos..];
        let end = match memchr::memchr(b'\n', rest) {
            Some(idx) => idx + 1,
            None => rest.len(),
        };
        buf.extend_from_slice(&rest[..end]);
        self.pos += end;
        Ok(end)
    }
}
