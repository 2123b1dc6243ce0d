//! Open files as `std::io` streams

use crate::engine::{failure, FileEngine};
use crate::error::{VfsError, VfsResult};
use crate::flags::{FileName, OpenMode};
use crate::resolver::EngineResolver;
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom, Write};

const CHUNK: usize = 8 * 1024;

/// An open engine.
///
/// Implements [`Read`], [`Write`] and [`Seek`]; the engine is closed when
/// the `File` is dropped.
pub struct File {
    path: String,
    engine: Box<dyn FileEngine>,
}

impl File {
    pub fn open(resolver: &EngineResolver, path: &str, mode: OpenMode) -> VfsResult<Self> {
        let mut engine = resolver.create(path);
        if !engine.open(mode) {
            return Err(failure(engine.as_ref(), path, "open"));
        }
        Ok(Self {
            path: engine.file_name(FileName::Default),
            engine,
        })
    }

    /// Open for writing, creating or truncating
    pub fn create(resolver: &EngineResolver, path: &str) -> VfsResult<Self> {
        Self::open(resolver, path, OpenMode::WRITE | OpenMode::TRUNCATE)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn engine(&self) -> &dyn FileEngine {
        self.engine.as_ref()
    }

    fn check(&self, ok: bool, operation: &str) -> VfsResult<()> {
        if ok {
            Ok(())
        } else {
            Err(failure(self.engine.as_ref(), &self.path, operation))
        }
    }

    pub fn size(&self) -> i64 {
        self.engine.size()
    }

    pub fn pos(&self) -> i64 {
        self.engine.pos()
    }

    pub fn seek_to(&mut self, pos: i64) -> VfsResult<()> {
        let ok = self.engine.seek(pos);
        self.check(ok, "seek")
    }

    pub fn resize(&mut self, size: i64) -> VfsResult<()> {
        let ok = self.engine.set_size(size);
        self.check(ok, "resize")
    }

    /// Everything from the cursor to the end
    pub fn read_all(&mut self) -> VfsResult<Vec<u8>> {
        let mut content = Vec::new();
        let mut chunk = vec![0u8; CHUNK];
        loop {
            match self.engine.read(&mut chunk) {
                0 => return Ok(content),
                n if n > 0 => content.extend_from_slice(&chunk[..n as usize]),
                _ => {
                    return match failure(self.engine.as_ref(), &self.path, "read") {
                        // cursor already past the end
                        VfsError::OutOfRange { .. } => Ok(content),
                        err => Err(err),
                    }
                }
            }
        }
    }

    /// Write all of `data` at the cursor
    pub fn write_all_bytes(&mut self, data: &[u8]) -> VfsResult<()> {
        let mut written = 0;
        while written < data.len() {
            match self.engine.write(&data[written..]) {
                n if n > 0 => written += n as usize,
                _ => return Err(failure(self.engine.as_ref(), &self.path, "write")),
            }
        }
        Ok(())
    }

    pub fn close(mut self) -> VfsResult<()> {
        let ok = self.engine.close();
        self.check(ok, "close")
    }
}

impl Read for File {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.engine.read(buf);
        if n >= 0 {
            return Ok(n as usize);
        }
        match failure(self.engine.as_ref(), &self.path, "read") {
            VfsError::OutOfRange { .. } => Ok(0),
            err => Err(err.into()),
        }
    }
}

impl Write for File {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.engine.write(buf);
        if n < 0 {
            return Err(failure(self.engine.as_ref(), &self.path, "write").into());
        }
        Ok(n as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        let ok = self.engine.flush();
        self.check(ok, "flush").map_err(io::Error::from)
    }
}

impl Seek for File {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => i64::try_from(offset).ok(),
            SeekFrom::End(offset) => self.engine.size().checked_add(offset),
            SeekFrom::Current(offset) => self.engine.pos().checked_add(offset),
        };
        let target = match target {
            Some(target) if target >= 0 => target,
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "seek to a negative or overflowing position",
                ))
            }
        };
        self.seek_to(target)?;
        Ok(target as u64)
    }
}

impl Drop for File {
    fn drop(&mut self) {
        if self.engine.pos() >= 0 {
            self.engine.close();
        }
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("path", &self.path)
            .field("pos", &self.engine.pos())
            .finish()
    }
}
