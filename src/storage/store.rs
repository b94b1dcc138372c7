//! Store
//!
//! Append-only record log. Each record is a big-endian u64 length followed
//! by the payload; a record is addressed by the byte offset of its length.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::Result;

/// Width of the length prefix in front of every record
pub const LEN_WIDTH: u64 = 8;

/// Append-only record log
///
/// ## Concurrency:
/// - Writer, reader and size share one Mutex, so the position handed out by
///   `append` is observed atomically with the size increment.
pub struct Store {
    /// Path of the backing file
    path: PathBuf,

    inner: Mutex<StoreInner>,
}

struct StoreInner {
    /// Buffered append handle
    writer: BufWriter<File>,

    /// Separate handle for positional reads
    reader: File,

    /// Bytes written so far, buffered bytes included
    size: u64,
}

impl Store {
    /// Open or create a store file
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        let size = file.metadata()?.len();
        let reader = File::open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(StoreInner {
                writer: BufWriter::new(file),
                reader,
                size,
            }),
        })
    }

    /// Append a record
    ///
    /// Returns (bytes written including the prefix, position of the record)
    pub fn append(&self, data: &[u8]) -> Result<(u64, u64)> {
        let mut inner = self.inner.lock();
        let pos = inner.size;

        inner.writer.write_all(&(data.len() as u64).to_be_bytes())?;
        inner.writer.write_all(data)?;

        let written = LEN_WIDTH + data.len() as u64;
        inner.size += written;

        Ok((written, pos))
    }

    /// Read the record at `pos`
    ///
    /// Buffered writes are flushed first so fresh positions are readable.
    pub fn read(&self, pos: u64) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock();
        inner.writer.flush()?;

        inner.reader.seek(SeekFrom::Start(pos))?;
        let mut len = [0u8; LEN_WIDTH as usize];
        inner.reader.read_exact(&mut len)?;

        let len = u64::from_be_bytes(len);
        if pos.saturating_add(LEN_WIDTH).saturating_add(len) > inner.size {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("record at {} runs past end of store ({} bytes)", pos, inner.size),
            )
            .into());
        }

        let mut data = vec![0u8; len as usize];
        inner.reader.read_exact(&mut data)?;
        Ok(data)
    }

    /// Flush buffered records to the file
    pub fn flush(&self) -> Result<()> {
        self.inner.lock().writer.flush()?;
        Ok(())
    }

    /// Flush and sync the file to disk
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.writer.flush()?;
        inner.writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Bytes written so far
    pub fn size(&self) -> u64 {
        self.inner.lock().size
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
