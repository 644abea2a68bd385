//! Streams over binary files.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::{StreamError, StreamReader, StreamResult, StreamWriter};

/// Reads from a file opened in binary mode.
#[derive(Debug)]
pub struct FileStreamReader {
    path: PathBuf,
    stream: BufReader<File>,
    good: bool,
}

impl FileStreamReader {
    pub fn open(path: impl AsRef<Path>) -> StreamResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        tracing::debug!("Opened {} for reading", path.display());
        Ok(Self {
            path,
            stream: BufReader::new(file),
            good: true,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read until `destination` is full or the file ends, returning the byte count.
    fn fill(&mut self, destination: &mut [u8]) -> io::Result<usize> {
        let mut transferred = 0;
        while transferred < destination.len() {
            match self.stream.read(&mut destination[transferred..]) {
                Ok(0) => break,
                Ok(n) => transferred += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(transferred)
    }
}

impl StreamReader for FileStreamReader {
    fn is_good(&self) -> bool {
        self.good
    }

    fn position(&mut self) -> StreamResult<u64> {
        Ok(self.stream.stream_position()?)
    }

    fn set_position(&mut self, position: u64) -> StreamResult<()> {
        if let Err(e) = self.stream.seek(SeekFrom::Start(position)) {
            self.good = false;
            return Err(e.into());
        }
        Ok(())
    }

    fn read_data(&mut self, destination: &mut [u8]) -> StreamResult<()> {
        let requested = destination.len();
        let position = self.stream.stream_position()?;
        let transferred = match self.fill(destination) {
            Ok(n) => n,
            Err(e) => {
                self.good = false;
                return Err(e.into());
            }
        };

        if transferred < requested {
            self.good = false;
            return Err(StreamError::ShortRead {
                position,
                requested,
                transferred,
            });
        }
        Ok(())
    }
}

/// Writes to a file created (or truncated) in binary mode.
#[derive(Debug)]
pub struct FileStreamWriter {
    path: PathBuf,
    stream: BufWriter<File>,
    good: bool,
}

impl FileStreamWriter {
    pub fn create(path: impl AsRef<Path>) -> StreamResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        tracing::debug!("Opened {} for writing", path.display());
        Ok(Self {
            path,
            stream: BufWriter::new(file),
            good: true,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Push buffered bytes to the operating system.
    pub fn flush(&mut self) -> StreamResult<()> {
        if let Err(e) = self.stream.flush() {
            self.good = false;
            return Err(e.into());
        }
        Ok(())
    }
}

impl StreamWriter for FileStreamWriter {
    fn is_good(&self) -> bool {
        self.good
    }

    fn position(&mut self) -> StreamResult<u64> {
        Ok(self.stream.stream_position()?)
    }

    fn set_position(&mut self, position: u64) -> StreamResult<()> {
        if let Err(e) = self.stream.seek(SeekFrom::Start(position)) {
            self.good = false;
            return Err(e.into());
        }
        Ok(())
    }

    fn write_data(&mut self, data: &[u8]) -> StreamResult<()> {
        let position = self.stream.stream_position()?;
        let mut transferred = 0;
        while transferred < data.len() {
            match self.stream.write(&data[transferred..]) {
                Ok(0) => break,
                Ok(n) => transferred += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.good = false;
                    return Err(e.into());
                }
            }
        }

        if transferred < data.len() {
            self.good = false;
            return Err(StreamError::ShortWrite {
                position,
                requested: data.len(),
                transferred,
            });
        }
        Ok(())
    }
}
