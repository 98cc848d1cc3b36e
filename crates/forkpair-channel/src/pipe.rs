use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};

use tracing::debug;

use crate::error::{ChannelError, Endpoint, Result};

/// An anonymous pipe with separately owned ends.
///
/// Both ends start out held by the creating process. Call [`Channel::take_reader`]
/// and [`Channel::take_writer`] to hand them off; whatever is still held when the
/// channel is dropped (or [`Channel::close`] is called) gets closed.
#[derive(Debug)]
pub struct Channel {
    reader: Option<ReadEnd>,
    writer: Option<WriteEnd>,
}

impl Channel {
    /// Create a new pipe.
    pub fn open() -> Result<Self> {
        let mut fds: [libc::c_int; 2] = [-1; 2];

        // SAFETY: `fds` is a valid, writable array of two `c_int`s as required by pipe(2).
        let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
        if rc == -1 {
            return Err(ChannelError::Create(io::Error::last_os_error()));
        }

        // SAFETY: pipe(2) succeeded, so both descriptors are open and owned
        // exclusively by this process. Each is wrapped exactly once.
        let (read_fd, write_fd) =
            unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };

        debug!(read_fd = fds[0], write_fd = fds[1], "created pipe");

        Ok(Self {
            reader: Some(ReadEnd::from(read_fd)),
            writer: Some(WriteEnd::from(write_fd)),
        })
    }

    /// Hand off the read end.
    pub fn take_reader(&mut self) -> Result<ReadEnd> {
        self.reader
            .take()
            .ok_or(ChannelError::EndpointTaken(Endpoint::Read))
    }

    /// Hand off the write end.
    pub fn take_writer(&mut self) -> Result<WriteEnd> {
        self.writer
            .take()
            .ok_or(ChannelError::EndpointTaken(Endpoint::Write))
    }

    /// Close this process's copy of the read end, if still held.
    pub fn close_reader(&mut self) {
        if let Some(reader) = self.reader.take() {
            debug!(fd = reader.as_raw_fd(), "closing read end");
        }
    }

    /// Close this process's copy of the write end, if still held.
    pub fn close_writer(&mut self) {
        if let Some(writer) = self.writer.take() {
            debug!(fd = writer.as_raw_fd(), "closing write end");
        }
    }

    /// Close every end still held.
    pub fn close(mut self) {
        self.close_reader();
        self.close_writer();
    }

    /// Split into both ends.
    pub fn split(mut self) -> Result<(ReadEnd, WriteEnd)> {
        let reader = self.take_reader()?;
        let writer = self.take_writer()?;
        Ok((reader, writer))
    }

    /// Whether this process still holds the given end.
    pub fn holds(&self, endpoint: Endpoint) -> bool {
        match endpoint {
            Endpoint::Read => self.reader.is_some(),
            Endpoint::Write => self.writer.is_some(),
        }
    }
}

/// The read end of a pipe. Closed on drop.
#[derive(Debug)]
pub struct ReadEnd {
    file: File,
}

/// The write end of a pipe. Closed on drop.
#[derive(Debug)]
pub struct WriteEnd {
    file: File,
}

impl From<OwnedFd> for ReadEnd {
    fn from(fd: OwnedFd) -> Self {
        Self {
            file: File::from(fd),
        }
    }
}

impl From<OwnedFd> for WriteEnd {
    fn from(fd: OwnedFd) -> Self {
        Self {
            file: File::from(fd),
        }
    }
}

impl WriteEnd {
    /// Duplicate the descriptor (a second open copy of the same end).
    ///
    /// The reader only sees end-of-stream once every copy is closed.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            file: self.file.try_clone()?,
        })
    }
}

impl Read for ReadEnd {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for WriteEnd {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

impl AsFd for ReadEnd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl AsFd for WriteEnd {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}

impl AsRawFd for ReadEnd {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

impl AsRawFd for WriteEnd {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn bytes_arrive_in_write_order() {
        let (mut reader, mut writer) = Channel::open().unwrap().split().unwrap();

        writer.write_all(b"first").unwrap();
        writer.write_all(b"second").unwrap();
        drop(writer);

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"firstsecond");
    }

    #[test]
    fn closing_writer_signals_end_of_stream() {
        let mut channel = Channel::open().unwrap();
        let mut reader = channel.take_reader().unwrap();
        channel.close();

        let mut buf = [0u8; 4];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn take_twice_reports_endpoint() {
        let mut channel = Channel::open().unwrap();
        let _writer = channel.take_writer().unwrap();

        assert!(!channel.holds(Endpoint::Write));
        assert!(channel.holds(Endpoint::Read));
        assert!(matches!(
            channel.take_writer(),
            Err(ChannelError::EndpointTaken(Endpoint::Write))
        ));
    }

    #[test]
    fn lingering_writer_copy_blocks_end_of_stream() {
        let (mut reader, writer) = Channel::open().unwrap().split().unwrap();
        let lingering = writer.try_clone().unwrap();
        drop(writer);

        let (tx, rx) = mpsc::channel();
        let handle = std::thread::spawn(move || {
            let mut out = Vec::new();
            let result = reader.read_to_end(&mut out).map(|_| out.len());
            let _ = tx.send(result);
        });

        assert!(
            matches!(
                rx.recv_timeout(Duration::from_millis(300)),
                Err(mpsc::RecvTimeoutError::Timeout)
            ),
            "reader must not see end-of-stream while a write copy is open"
        );

        drop(lingering);
        let read = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("reader should finish once the last write copy closes")
            .unwrap();
        assert_eq!(read, 0);
        handle.join().unwrap();
    }

    #[test]
    fn write_after_reader_closed_fails() {
        let (reader, mut writer) = Channel::open().unwrap().split().unwrap();
        drop(reader);

        let err = writer.write(&[0u8; 4]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
