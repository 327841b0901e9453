//! Positioned-read sources for pack data.
//!
//! A pack reader never keeps a shared cursor: every chunk header and every
//! entry body is fetched with an independent positioned read. Any type
//! implementing [`PackSource`] can therefore be shared between threads (when
//! it is `Sync`) and read concurrently.

use std::fs::File;
use std::io;
use std::sync::Arc;

/// Random-access byte storage a pack can be read from.
pub trait PackSource {
    /// Total length of the stored bytes.
    fn len(&self) -> io::Result<u64>;

    /// Fill `buf` with the bytes starting at `offset`.
    ///
    /// Fails with [`io::ErrorKind::UnexpectedEof`] if the source ends before
    /// `buf` is full.
    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()>;

    /// Whether the source holds no bytes.
    fn is_empty(&self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn eof() -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, "read past end of pack source")
}

impl PackSource for [u8] {
    fn len(&self) -> io::Result<u64> {
        Ok(<[u8]>::len(self) as u64)
    }

    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        let start = usize::try_from(offset).map_err(|_| eof())?;
        let end = start.checked_add(buf.len()).ok_or_else(eof)?;
        let src = self.get(start..end).ok_or_else(eof)?;
        buf.copy_from_slice(src);
        Ok(())
    }
}

impl PackSource for Vec<u8> {
    fn len(&self) -> io::Result<u64> {
        Ok(self.as_slice().len() as u64)
    }

    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        self.as_slice().read_exact_at(buf, offset)
    }
}

impl<T: PackSource + ?Sized> PackSource for &T {
    fn len(&self) -> io::Result<u64> {
        (**self).len()
    }

    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        (**self).read_exact_at(buf, offset)
    }
}

impl<T: PackSource + ?Sized> PackSource for Arc<T> {
    fn len(&self) -> io::Result<u64> {
        (**self).len()
    }

    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        (**self).read_exact_at(buf, offset)
    }
}

impl PackSource for File {
    fn len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    #[cfg(unix)]
    fn read_exact_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        std::os::unix::fs::FileExt::read_exact_at(self, buf, offset)
    }

    #[cfg(windows)]
    fn read_exact_at(&self, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
        use std::os::windows::fs::FileExt;

        while !buf.is_empty() {
            match self.seek_read(buf, offset) {
                Ok(0) => return Err(eof()),
                Ok(n) => {
                    let rest = buf;
                    buf = &mut rest[n..];
                    offset += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_slice_reads() {
        let data: &[u8] = b"0123456789";
        let mut buf = [0u8; 4];
        PackSource::read_exact_at(data, &mut buf, 3).unwrap();
        assert_eq!(&buf, b"3456");
        assert_eq!(PackSource::len(data).unwrap(), 10);

        let err = PackSource::read_exact_at(data, &mut buf, 8).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let err = PackSource::read_exact_at(data, &mut buf, u64::MAX).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_vec_and_arc() {
        let data = Arc::new(b"abcdef".to_vec());
        let mut buf = [0u8; 2];
        PackSource::read_exact_at(&data, &mut buf, 4).unwrap();
        assert_eq!(&buf, b"ef");
        assert!(!PackSource::is_empty(&data).unwrap());
        assert!(PackSource::is_empty(&Vec::<u8>::new()).unwrap());
    }

    #[test]
    fn test_file_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.bin");
        {
            let mut f = File::create(&path).unwrap();
            f.write_all(b"positioned reads").unwrap();
        }

        let file = File::open(&path).unwrap();
        assert_eq!(PackSource::len(&file).unwrap(), 16);
        let mut buf = [0u8; 5];
        PackSource::read_exact_at(&file, &mut buf, 11).unwrap();
        assert_eq!(&buf, b"reads");
        assert!(PackSource::read_exact_at(&file, &mut buf, 12).is_err());
    }
}
