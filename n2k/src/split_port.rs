use std::io::{Read, Result, Write};

/// Glues independent read and write halves into one port.
///
/// Serial devices opened twice (once for reading, once for writing) and
/// file replay (a capture file for reading, a sink for writing) both come
/// in halves; the adapters want a single `Read + Write` value.
pub struct SplitPort<R, W> {
    reader: R,
    writer: W,
}

impl<R: Read, W: Write> SplitPort<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R: Read, W> Read for SplitPort<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.reader.read(buf)
    }
}

impl<R, W: Write> Write for SplitPort<R, W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_halves_stay_independent() {
        let mut port = SplitPort::new(std::io::Cursor::new(vec![1u8, 2, 3]), Vec::new());

        let mut buf = [0u8; 3];
        port.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);

        port.write_all(&[9, 9]).unwrap();
        assert_eq!(port.writer, vec![9, 9]);
    }
}
