// Byte streams the session can run over.
//
// Online games use a buffered TCP connection. Offline (stateless) games are
// driven through stdin/stdout by a relay that restarts the process for
// every message, so the session sees a `Duplex` of the two pipes.

use std::io::{self, BufRead, Read, Stdout, Write};
use std::net::TcpStream;
use std::time::Duration;

use bufstream::BufStream;
use tracing::info;

/// Glue a reader and a writer into one bidirectional stream.
#[derive(Debug)]
pub struct Duplex<R, W> {
    pub reader: R,
    pub writer: W,
}

impl<R, W> Duplex<R, W> {
    pub fn new(reader: R, writer: W) -> Duplex<R, W> {
        Duplex { reader, writer }
    }
}

impl<R: Read, W> Read for Duplex<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl<R: BufRead, W> BufRead for Duplex<R, W> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.reader.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.reader.consume(amt)
    }
}

impl<R, W: Write> Write for Duplex<R, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

pub type Stdio = Duplex<io::StdinLock<'static>, Stdout>;

pub fn stdio() -> Stdio {
    Duplex::new(io::stdin().lock(), io::stdout())
}

/// Connect to a game server. `read_timeout` of `None` blocks forever.
pub fn connect(
    server: &str,
    port: u16,
    read_timeout: Option<Duration>,
) -> io::Result<BufStream<TcpStream>> {
    info!("connecting to {}:{}", server, port);
    let connection = TcpStream::connect((server, port))?;
    connection.set_read_timeout(read_timeout)?;
    connection.set_nodelay(true)?;
    Ok(BufStream::new(connection))
}
