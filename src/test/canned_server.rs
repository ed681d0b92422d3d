use std::io::{self, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

///
/// A one-shot HTTP server on localhost. It accepts a single connection, reads
/// the request head, and answers with a fixed response (or stalls).
///
pub struct CannedServer {
    url: String,
    handle: JoinHandle<io::Result<String>>,
}

impl CannedServer {
    /// Answers with `status` and a JSON `body`.
    pub fn respond(status: u16, reason: &str, body: &str) -> io::Result<CannedServer> {
        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reason,
            body.len(),
            body
        );
        CannedServer::spawn(move |stream| stream.write_all(response.as_bytes()))
    }

    /// Holds the connection open without answering for `delay`.
    pub fn stall(delay: Duration) -> io::Result<CannedServer> {
        CannedServer::spawn(move |_| {
            thread::sleep(delay);
            Ok(())
        })
    }

    fn spawn<F>(reply: F) -> io::Result<CannedServer>
    where
        F: FnOnce(&mut std::net::TcpStream) -> io::Result<()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let url = format!("http://{}/API/jsonI.php", listener.local_addr()?);
        let handle = thread::spawn(move || -> io::Result<String> {
            let (mut stream, _) = listener.accept()?;
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let read = stream.read(&mut buf)?;
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..read]);
            }
            reply(&mut stream)?;
            stream.flush()?;
            Ok(String::from_utf8_lossy(&request).into_owned())
        });
        Ok(CannedServer { url, handle })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Waits for the server thread and returns the raw request head it saw.
    pub fn request(self) -> io::Result<String> {
        self.handle
            .join()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "canned server panicked"))?
    }
}
