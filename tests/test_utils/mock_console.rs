//! Mock Console Implementation for Testing
//!
//! A scripted TCP server that speaks the console shape the client drives:
//! newline nudge, username/password login, echoed commands, and
//! prompt-terminated responses. Every received command line is recorded so
//! tests can assert on exactly what the client sent.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use promptline::ClientConfig;

/// Credentials the mock accepts by default
pub const USERNAME: &str = "jcliadmin";
pub const PASSWORD: &str = "jclipwd";

/// How the mock handles the login dialogue
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AuthMode {
    /// Prompt for username and password, accept the default credentials
    #[default]
    Normal,
    /// Prompt normally but reject whatever is sent
    Reject,
    /// Skip login prompts and go straight to the top prompt
    Skip,
    /// Accept the connection and never send a byte
    Silent,
}

/// How a scripted response ends
#[derive(Debug, Clone)]
pub enum Ending {
    /// Return to the top prompt
    Top,
    /// Stay inside a nested editor
    Submenu,
    /// Emit a commit marker without any prompt
    Marker(String),
    /// Say goodbye and close the connection
    Close,
    /// Echo the command and body, then go quiet without any boundary
    Silence,
}

/// One scripted response
#[derive(Debug, Clone)]
pub struct Reply {
    pub body: String,
    pub ending: Ending,
}

impl Reply {
    pub fn top(body: &str) -> Self {
        Self {
            body: body.to_string(),
            ending: Ending::Top,
        }
    }

    pub fn submenu(body: &str) -> Self {
        Self {
            body: body.to_string(),
            ending: Ending::Submenu,
        }
    }

    pub fn marker(body: &str, reference: &str) -> Self {
        Self {
            body: body.to_string(),
            ending: Ending::Marker(format!("Session ref: {}", reference)),
        }
    }

    pub fn close(body: &str) -> Self {
        Self {
            body: body.to_string(),
            ending: Ending::Close,
        }
    }

    pub fn silence() -> Self {
        Self {
            body: String::new(),
            ending: Ending::Silence,
        }
    }
}

/// Scripted console behavior
#[derive(Debug, Clone, Default)]
pub struct MockConsole {
    auth: AuthMode,
    replies: HashMap<String, Reply>,
    /// Write responses in pieces of this many bytes to simulate fragmentation
    chunk_size: Option<usize>,
    /// Push a stale submenu prompt right after the login completes
    stranded: bool,
}

impl MockConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auth(mut self, mode: AuthMode) -> Self {
        self.auth = mode;
        self
    }

    /// Script the response for one exact command line
    pub fn respond(mut self, command: &str, reply: Reply) -> Self {
        self.replies.insert(command.to_string(), reply);
        self
    }

    /// Deliver all responses fragmented into `size`-byte writes
    pub fn chunked(mut self, size: usize) -> Self {
        self.chunk_size = Some(size);
        self
    }

    /// Leave the console stuck inside a nested editor after login
    pub fn stranded(mut self) -> Self {
        self.stranded = true;
        self
    }

    /// Bind a listener and serve connections until the server is dropped
    pub async fn spawn(self) -> MockServer {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock console");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let received = Arc::new(Mutex::new(Vec::new()));

        let script = Arc::new(self);
        let log = received.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let script = script.clone();
                let log = log.clone();
                tokio::spawn(async move {
                    script.serve(stream, log).await;
                });
            }
        });

        MockServer {
            addr,
            received,
            handle,
        }
    }

    async fn serve(&self, mut stream: TcpStream, log: Arc<Mutex<Vec<String>>>) {
        let mut pending = String::new();

        if self.auth == AuthMode::Silent {
            // Swallow everything until the client gives up
            let mut sink = [0u8; 256];
            while let Ok(n) = stream.read(&mut sink).await {
                if n == 0 {
                    return;
                }
            }
            return;
        }

        // Wait for the client's newline nudge
        if read_line(&mut stream, &mut pending).await.is_none() {
            return;
        }

        match self.auth {
            AuthMode::Normal | AuthMode::Reject => {
                self.send(&mut stream, "Authentication required.\r\nUsername: ")
                    .await;
                let Some(username) = read_line(&mut stream, &mut pending).await else {
                    return;
                };
                self.send(&mut stream, "Password: ").await;
                let Some(password) = read_line(&mut stream, &mut pending).await else {
                    return;
                };

                let accepted = self.auth == AuthMode::Normal
                    && username == USERNAME
                    && password == PASSWORD;
                if !accepted {
                    self.send(&mut stream, "Incorrect Username/Password.\r\n")
                        .await;
                    // Keep the connection open; the client aborts on the marker
                    let mut sink = [0u8; 256];
                    while let Ok(n) = stream.read(&mut sink).await {
                        if n == 0 {
                            return;
                        }
                    }
                    return;
                }

                self.send(&mut stream, "Welcome to the management console\r\njcli : ")
                    .await;
            }
            AuthMode::Skip => {
                self.send(&mut stream, "jcli : ").await;
            }
            AuthMode::Silent => unreachable!(),
        }

        if self.stranded {
            // A previous admin left a nested editor open
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.send(&mut stream, "> ").await;
        }

        // Command loop
        loop {
            let Some(command) = read_line(&mut stream, &mut pending).await else {
                return;
            };
            log.lock().unwrap().push(command.clone());

            let reply = self.replies.get(&command).cloned().unwrap_or_else(|| {
                if command == "quit" {
                    Reply::close("Good bye !")
                } else {
                    Reply::top("")
                }
            });

            let mut response = format!("{}\r\n", command);
            if !reply.body.is_empty() {
                response.push_str(&reply.body);
                response.push_str("\r\n");
            }

            match reply.ending {
                Ending::Top => {
                    response.push_str("jcli : ");
                    self.send(&mut stream, &response).await;
                }
                Ending::Submenu => {
                    response.push_str("> ");
                    self.send(&mut stream, &response).await;
                }
                Ending::Marker(marker) => {
                    response.push_str(&marker);
                    response.push_str("\r\n");
                    self.send(&mut stream, &response).await;
                }
                Ending::Close => {
                    self.send(&mut stream, &response).await;
                    let _ = stream.shutdown().await;
                    return;
                }
                Ending::Silence => {
                    self.send(&mut stream, &response).await;
                }
            }
        }
    }

    async fn send(&self, stream: &mut TcpStream, text: &str) {
        match self.chunk_size {
            Some(size) if size > 0 => {
                let bytes = text.as_bytes();
                for piece in bytes.chunks(size) {
                    if stream.write_all(piece).await.is_err() {
                        return;
                    }
                    let _ = stream.flush().await;
                    tokio::time::sleep(Duration::from_millis(2)).await;
                }
            }
            _ => {
                let _ = stream.write_all(text.as_bytes()).await;
                let _ = stream.flush().await;
            }
        }
    }
}

/// Read one newline-terminated line, stripping the trailing CR
async fn read_line(stream: &mut TcpStream, pending: &mut String) -> Option<String> {
    loop {
        if let Some(idx) = pending.find('\n') {
            let line = pending[..idx].trim_end_matches('\r').to_string();
            pending.drain(..=idx);
            return Some(line);
        }

        let mut buf = [0u8; 512];
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return None,
            Ok(n) => pending.push_str(&String::from_utf8_lossy(&buf[..n])),
        }
    }
}

/// Handle to a running mock console
pub struct MockServer {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<String>>>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockServer {
    /// Port the mock is listening on
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Every command line received so far, in arrival order
    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    /// Client configuration pointing at this mock
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        config.connection.host = "127.0.0.1".to_string();
        config.connection.port = self.port();
        config.connection.username = USERNAME.to_string();
        config.connection.password = PASSWORD.into();
        config.connection.idle_timeout_ms = 2000;
        // Tests do not need the real settle pause, and most sequence tests
        // assert on caller commands only
        config.runner.settle_delay_ms = 0;
        config.runner.include_finalizer_outputs = false;
        config
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_login_and_echo() {
        let server = MockConsole::new().spawn().await;

        let mut stream = TcpStream::connect(("127.0.0.1", server.port()))
            .await
            .unwrap();
        stream.write_all(b"\n").await.unwrap();

        let mut pending = String::new();
        let mut buf = [0u8; 512];

        // Username prompt
        let n = stream.read(&mut buf).await.unwrap();
        pending.push_str(&String::from_utf8_lossy(&buf[..n]));
        assert!(pending.contains("Username:"));

        stream.write_all(b"jcliadmin\n").await.unwrap();
        let n = stream.read(&mut buf).await.unwrap();
        assert!(String::from_utf8_lossy(&buf[..n]).contains("Password:"));

        stream.write_all(b"jclipwd\n").await.unwrap();
        let mut welcome = String::new();
        let n = stream.read(&mut buf).await.unwrap();
        welcome.push_str(&String::from_utf8_lossy(&buf[..n]));
        assert!(welcome.contains("jcli :"));

        // Commands are echoed and recorded
        stream.write_all(b"user -l\n").await.unwrap();
        let n = stream.read(&mut buf).await.unwrap();
        let response = String::from_utf8_lossy(&buf[..n]).to_string();
        assert!(response.starts_with("user -l\r\n"));
        assert!(response.ends_with("jcli : "));
        assert_eq!(server.received(), vec!["user -l".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_rejects_credentials() {
        let server = MockConsole::new().auth(AuthMode::Reject).spawn().await;

        let mut stream = TcpStream::connect(("127.0.0.1", server.port()))
            .await
            .unwrap();
        stream.write_all(b"\n").await.unwrap();

        let mut buf = [0u8; 512];
        let _ = stream.read(&mut buf).await.unwrap();
        stream.write_all(b"jcliadmin\n").await.unwrap();
        let _ = stream.read(&mut buf).await.unwrap();
        stream.write_all(b"jclipwd\n").await.unwrap();

        let n = stream.read(&mut buf).await.unwrap();
        assert!(String::from_utf8_lossy(&buf[..n]).contains("Incorrect Username/Password"));
    }

    #[tokio::test]
    async fn test_mock_scripted_submenu() {
        let server = MockConsole::new()
            .auth(AuthMode::Skip)
            .respond("group -a", Reply::submenu("Adding a new Group"))
            .spawn()
            .await;

        let mut stream = TcpStream::connect(("127.0.0.1", server.port()))
            .await
            .unwrap();
        stream.write_all(b"\n").await.unwrap();

        let mut buf = [0u8; 512];
        let _ = stream.read(&mut buf).await.unwrap(); // top prompt

        stream.write_all(b"group -a\n").await.unwrap();
        let n = stream.read(&mut buf).await.unwrap();
        let response = String::from_utf8_lossy(&buf[..n]).to_string();
        assert!(response.contains("Adding a new Group"));
        assert!(response.trim_end().ends_with('>'));
    }
}
