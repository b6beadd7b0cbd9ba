use std::time::Duration;

use rfshare_protocol::{ProtocolError, Request, RequestFrame, Response, ResponseFrame};
use rfshare_protocol::{read_frame, write_frame};
use rfshare_transfer::RemoteFs;
use tokio::io::{BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::ClientError;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Bound on establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Bound on a single request/response round trip.
    pub call_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            call_timeout: Duration::from_secs(60),
        }
    }
}

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    next_id: u64,
    /// Set once a call was abandoned mid-flight; the stream may hold a stale
    /// reply and is no longer usable.
    broken: bool,
}

/// A connection to an rfshare server.
///
/// Calls are serialized: each one holds the connection until its reply
/// arrives.
pub struct RemoteClient {
    conn: Mutex<Connection>,
    call_timeout: Duration,
}

impl RemoteClient {
    /// Connects to `server` (`host:port`).
    pub async fn connect(server: &str, config: ClientConfig) -> Result<Self, ClientError> {
        let stream = match tokio::time::timeout(config.connect_timeout, TcpStream::connect(server))
            .await
        {
            Ok(Ok(s)) => s,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(ClientError::Timeout("connect")),
        };
        stream.set_nodelay(true)?;
        info!(server, "connected to file server");

        let (reader, writer) = stream.into_split();
        Ok(Self {
            conn: Mutex::new(Connection {
                reader: BufReader::new(reader),
                writer: BufWriter::new(writer),
                next_id: 1,
                broken: false,
            }),
            call_timeout: config.call_timeout,
        })
    }

    /// Sends one request and waits for its reply.
    ///
    /// `Error` replies become [`ClientError::Remote`].
    pub async fn call(&self, request: Request) -> Result<Response, ClientError> {
        let mut conn = self.conn.lock().await;
        if conn.broken {
            return Err(ClientError::Disconnected);
        }

        let id = conn.next_id;
        conn.next_id += 1;
        let name = request.name();
        let frame = RequestFrame::new(id, request);

        let exchange = async {
            write_frame(&mut conn.writer, &frame).await?;
            read_frame::<_, ResponseFrame>(&mut conn.reader).await
        };
        let reply = match tokio::time::timeout(self.call_timeout, exchange).await {
            Ok(Ok(Some(reply))) => reply,
            Ok(Ok(None)) => {
                conn.broken = true;
                return Err(ClientError::Disconnected);
            }
            Ok(Err(e)) => {
                conn.broken = true;
                return Err(e.into());
            }
            Err(_) => {
                warn!(id, call = name, "call timed out");
                conn.broken = true;
                return Err(ClientError::Timeout(name));
            }
        };

        if reply.id != id {
            conn.broken = true;
            return Err(ProtocolError::Protocol(format!(
                "reply id {} does not match request id {id}",
                reply.id
            ))
            .into());
        }
        debug!(id, call = name, reply = reply.response.kind(), "call complete");

        match reply.response {
            Response::Error { code, message } => Err(ClientError::Remote { code, message }),
            response => Ok(response),
        }
    }

    async fn call_bool(&self, request: Request) -> Result<bool, ClientError> {
        let call = request.name();
        match self.call(request).await? {
            Response::Bool { value } => Ok(value),
            other => Err(unexpected(call, &other)),
        }
    }

    /// Asks the server to stop listening.
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.call(Request::Shutdown).await? {
            Response::Ack => Ok(()),
            other => Err(unexpected("shutdown", &other)),
        }
    }

    /// Lists a directory; `None` if the path is not a readable directory.
    pub async fn dir(&self, path: &str) -> Result<Option<Vec<String>>, ClientError> {
        let request = Request::Dir { path: path.into() };
        match self.call(request).await? {
            Response::Entries { entries } => Ok(entries),
            other => Err(unexpected("dir", &other)),
        }
    }

    pub async fn mkdir(&self, path: &str) -> Result<bool, ClientError> {
        self.call_bool(Request::Mkdir { path: path.into() }).await
    }

    pub async fn rmdir(&self, path: &str) -> Result<bool, ClientError> {
        self.call_bool(Request::Rmdir { path: path.into() }).await
    }

    pub async fn rm(&self, path: &str) -> Result<bool, ClientError> {
        self.call_bool(Request::Rm { path: path.into() }).await
    }

    pub async fn filepath_valid(&self, path: &str) -> Result<bool, ClientError> {
        self.call_bool(Request::FilepathValid { path: path.into() })
            .await
    }

    pub async fn file_exists(&self, path: &str) -> Result<bool, ClientError> {
        self.call_bool(Request::FileExists { path: path.into() })
            .await
    }

    pub async fn file_length(&self, path: &str) -> Result<u64, ClientError> {
        let request = Request::GetFileLength { path: path.into() };
        match self.call(request).await? {
            Response::Length { value } => Ok(value),
            other => Err(unexpected("getFileLength", &other)),
        }
    }

    pub async fn write(&self, path: &str, data: &[u8], count: usize) -> Result<bool, ClientError> {
        self.call_bool(Request::Write {
            path: path.into(),
            data: data.to_vec(),
            count,
        })
        .await
    }

    pub async fn read(&self, path: &str, offset: u64) -> Result<Vec<u8>, ClientError> {
        let request = Request::Read {
            path: path.into(),
            offset,
        };
        match self.call(request).await? {
            Response::Data { data } => Ok(data),
            other => Err(unexpected("read", &other)),
        }
    }
}

fn unexpected(call: &'static str, response: &Response) -> ClientError {
    ClientError::UnexpectedResponse {
        call,
        got: response.kind(),
    }
}

impl RemoteFs for RemoteClient {
    type Error = ClientError;

    async fn path_valid(&self, path: &str) -> Result<bool, Self::Error> {
        self.filepath_valid(path).await
    }

    async fn file_exists(&self, path: &str) -> Result<bool, Self::Error> {
        RemoteClient::file_exists(self, path).await
    }

    async fn file_length(&self, path: &str) -> Result<u64, Self::Error> {
        RemoteClient::file_length(self, path).await
    }

    async fn remove_file(&self, path: &str) -> Result<bool, Self::Error> {
        self.rm(path).await
    }

    async fn write_chunk(&self, path: &str, data: &[u8], count: usize) -> Result<bool, Self::Error> {
        self.write(path, data, count).await
    }

    async fn read_chunk(&self, path: &str, offset: u64) -> Result<Vec<u8>, Self::Error> {
        self.read(path, offset).await
    }
}
