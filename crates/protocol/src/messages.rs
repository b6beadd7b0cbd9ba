use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A remote call issued by the client.
///
/// Paths are caller-supplied strings interpreted relative to the server's
/// working root; no normalization is applied on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    /// Stops the server from accepting new calls.
    Shutdown,
    /// Lists the entries of a directory.
    Dir { path: String },
    /// Creates a single directory level.
    Mkdir { path: String },
    /// Removes an empty directory.
    Rmdir { path: String },
    /// Removes a regular file.
    Rm { path: String },
    /// Checks that the parent exists and the path is not a directory.
    FilepathValid { path: String },
    /// Checks that the path names a regular file.
    FileExists { path: String },
    /// Returns the byte length of a file (0 if absent).
    GetFileLength { path: String },
    /// Appends the first `count` bytes of `data` to a file.
    ///
    /// `data` is base64-encoded in JSON.
    Write {
        path: String,
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
        count: usize,
    },
    /// Reads up to one chunk starting at `offset`.
    Read { path: String, offset: u64 },
}

impl Request {
    /// Wire name of the call, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Request::Shutdown => "shutdown",
            Request::Dir { .. } => "dir",
            Request::Mkdir { .. } => "mkdir",
            Request::Rmdir { .. } => "rmdir",
            Request::Rm { .. } => "rm",
            Request::FilepathValid { .. } => "filepathValid",
            Request::FileExists { .. } => "fileExists",
            Request::GetFileLength { .. } => "getFileLength",
            Request::Write { .. } => "write",
            Request::Read { .. } => "read",
        }
    }

    /// The path argument, if the call takes one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Request::Shutdown => None,
            Request::Dir { path }
            | Request::Mkdir { path }
            | Request::Rmdir { path }
            | Request::Rm { path }
            | Request::FilepathValid { path }
            | Request::FileExists { path }
            | Request::GetFileLength { path }
            | Request::Write { path, .. }
            | Request::Read { path, .. } => Some(path),
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// The server's reply to a [`Request`].
///
/// Invalid arguments (missing parent, not a file, ...) are reported through
/// `Bool`, `Length` or `Entries` results; `Error` is reserved for I/O faults
/// and malformed requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Response {
    /// Acknowledges a call with no result (shutdown).
    Ack,
    /// Boolean result (mkdir, rmdir, rm, filepathValid, fileExists, write).
    Bool { value: bool },
    /// File length result.
    Length { value: u64 },
    /// Directory listing; `None` means the path is not a valid directory.
    Entries { entries: Option<Vec<String>> },
    /// Chunk data returned by a read (base64 in JSON).
    Data {
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },
    /// The call could not be served.
    Error { code: i32, message: String },
}

impl Response {
    /// Short label of the response kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Response::Ack => "ack",
            Response::Bool { .. } => "bool",
            Response::Length { .. } => "length",
            Response::Entries { .. } => "entries",
            Response::Data { .. } => "data",
            Response::Error { .. } => "error",
        }
    }
}

// ---------------------------------------------------------------------------
// Serde helpers
// ---------------------------------------------------------------------------

mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        STANDARD.encode(data).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_request_encodes_data_as_base64() {
        let req = Request::Write {
            path: "/a.bin".into(),
            data: b"Hello".to_vec(),
            count: 5,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"type\":\"write\""));
        assert!(json.contains("SGVsbG8="));

        let parsed: Request = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, req);
    }

    #[test]
    fn camel_case_call_names() {
        let json = serde_json::to_string(&Request::FilepathValid { path: "x".into() }).unwrap();
        assert!(json.contains("\"type\":\"filepathValid\""));

        let json = serde_json::to_string(&Request::GetFileLength { path: "x".into() }).unwrap();
        assert!(json.contains("\"type\":\"getFileLength\""));
    }

    #[test]
    fn shutdown_has_no_fields() {
        let json = serde_json::to_string(&Request::Shutdown).unwrap();
        assert_eq!(json, r#"{"type":"shutdown"}"#);
        assert_eq!(Request::Shutdown.path(), None);
    }

    #[test]
    fn request_name_matches_wire_tag() {
        let requests = [
            Request::Dir { path: "/".into() },
            Request::Read {
                path: "f".into(),
                offset: 2048,
            },
            Request::Rmdir { path: "d".into() },
        ];
        for req in requests {
            let value = serde_json::to_value(&req).unwrap();
            assert_eq!(value["type"], req.name());
        }
    }

    #[test]
    fn absent_listing_serializes_as_null() {
        let resp = Response::Entries { entries: None };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"type":"entries","entries":null}"#);

        let parsed: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, resp);
    }

    #[test]
    fn empty_listing_differs_from_absent() {
        let empty = serde_json::to_string(&Response::Entries {
            entries: Some(vec![]),
        })
        .unwrap();
        assert!(empty.contains("\"entries\":[]"));
    }

    #[test]
    fn invalid_base64_rejected() {
        let json = r#"{"type":"data","data":"@@not base64@@"}"#;
        assert!(serde_json::from_str::<Response>(json).is_err());
    }
}
