use serde::{Deserialize, Serialize};

use crate::constants::{ERR_BAD_REQUEST, ERR_IO};
use crate::messages::{Request, Response};

/// A request tagged with a connection-local id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFrame {
    pub id: u64,
    pub request: Request,
}

/// A response carrying the id of the request it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFrame {
    pub id: u64,
    pub response: Response,
}

impl RequestFrame {
    pub fn new(id: u64, request: Request) -> Self {
        Self { id, request }
    }

    /// Creates a response frame for this request.
    pub fn reply(&self, response: Response) -> ResponseFrame {
        ResponseFrame {
            id: self.id,
            response,
        }
    }

    /// Creates an error response for this request.
    pub fn reply_error(&self, code: i32, message: impl Into<String>) -> ResponseFrame {
        self.reply(Response::Error {
            code,
            message: message.into(),
        })
    }

    /// Error response for an I/O fault on the server.
    pub fn reply_io_error(&self, message: impl Into<String>) -> ResponseFrame {
        self.reply_error(ERR_IO, message)
    }

    /// Error response for a request that cannot be honoured as sent.
    pub fn reply_bad_request(&self, message: impl Into<String>) -> ResponseFrame {
        self.reply_error(ERR_BAD_REQUEST, message)
    }
}
