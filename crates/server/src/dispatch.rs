use rfshare_file_service::{FileService, FileServiceError};
use rfshare_protocol::{Request, RequestFrame, Response, ResponseFrame};
use tracing::{debug, warn};

/// Serves one request against the file service.
///
/// `shutdown` is acknowledged here; stopping the listener is up to the
/// caller once the reply has been written.
pub async fn dispatch(service: &FileService, frame: &RequestFrame) -> ResponseFrame {
    debug!(id = frame.id, call = frame.request.name(), path = ?frame.request.path(), "request");

    let response = match &frame.request {
        Request::Shutdown => Response::Ack,
        Request::Dir { path } => Response::Entries {
            entries: service.list_directory(path).await,
        },
        Request::Mkdir { path } => Response::Bool {
            value: service.create_directory(path).await,
        },
        Request::Rmdir { path } => Response::Bool {
            value: service.remove_directory(path).await,
        },
        Request::Rm { path } => Response::Bool {
            value: service.remove_file(path).await,
        },
        Request::FilepathValid { path } => Response::Bool {
            value: service.path_valid(path).await,
        },
        Request::FileExists { path } => Response::Bool {
            value: service.file_exists(path).await,
        },
        Request::GetFileLength { path } => Response::Length {
            value: service.file_length(path).await,
        },
        Request::Write { path, data, count } => Response::Bool {
            value: service.write_chunk(path, data, *count).await,
        },
        Request::Read { path, offset } => match service.read_chunk(path, *offset).await {
            Ok(data) => Response::Data { data },
            Err(e) => {
                warn!(path, offset, "read failed: {e}");
                return match e {
                    FileServiceError::Io(_) => frame.reply_io_error(e.to_string()),
                    FileServiceError::NotAFile(_) | FileServiceError::InvalidPath(_) => {
                        frame.reply_bad_request(e.to_string())
                    }
                };
            }
        },
    };

    frame.reply(response)
}
