/// Fixed chunk size for every read/write call (not negotiated).
pub const CHUNK_SIZE: usize = 1024;

/// Maximum encoded frame body size (1 MiB).
///
/// A base64-encoded chunk plus its JSON envelope is far below this; the
/// limit only guards against a corrupt length prefix allocating unbounded
/// memory.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Error code: the request was malformed or referenced an unusable path.
pub const ERR_BAD_REQUEST: i32 = 400;

/// Error code: the server hit an I/O fault while serving the call.
pub const ERR_IO: i32 = 500;

/// Error code: the server is shutting down and no longer serves calls.
pub const ERR_SHUTTING_DOWN: i32 = 503;
