//! Standard exit codes (BSD sysexits.h compatible)

/// Command line usage error, including a blank location
pub const USAGE: i32 = 64;

/// Rule data error (stale path, malformed rule file, incomplete rule)
pub const DATAERR: i32 = 65;

/// No rules, unknown location, or input closed mid-session
pub const NOINPUT: i32 = 66;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
