/// Utility functions shared by the session, planner and cursor
///
/// This module provides host-string building, local-server detection and
/// fallible buffer allocation that reports exhaustion as a resource error.
use crate::constants::LOCAL_SERVERNAMES;
use crate::error::{Result, TdsError};

/// Build the address passed to the client's open call.
///
/// Returns `servername` alone, or `servername:port` when a port is set.
pub fn host_string(servername: &str, port: Option<u16>) -> String {
    match port {
        Some(port) => format!("{servername}:{port}"),
        None => servername.to_string(),
    }
}

/// True for the loopback address and the literal `localhost`.
///
/// Compared exactly; `LOCALHOST` or `127.0.0.2` count as remote.
pub fn is_local_server(servername: &str) -> bool {
    LOCAL_SERVERNAMES.contains(&servername)
}

/// Allocate a zeroed byte buffer of `len` bytes.
///
/// Returns a resource error naming `what` instead of aborting the process
/// when the allocation cannot be satisfied.
pub fn alloc_buffer(len: usize, what: &'static str) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| TdsError::Allocation { what })?;
    buffer.resize(len, 0);
    Ok(buffer)
}

/// Allocate an empty vector with room for `capacity` items.
pub fn alloc_vec<T>(capacity: usize, what: &'static str) -> Result<Vec<T>> {
    let mut items = Vec::new();
    items
        .try_reserve_exact(capacity)
        .map_err(|_| TdsError::Allocation { what })?;
    Ok(items)
}
