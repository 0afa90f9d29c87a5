/// Capability traits for the DB-Library style row-cursor client.
///
/// The wrapper never speaks TDS itself. It drives a client library through
/// these traits: [`Client`] owns the process-wide runtime and hands out login
/// records and connections, [`LoginRecord`] carries credentials, and
/// [`Connection`] is the two-phase compile/execute then fetch-rows cursor.
///
/// Column indices are zero-based. Bindings over a real DB-Library add one.
use std::fmt;
use std::sync::Arc;

use crate::hooks::ProtocolHandlers;

/// Generic failure return code (`FAIL`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fail;

/// Outcome of retrieving the next result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsStatus {
    Succeed,
    NoMoreResults,
    Fail,
    Unknown(i32),
}

/// Outcome of fetching the next row of the current result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    RegularRow,
    NoMoreRows,
    BufferFull,
    Fail,
    /// Compute rows and codes this wrapper does not understand
    Unknown(i32),
}

/// Why a value conversion produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertFailure {
    /// The library reported `FAIL`
    Failed,
    /// The library reported a NULL pointer or bad data type (`-1`)
    NullOrBadType,
}

impl fmt::Display for ConvertFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertFailure::Failed => f.write_str("conversion failed"),
            ConvertFailure::NullOrBadType => f.write_str("NULL pointer or bad data type"),
        }
    }
}

/// Requested destination length for a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertLength {
    /// Null-terminate the output (`-1`)
    NullTerminated,
    /// Write exactly this many bytes
    Exact(usize),
}

/// Native column type tag as reported by the client library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag(pub i32);

impl TypeTag {
    pub const IMAGE: TypeTag = TypeTag(34);
    pub const TEXT: TypeTag = TypeTag(35);
    pub const VARBINARY: TypeTag = TypeTag(37);
    pub const VARCHAR: TypeTag = TypeTag(39);
    pub const BINARY: TypeTag = TypeTag(45);
    pub const CHAR: TypeTag = TypeTag(47);
    pub const INT1: TypeTag = TypeTag(48);
    pub const BIT: TypeTag = TypeTag(50);
    pub const INT2: TypeTag = TypeTag(52);
    pub const INT4: TypeTag = TypeTag(56);
    pub const REAL: TypeTag = TypeTag(59);
    pub const MONEY: TypeTag = TypeTag(60);
    pub const DATETIME: TypeTag = TypeTag(61);
    pub const FLT8: TypeTag = TypeTag(62);
    pub const DECIMAL: TypeTag = TypeTag(106);
    pub const NUMERIC: TypeTag = TypeTag(108);
    pub const INT8: TypeTag = TypeTag(127);

    pub fn is_character(self) -> bool {
        matches!(self, TypeTag::CHAR | TypeTag::VARCHAR | TypeTag::TEXT)
    }

    pub fn is_binary(self) -> bool {
        matches!(self, TypeTag::BINARY | TypeTag::VARBINARY)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Credential record filled in before opening a connection.
pub trait LoginRecord {
    fn set_user(&mut self, user: &str);
    fn set_password(&mut self, password: &str);
    fn set_charset(&mut self, charset: &str);
    fn set_language(&mut self, language: &str);
}

/// An open connection to the remote server.
pub trait Connection {
    fn use_database(&mut self, name: &str) -> Result<(), Fail>;

    /// Load query text into the command buffer.
    fn cmd(&mut self, query: &str) -> Result<(), Fail>;

    /// Send the command buffer to the server.
    fn sqlexec(&mut self) -> Result<(), Fail>;

    fn results(&mut self) -> ResultsStatus;

    fn next_row(&mut self) -> RowStatus;

    /// Rows affected or selected so far, `-1` when unknown.
    fn count(&self) -> i64;

    fn num_cols(&self) -> usize;

    fn col_name(&self, column: usize) -> Option<String>;

    fn col_type(&self, column: usize) -> TypeTag;

    fn data_len(&self, column: usize) -> usize;

    /// Raw bytes of the column in the current row; `None` is a null pointer.
    fn data(&self, column: usize) -> Option<&[u8]>;

    fn will_convert(&self, src: TypeTag, dst: TypeTag) -> bool;

    /// Convert `src` into `dest`, returning the number of bytes written, not
    /// counting a terminator.
    fn convert(
        &self,
        src_type: TypeTag,
        src: &[u8],
        dst_type: TypeTag,
        dest: &mut [u8],
        length: ConvertLength,
    ) -> Result<usize, ConvertFailure>;
}

/// Process-wide client library.
///
/// Handler installation is global in real DB-Library implementations: only
/// the handlers installed by the most recent session are live.
pub trait Client {
    type Login: LoginRecord;
    type Connection: Connection;

    fn init(&self) -> Result<(), Fail>;

    fn install_handlers(&self, handlers: Arc<dyn ProtocolHandlers>);

    fn new_login(&self) -> Option<Self::Login>;

    fn open(&self, login: &Self::Login, host: &str) -> Option<Self::Connection>;

    fn close(&self, connection: Self::Connection);

    fn free_login(&self, login: Self::Login);

    fn exit(&self);
}
