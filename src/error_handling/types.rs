use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    BadAddressFormat(String),
    BadPortsRange(String),
    StorageDirUnavailable(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::BadAddressFormat(e) => write!(f, "Address formatting error: {}", e),
            ConfigError::BadPortsRange(e) => write!(f, "Port range error: {}", e),
            ConfigError::StorageDirUnavailable(e) => write!(f, "Storage directory error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

#[derive(Debug)]
pub enum StorageError {
    CreateFailed,
    WriteFailed,
    ReadFailed,
    InvalidFilename(String),
    NotFound(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::CreateFailed => write!(f, "Storage directory creation failed"),
            StorageError::WriteFailed => write!(f, "Storage write failed"),
            StorageError::ReadFailed => write!(f, "Storage read failed"),
            StorageError::InvalidFilename(name) => write!(f, "Invalid artifact filename: {}", name),
            StorageError::NotFound(name) => write!(f, "Artifact not found: {}", name),
        }
    }
}

impl std::error::Error for StorageError {}

#[derive(Debug)]
pub enum IngestError {
    BadPayload(String),
    StorageFailure(StorageError),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::BadPayload(e) => write!(f, "Bad capture payload: {}", e),
            IngestError::StorageFailure(e) => write!(f, "Storage failure: {}", e),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<StorageError> for IngestError {
    fn from(err: StorageError) -> Self {
        IngestError::StorageFailure(err)
    }
}

#[derive(Debug)]
pub enum ConnectError {
    AlreadyConnected,
    BadAddress(String),
    Io(std::io::Error),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::AlreadyConnected => write!(f, "Client is already connected"),
            ConnectError::BadAddress(e) => write!(f, "Bad server address: {}", e),
            ConnectError::Io(e) => write!(f, "Connection failed: {}", e),
        }
    }
}

impl std::error::Error for ConnectError {}

impl From<std::io::Error> for ConnectError {
    fn from(err: std::io::Error) -> Self {
        ConnectError::Io(err)
    }
}

#[derive(Debug)]
pub enum SendError {
    NotConnected,
    ConnectionClosed,
    Io(std::io::Error),
    BadAck(String),
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::NotConnected => write!(f, "Client is not connected"),
            SendError::ConnectionClosed => write!(f, "Server closed the connection"),
            SendError::Io(e) => write!(f, "Transport error: {}", e),
            SendError::BadAck(e) => write!(f, "Unreadable acknowledgement: {}", e),
        }
    }
}

impl std::error::Error for SendError {}

impl From<std::io::Error> for SendError {
    fn from(err: std::io::Error) -> Self {
        SendError::Io(err)
    }
}

#[derive(Debug)]
pub enum CaptureError {
    AcquireFailed(String),
    Io(std::io::Error),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::AcquireFailed(e) => write!(f, "Capture acquisition failed: {}", e),
            CaptureError::Io(e) => write!(f, "Capture IO error: {}", e),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::Io(err)
    }
}

#[derive(Debug)]
pub enum ChannelError {
    BindError(std::io::Error),
    SockError(std::io::Error),
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::BindError(e) => write!(f, "Channel bind error: {}", e),
            ChannelError::SockError(e) => write!(f, "Channel socket error: {}", e),
        }
    }
}

impl std::error::Error for ChannelError {}

#[derive(Debug)]
pub enum WebError {
    BadAddress(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::BadAddress(e) => write!(f, "Web server address error: {}", e),
        }
    }
}

impl std::error::Error for WebError {}

#[derive(Debug)]
pub enum ControllerError {
    ConfigurationError(ConfigError),
    StorageError(StorageError),
    ChannelError(ChannelError),
    WebError(WebError),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            ControllerError::StorageError(e) => write!(f, "Storage error: {}", e),
            ControllerError::ChannelError(e) => write!(f, "Channel error: {}", e),
            ControllerError::WebError(e) => write!(f, "Web error: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}
