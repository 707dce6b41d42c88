// Thermal-management service client. A connection is opened per read group
// and dropped afterwards; every failure decodes to "no reading".

pub mod keys;
pub mod proto;

use std::path::PathBuf;
use std::time::Duration;

use keys::SensorKey;
use proto::{Encoding, FRAME_LEN};

#[derive(Debug, thiserror::Error)]
pub enum SmcError {
    #[error("sensor key must be 4 ASCII characters, got {0:?}")]
    BadKey(String),
    #[error("thermal service unavailable: {0}")]
    Unavailable(std::io::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct SmcClient {
    path: PathBuf,
    timeout: Duration,
}

impl SmcClient {
    pub fn new(path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            timeout,
        }
    }

    pub fn connect(&self) -> Result<SmcConnection, SmcError> {
        #[cfg(unix)]
        {
            let stream =
                std::os::unix::net::UnixStream::connect(&self.path).map_err(SmcError::Unavailable)?;
            stream.set_read_timeout(Some(self.timeout))?;
            stream.set_write_timeout(Some(self.timeout))?;
            Ok(SmcConnection { stream })
        }
        #[cfg(not(unix))]
        Err(SmcError::Unavailable(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "no thermal service transport on this platform",
        )))
    }

    /// Reads every key in the group over one connection. `Err` only when
    /// the service cannot be reached; a key that fails to read or decode
    /// yields `None` in place.
    pub fn read_group(&self, group: &[SensorKey]) -> Result<Vec<(String, Option<f64>)>, SmcError> {
        let mut conn = self.connect()?;
        Ok(group
            .iter()
            .map(|key| {
                let value = conn.read_key(key.code, key.encoding).unwrap_or(None);
                (key.name.to_string(), value)
            })
            .collect())
    }

    /// First valid reading from an ordered candidate list, over one
    /// connection. `None` when the service is unreachable or no candidate
    /// responds.
    pub fn read_first(&self, candidates: &[&str], encoding: Encoding) -> Option<f64> {
        let mut conn = self.connect().ok()?;
        for key in candidates {
            if let Ok(Some(value)) = conn.read_key(key, encoding) {
                return Some(value);
            }
        }
        None
    }

    /// Capability check: whether the thermal service can be reached at all.
    pub fn available(&self) -> bool {
        self.connect().is_ok()
    }
}

pub struct SmcConnection {
    #[cfg(unix)]
    stream: std::os::unix::net::UnixStream,
}

impl SmcConnection {
    /// One request/response exchange for a single key.
    pub fn read_key(&mut self, key: &str, encoding: Encoding) -> Result<Option<f64>, SmcError> {
        let frame = proto::encode_read_key(key)?;
        #[cfg(unix)]
        {
            use std::io::{Read, Write};
            self.stream.write_all(&frame)?;
            let mut reply = [0u8; FRAME_LEN];
            self.stream.read_exact(&mut reply)?;
            Ok(proto::decode_reading(&reply, encoding))
        }
        #[cfg(not(unix))]
        {
            let _ = (frame, encoding);
            Ok(None)
        }
    }
}
