use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub audio: AudioConfig,
    pub snapshot: SnapshotConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the conversational backend
    pub base_url: String,
    /// Anti-forgery token attached to every state-changing request.
    /// Read once at startup and treated as immutable for the session.
    pub csrf_token: String,
    /// Request timeout in seconds (bounds worst-case turn latency)
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Preferred capture sample rate in Hz, used when the input device
    /// supports it (device default otherwise)
    pub sample_rate: u32,
    /// Preferred number of capture channels (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Interval between encoder chunk deliveries, in milliseconds
    pub chunk_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotConfig {
    /// Fixed raster width for captured snapshots
    pub width: u32,
    /// Fixed raster height for captured snapshots
    pub height: u32,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            chunk_interval_ms: 250,
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            jpeg_quality: 80,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
