use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub record: RecordSettings,
    #[serde(default)]
    pub upload: UploadSettings,
    #[serde(default)]
    pub convert: ConvertSettings,
    pub ssh: SshConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Local output tree shared by the record and convert stages.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

fn default_output_path() -> PathBuf {
    PathBuf::from("/data")
}

/// Record stage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecordSettings {
    /// Number of concurrent capture workers.
    #[serde(default = "default_record_workers")]
    pub workers: usize,
    /// Submission queue capacity for the record pool.
    #[serde(default = "default_record_queue")]
    pub queue_size: usize,
    /// Result channel capacity for the record pool.
    #[serde(default = "default_record_queue")]
    pub result_size: usize,
    /// Extra ffmpeg input arguments (key/value, merged over defaults).
    #[serde(default)]
    pub input_args: BTreeMap<String, String>,
    /// Extra ffmpeg output arguments.
    #[serde(default = "default_record_output_args")]
    pub output_args: BTreeMap<String, String>,
}

impl Default for RecordSettings {
    fn default() -> Self {
        Self {
            workers: default_record_workers(),
            queue_size: default_record_queue(),
            result_size: default_record_queue(),
            input_args: BTreeMap::new(),
            output_args: default_record_output_args(),
        }
    }
}

fn default_record_workers() -> usize {
    4
}

fn default_record_queue() -> usize {
    100
}

fn default_record_output_args() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("c:a".to_string(), "aac".to_string()),
        ("c:v".to_string(), "copy".to_string()),
    ])
}

/// Upload stage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadSettings {
    /// Number of concurrent upload workers.
    #[serde(default = "default_upload_workers")]
    pub workers: usize,
    #[serde(default = "default_upload_queue")]
    pub queue_size: usize,
    #[serde(default = "default_upload_queue")]
    pub result_size: usize,
    /// Transport timeout per attempt, in seconds.
    #[serde(default = "default_upload_timeout")]
    pub timeout_secs: u32,
    /// Give up on a file after this many failed attempts.
    #[serde(default = "default_max_errors")]
    pub max_errors: u32,
    /// Root directory on the remote host, mirrored as remote_dir/prefix/date.
    #[serde(default = "default_remote_dir")]
    pub remote_dir: PathBuf,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            workers: default_upload_workers(),
            queue_size: default_upload_queue(),
            result_size: default_upload_queue(),
            timeout_secs: default_upload_timeout(),
            max_errors: default_max_errors(),
            remote_dir: default_remote_dir(),
        }
    }
}

fn default_upload_workers() -> usize {
    4
}

fn default_upload_queue() -> usize {
    150
}

fn default_upload_timeout() -> u32 {
    60
}

fn default_max_errors() -> u32 {
    30
}

fn default_remote_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Convert stage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConvertSettings {
    /// Number of concurrent merge workers. 0 disables the stage.
    #[serde(default)]
    pub workers: usize,
    #[serde(default = "default_convert_queue")]
    pub queue_size: usize,
    #[serde(default = "default_convert_queue")]
    pub result_size: usize,
    #[serde(default = "default_convert_input_args")]
    pub input_args: BTreeMap<String, String>,
    #[serde(default = "default_convert_output_args")]
    pub output_args: BTreeMap<String, String>,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self {
            workers: 0,
            queue_size: default_convert_queue(),
            result_size: default_convert_queue(),
            input_args: default_convert_input_args(),
            output_args: default_convert_output_args(),
        }
    }
}

fn default_convert_queue() -> usize {
    30
}

fn default_convert_input_args() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("f".to_string(), "concat".to_string()),
        ("safe".to_string(), "0".to_string()),
    ])
}

fn default_convert_output_args() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("c:a".to_string(), "copy".to_string()),
        ("c:v".to_string(), "h264".to_string()),
        ("preset".to_string(), "veryfast".to_string()),
    ])
}

/// SSH transport configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SshConfig {
    /// Remote endpoint, host:port.
    pub server: String,
    #[serde(default = "default_ssh_user")]
    pub user: String,
    /// Path to the private key file.
    #[serde(default = "default_ssh_key")]
    pub key: PathBuf,
}

fn default_ssh_user() -> String {
    "recorder".to_string()
}

fn default_ssh_key() -> PathBuf {
    PathBuf::from("/config/id_rsa")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let toml = r#"
[ssh]
server = "upload.example.com:22"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.ssh.server, "upload.example.com:22");
        assert_eq!(config.ssh.user, "recorder");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.record.workers, 4);
        assert_eq!(config.upload.max_errors, 30);
        assert_eq!(config.convert.workers, 0);
        assert_eq!(config.output.path, PathBuf::from("/data"));
    }

    #[test]
    fn test_deserialize_missing_ssh_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_codec_args() {
        let toml = r#"
[ssh]
server = "host:22"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.record.output_args.get("c:v").unwrap(), "copy");
        assert_eq!(config.convert.input_args.get("f").unwrap(), "concat");
        assert_eq!(config.convert.output_args.get("preset").unwrap(), "veryfast");
    }

    #[test]
    fn test_override_codec_args() {
        let toml = r#"
[ssh]
server = "host:22"

[record.output_args]
"c:v" = "h265"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.record.output_args.get("c:v").unwrap(), "h265");
        // Replaced wholesale, not merged.
        assert!(config.record.output_args.get("c:a").is_none());
    }

    #[test]
    fn test_deserialize_custom_pools() {
        let toml = r#"
[ssh]
server = "host:22"

[record]
workers = 2
queue_size = 10

[convert]
workers = 1
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.record.workers, 2);
        assert_eq!(config.record.queue_size, 10);
        assert_eq!(config.convert.workers, 1);
    }
}
