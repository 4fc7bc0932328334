//! Program configurations.

use std::env;

use clap::{Arg, ArgMatches, Command};
use serde::Deserialize;

/// Configuration file object.
#[derive(Default, Deserialize)]
pub struct Config {
    /// Ingestion server base URL such as `http://127.0.0.1:47336`.
    #[serde(rename = "baseUrl")]
    pub base_url: Option<String>,
    /// Value of the `X-Greenhouse-Key` header. Empty means no header.
    #[serde(rename = "authKey")]
    pub auth_key: Option<String>,
    /// Serial port device path such as `/dev/ttyUSB0` or `COM1`. Empty means scanning the default
    /// candidates.
    #[serde(rename = "devPath")]
    pub dev_path: Option<String>,
    #[serde(rename = "baudRate")]
    pub baud_rate: Option<u32>,
    /// Serial read timeout in seconds. 0 to wait forever.
    #[serde(rename = "readTimeout")]
    pub read_timeout: Option<u64>,
    /// Consecutive device scans before giving up. 0 to scan forever.
    #[serde(rename = "maxSearch")]
    pub max_search: Option<u32>,
}

pub const DEF_BASE_URL: &'static str = "http://127.0.0.1:47336";
pub const DEF_AUTH_KEY: &'static str = "";
pub const DEF_DEV_PATH: &'static str = "";
pub const DEF_BAUD_RATE: u32 = 9600;
pub const DEF_READ_TIMEOUT: u64 = 10;
pub const DEF_MAX_SEARCH: u32 = 30;

/// To register Clap arguments.
pub fn reg_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("greenhouse-proxy.base-url")
            .long("greenhouse-proxy.base-url")
            .help("Ingestion server base URL")
            .num_args(1),
    )
    .arg(
        Arg::new("greenhouse-proxy.auth-key")
            .long("greenhouse-proxy.auth-key")
            .help("Key sent in the `X-Greenhouse-Key` header")
            .num_args(1),
    )
    .arg(
        Arg::new("greenhouse-proxy.dev-path")
            .long("greenhouse-proxy.dev-path")
            .help("Device path such as `/dev/ttyUSB0` or `COM1`. Scan all candidates if not set")
            .num_args(1),
    )
    .arg(
        Arg::new("greenhouse-proxy.baud-rate")
            .long("greenhouse-proxy.baud-rate")
            .help("Serial baud rate")
            .num_args(1)
            .value_parser(1..=4_000_000),
    )
    .arg(
        Arg::new("greenhouse-proxy.read-timeout")
            .long("greenhouse-proxy.read-timeout")
            .help("Serial read timeout in seconds. 0 to wait forever")
            .num_args(1)
            .value_parser(0..=3600),
    )
    .arg(
        Arg::new("greenhouse-proxy.max-search")
            .long("greenhouse-proxy.max-search")
            .help("Device scans before giving up. 0 to scan forever")
            .num_args(1)
            .value_parser(0..=u32::MAX as i64),
    )
}

/// To read input arguments from command-line arguments and environment variables.
///
/// This function will call [`apply_default()`] to fill missing values so you do not need call it
/// again.
pub fn read_args(args: &ArgMatches) -> Config {
    apply_default(&Config {
        base_url: match args.get_one::<String>("greenhouse-proxy.base-url") {
            None => match env::var("GREENHOUSE_PROXY_BASEURL") {
                Err(_) => None,
                Ok(v) => Some(v),
            },
            Some(v) => Some(v.clone()),
        },
        auth_key: match args.get_one::<String>("greenhouse-proxy.auth-key") {
            None => match env::var("GREENHOUSE_PROXY_KEY") {
                Err(_) => None,
                Ok(v) => Some(v),
            },
            Some(v) => Some(v.clone()),
        },
        dev_path: match args.get_one::<String>("greenhouse-proxy.dev-path") {
            None => match env::var("GREENHOUSE_PROXY_DEV_PATH") {
                Err(_) => None,
                Ok(v) => Some(v),
            },
            Some(v) => Some(v.clone()),
        },
        baud_rate: match args.get_one::<i64>("greenhouse-proxy.baud-rate") {
            None => match env::var("GREENHOUSE_PROXY_BAUD_RATE") {
                Err(_) => None,
                Ok(v) => v.parse::<u32>().ok(),
            },
            Some(v) => Some(*v as u32),
        },
        read_timeout: match args.get_one::<i64>("greenhouse-proxy.read-timeout") {
            None => match env::var("GREENHOUSE_PROXY_READ_TIMEOUT") {
                Err(_) => None,
                Ok(v) => v.parse::<u64>().ok(),
            },
            Some(v) => Some(*v as u64),
        },
        max_search: match args.get_one::<i64>("greenhouse-proxy.max-search") {
            None => match env::var("GREENHOUSE_PROXY_MAX_SEARCH") {
                Err(_) => None,
                Ok(v) => v.parse::<u32>().ok(),
            },
            Some(v) => Some(*v as u32),
        },
    })
}

/// Fill missing configuration with default values.
///
/// An empty base URL is treated as missing.
pub fn apply_default(config: &Config) -> Config {
    Config {
        base_url: match config.base_url.as_ref() {
            None => Some(DEF_BASE_URL.to_string()),
            Some(url) => match url.is_empty() {
                false => Some(url.clone()),
                true => Some(DEF_BASE_URL.to_string()),
            },
        },
        auth_key: match config.auth_key.as_ref() {
            None => Some(DEF_AUTH_KEY.to_string()),
            Some(key) => Some(key.clone()),
        },
        dev_path: match config.dev_path.as_ref() {
            None => Some(DEF_DEV_PATH.to_string()),
            Some(path) => Some(path.clone()),
        },
        baud_rate: match config.baud_rate {
            None | Some(0) => Some(DEF_BAUD_RATE),
            Some(rate) => Some(rate),
        },
        read_timeout: match config.read_timeout {
            None => Some(DEF_READ_TIMEOUT),
            Some(timeout) => Some(timeout),
        },
        max_search: match config.max_search {
            None => Some(DEF_MAX_SEARCH),
            Some(max) => Some(max),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_default_fills_missing() {
        let conf = apply_default(&Config::default());
        assert_eq!(conf.base_url.as_deref(), Some(DEF_BASE_URL));
        assert_eq!(conf.auth_key.as_deref(), Some(""));
        assert_eq!(conf.dev_path.as_deref(), Some(""));
        assert_eq!(conf.baud_rate, Some(9600));
        assert_eq!(conf.read_timeout, Some(DEF_READ_TIMEOUT));
        assert_eq!(conf.max_search, Some(DEF_MAX_SEARCH));
    }

    #[test]
    fn apply_default_keeps_values() {
        let conf = apply_default(&Config {
            base_url: Some("https://greenhouse.example.com".to_string()),
            auth_key: Some("secret".to_string()),
            dev_path: Some("/dev/ttyACM0".to_string()),
            baud_rate: Some(115200),
            read_timeout: Some(0),
            max_search: Some(0),
        });
        assert_eq!(
            conf.base_url.as_deref(),
            Some("https://greenhouse.example.com")
        );
        assert_eq!(conf.auth_key.as_deref(), Some("secret"));
        assert_eq!(conf.dev_path.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(conf.baud_rate, Some(115200));
        assert_eq!(conf.read_timeout, Some(0));
        assert_eq!(conf.max_search, Some(0));
    }

    #[test]
    fn apply_default_empty_base_url() {
        let conf = apply_default(&Config {
            base_url: Some("".to_string()),
            ..Default::default()
        });
        assert_eq!(conf.base_url.as_deref(), Some(DEF_BASE_URL));
    }

    #[test]
    fn read_args_from_command_line() {
        let args = reg_args(Command::new("test")).get_matches_from(vec![
            "test",
            "--greenhouse-proxy.base-url",
            "http://10.0.0.2:8080",
            "--greenhouse-proxy.auth-key",
            "abc",
            "--greenhouse-proxy.baud-rate",
            "19200",
            "--greenhouse-proxy.read-timeout",
            "3",
            "--greenhouse-proxy.max-search",
            "5",
        ]);
        let conf = read_args(&args);
        assert_eq!(conf.base_url.as_deref(), Some("http://10.0.0.2:8080"));
        assert_eq!(conf.auth_key.as_deref(), Some("abc"));
        assert_eq!(conf.baud_rate, Some(19200));
        assert_eq!(conf.read_timeout, Some(3));
        assert_eq!(conf.max_search, Some(5));
    }

    #[test]
    fn deserialize_json5() {
        let conf: Config = json5::from_str(
            r#"{
                baseUrl: "http://192.168.1.10:47336",
                authKey: "key",
                devPath: "/dev/ttyUSB3",
                maxSearch: 0,
            }"#,
        )
        .unwrap();
        let conf = apply_default(&conf);
        assert_eq!(conf.base_url.as_deref(), Some("http://192.168.1.10:47336"));
        assert_eq!(conf.auth_key.as_deref(), Some("key"));
        assert_eq!(conf.dev_path.as_deref(), Some("/dev/ttyUSB3"));
        assert_eq!(conf.baud_rate, Some(DEF_BAUD_RATE));
        assert_eq!(conf.max_search, Some(0));
    }
}
