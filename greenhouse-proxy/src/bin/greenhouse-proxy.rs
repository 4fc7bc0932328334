use std::{
    error::Error as StdError,
    fs,
    io::{Error as IoError, ErrorKind},
    time::Duration,
};

use clap::{Arg as ClapArg, Command};
use log::{self, error, info};
use serde::Deserialize;
use sylvia_iot_sdk::util::logger;
use tokio;

use greenhouse_proxy::libs::{
    self,
    forwarder::{self, Forwarder},
    serial_port::{self, SerialOpener},
    supervisor::{self, Supervisor},
};

#[derive(Deserialize)]
struct AppConfig {
    #[serde(default)]
    log: logger::Config,
    #[serde(rename = "greenhouseProxy")]
    greenhouse_proxy: libs::config::Config,
}

const PROJ_NAME: &'static str = env!("CARGO_PKG_NAME");
const PROJ_VER: &'static str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> std::io::Result<()> {
    const FN_NAME: &'static str = "main";

    let conf = match init_config() {
        Err(e) => {
            let conf = &logger::Config {
                ..Default::default()
            };
            logger::init(PROJ_NAME, &conf);
            error!("[{}] read config error: {}", FN_NAME, e);
            return Err(IoError::new(ErrorKind::InvalidInput, e.to_string()));
        }
        Ok(conf) => conf,
    };

    logger::init(PROJ_NAME, &conf.log);
    info!("[{}] starting up {} {}", FN_NAME, PROJ_NAME, PROJ_VER);

    // Files may omit values.
    let proxy_conf = libs::config::apply_default(&conf.greenhouse_proxy);
    let base_url = proxy_conf.base_url.unwrap_or_default();
    let auth_key = proxy_conf.auth_key.unwrap_or_default();
    info!("[{}] forwarding to {}", FN_NAME, base_url);
    let forwarder = match Forwarder::new(forwarder::Options { base_url, auth_key }) {
        Err(e) => {
            error!("[{}] new forwarder error: {}", FN_NAME, e);
            return Err(IoError::new(ErrorKind::InvalidInput, e.to_string()));
        }
        Ok(forwarder) => forwarder,
    };

    let read_timeout = match proxy_conf.read_timeout.unwrap_or_default() {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    let opts = supervisor::Options {
        candidates: serial_port::candidates(proxy_conf.dev_path.unwrap_or_default().as_str()),
        baud_rate: proxy_conf.baud_rate.unwrap_or(libs::config::DEF_BAUD_RATE),
        read_timeout,
        max_search: proxy_conf.max_search.unwrap_or_default(),
    };
    let mut supervisor = Supervisor::new(opts, SerialOpener, forwarder);
    if let Err(e) = supervisor.run().await {
        error!("[{}] relay stopped: {}", FN_NAME, e);
        return Err(IoError::new(ErrorKind::NotFound, e.to_string()));
    }
    Ok(())
}

fn init_config() -> Result<AppConfig, Box<dyn StdError>> {
    let mut args = Command::new(PROJ_NAME).version(PROJ_VER).arg(
        ClapArg::new("file")
            .short('f')
            .long("file")
            .help("config file")
            .num_args(1),
    );
    args = logger::reg_args(args);
    args = libs::config::reg_args(args);
    let args = args.get_matches();

    if let Some(v) = args.get_one::<String>("file") {
        let conf_str = fs::read_to_string(v)?;
        return Ok(json5::from_str(conf_str.as_str())?);
    }

    Ok(AppConfig {
        log: logger::read_args(&args),
        greenhouse_proxy: libs::config::read_args(&args),
    })
}
