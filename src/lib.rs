//! Retrieve IP addresses of Hetzner Cloud servers.
//!
//! Query running servers labelled `role=consul` in location "fsn1" and get
//! their private IPv4 addresses
//! ```rust no_run
//! use hcloud_discover::get_addresses;
//!
//! #[tokio::main]
//! async fn main() {
//!     let args = "provider=hcloud location=fsn1 label_selector=role=consul address_type=private_v4".to_string();
//!     let res = get_addresses(args).await;
//!     match res {
//!         Ok(addrs) => println!("{:?}", addrs),
//!         Err(e) => println!("Error: {:?}", e),
//!     };
//! }
//! ```
//!
//! With typed parameters and a logging sink. The API token is taken from
//! `HCLOUD_TOKEN` and, without a location, the location of the server this
//! runs on is used.
//! ```rust no_run
//! use hcloud_discover::{hcloud::discover, LineSink, Params};
//!
//! #[tokio::main]
//! async fn main() {
//!     let params = Params {
//!         label_selector: Some("role=consul".to_string()),
//!         address_type: Some("public_v4".to_string()),
//!         ..Params::default()
//!     };
//!     let logger = LineSink(|line: &str| eprintln!("{}", line));
//!     let addrs = discover(params, &logger).await;
//!     println!("{:?}", addrs);
//! }
//! ```
mod args;
mod config;
mod errors;
mod logger;
mod providers;

use std::convert::TryFrom;

pub use args::ParsedArgs;
pub use config::{AddressFamily, Params, ResolvedConfig, PROVIDER_NAME};
pub use errors::DiscoverError;
pub use logger::{format_line, LineSink, LogFacade, Logger, NoopLogger};
pub use providers::*;

use providers::hcloud::HcloudProvider;

pub async fn get_addresses<A>(args: A) -> Result<Vec<String>, DiscoverError>
where
    ParsedArgs: TryFrom<A, Error = DiscoverError>,
{
    let args = ParsedArgs::try_from(args)?;
    HcloudProvider::try_from(args)?.addrs().await
}
