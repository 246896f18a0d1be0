use std::{convert::TryFrom, sync::Arc};

use hcloud_discover::{hcloud::HcloudProvider, LogFacade, ParsedArgs, Provider};
use log::{error, info};

const GLOBAL_HELP: &str = "The options for discovering ip addresses are provided as
\"key=value key=value ...\" arguments.

  node-discover-hcloud addrs provider=hcloud label_selector=role=consul ...

The options are listed below.
";

pub fn help() {
    println!("{}", GLOBAL_HELP);
    println!("{}", HcloudProvider::help());
}

async fn get_addrs(args: Vec<String>) {
    let provider = ParsedArgs::try_from(args)
        .and_then(<HcloudProvider as TryFrom<ParsedArgs>>::try_from);

    let res = match provider {
        Ok(provider) => provider.with_logger(Arc::new(LogFacade)).addrs().await,
        Err(e) => Err(e),
    };

    match res {
        Ok(addrs) => {
            info!("{:?}", addrs);
            println!("{}", addrs.join(" "));
        }
        Err(e) => {
            error!("Unable to retrieve addrs. Received error: {}", e);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let mut args: Vec<_> = std::env::args().skip(1).collect();

    if args.is_empty() {
        help();
        return;
    }

    let cmd = args.remove(0);

    match &cmd[..] {
        "addrs" => get_addrs(args).await,
        _ => help(),
    }
}
