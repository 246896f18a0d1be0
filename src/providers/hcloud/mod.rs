pub mod api;
pub mod discovery;
pub mod select;

use std::{convert::TryFrom, sync::Arc};

use crate::{
    args::ParsedArgs,
    config::{Params, ResolvedConfig},
    logger::{Logger, NoopLogger},
};

use self::{api::HcloudClient, discovery::Discovery};
use super::{DiscoverError, Provider};

/// Runs one discovery pass against the Hetzner Cloud API.
///
/// The provider name and credential are checked before any request is made.
pub async fn discover(params: Params, logger: &dyn Logger) -> Result<Vec<String>, DiscoverError> {
    let config = ResolvedConfig::resolve(&params, logger)?;
    let client = HcloudClient::new(&config);
    Discovery::new(client, logger).run(&config).await
}

#[derive(Clone)]
pub struct HcloudProvider {
    params: Params,
    logger: Arc<dyn Logger>,
}

impl HcloudProvider {
    pub fn new(params: Params) -> Self {
        HcloudProvider {
            params,
            logger: Arc::new(NoopLogger),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

impl TryFrom<ParsedArgs> for HcloudProvider {
    type Error = DiscoverError;

    fn try_from(args: ParsedArgs) -> Result<Self, Self::Error> {
        Ok(HcloudProvider::new(Params::try_from(args)?))
    }
}

impl TryFrom<Vec<String>> for HcloudProvider {
    type Error = DiscoverError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        HcloudProvider::try_from(ParsedArgs::try_from(value)?)
    }
}

#[async_trait::async_trait]
impl Provider for HcloudProvider {
    async fn addrs(&self) -> Result<Vec<String>, DiscoverError> {
        discover(self.params.clone(), self.logger.as_ref()).await
    }

    fn help() -> &'static str {
        "Hetzner Cloud:

	provider:       \"hcloud\"
	api_token:      The Hetzner Cloud API token to use
	location:       The Hetzner Cloud datacenter location to filter by (eg. \"fsn1\"). Optional.
	                If empty, the location of the current server is detected. If not running
	                on an hcloud server, all servers matching label_selector are used.
	label_selector: The label selector to filter by
	address_type:   \"private_v4\", \"public_v4\" or \"public_v6\". Defaults to \"private_v4\".
	                For private networks the first one is used.

	Variables can also be provided by environment variables:
	export HCLOUD_LOCATION for location
	export HCLOUD_TOKEN for api_token
	export HCLOUD_ENDPOINT to use another API endpoint
"
    }
}
