//! Turns user supplied parameters into the effective settings of one
//! discovery pass.
//!
//! Explicit parameters win over environment variables. Only the API token
//! is mandatory; the address family is corrected rather than rejected.

use std::{convert::TryFrom, env, fmt::Display, str::FromStr};

use crate::{args::ParsedArgs, errors::DiscoverError, logger::Logger};

/// Name under which this provider is selected.
pub const PROVIDER_NAME: &str = "hcloud";

pub const TOKEN_ENV: &str = "HCLOUD_TOKEN";
pub const LOCATION_ENV: &str = "HCLOUD_LOCATION";
pub const ENDPOINT_ENV: &str = "HCLOUD_ENDPOINT";

pub const DEFAULT_ENDPOINT: &str = "https://api.hetzner.cloud/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    PrivateV4,
    PublicV4,
    PublicV6,
}

impl Default for AddressFamily {
    fn default() -> Self {
        AddressFamily::PrivateV4
    }
}

impl AddressFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressFamily::PrivateV4 => "private_v4",
            AddressFamily::PublicV4 => "public_v4",
            AddressFamily::PublicV6 => "public_v6",
        }
    }

    /// Maps a requested address type onto a family. Missing or unknown
    /// values fall back to `private_v4`; this never fails.
    pub fn normalize(requested: Option<&str>, logger: &dyn Logger) -> Self {
        match requested.filter(|r| !r.is_empty()) {
            None => {
                logger.info("address type not provided, using 'private_v4'");
                AddressFamily::default()
            }
            Some(r) => r.parse().unwrap_or_else(|_| {
                logger.warn(&format!(
                    "address_type {} is invalid, falling back to 'private_v4'. valid values are: private_v4, public_v4, public_v6",
                    r
                ));
                AddressFamily::default()
            }),
        }
    }
}

impl FromStr for AddressFamily {
    type Err = DiscoverError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "private_v4" => Ok(AddressFamily::PrivateV4),
            "public_v4" => Ok(AddressFamily::PublicV4),
            "public_v6" => Ok(AddressFamily::PublicV6),
            _ => Err(DiscoverError::MalformedArgument(
                format!("address_type={}", value),
                "Invalid address_type".to_string(),
            )),
        }
    }
}

impl Display for AddressFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameters as handed in by the caller. Empty strings count as unset.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    pub provider: String,
    pub api_token: Option<String>,
    pub location: Option<String>,
    pub label_selector: Option<String>,
    pub address_type: Option<String>,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            provider: PROVIDER_NAME.to_string(),
            api_token: None,
            location: None,
            label_selector: None,
            address_type: None,
        }
    }
}

impl TryFrom<ParsedArgs> for Params {
    type Error = DiscoverError;

    fn try_from(args: ParsedArgs) -> Result<Self, Self::Error> {
        let mut params = Params {
            provider: args.provider().to_string(),
            ..Params::default()
        };

        for (key, value) in args {
            match &key[..] {
                "api_token" => params.api_token = Some(value),
                "location" => params.location = Some(value),
                "label_selector" => params.label_selector = Some(value),
                "address_type" => params.address_type = Some(value),
                "provider" => (),
                _ => return Err(DiscoverError::UnexpectedArgument(key)),
            }
        }

        Ok(params)
    }
}

/// The effective settings of one discovery pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub api_token: String,
    /// `None` means "detect from the current server, or span all locations".
    pub location: Option<String>,
    /// Empty means no filter.
    pub label_selector: String,
    pub address_family: AddressFamily,
    pub endpoint: String,
}

impl ResolvedConfig {
    /// Resolves `params` against the process environment.
    pub fn resolve(params: &Params, logger: &dyn Logger) -> Result<Self, DiscoverError> {
        Self::resolve_with(params, logger, |key| env::var(key).ok())
    }

    pub fn resolve_with<E>(params: &Params, logger: &dyn Logger, env: E) -> Result<Self, DiscoverError>
    where
        E: Fn(&str) -> Option<String>,
    {
        if params.provider != PROVIDER_NAME {
            return Err(DiscoverError::InvalidProvider(params.provider.clone()));
        }

        let api_token = param_or_env(params.api_token.as_ref(), TOKEN_ENV, &env)
            .ok_or(DiscoverError::MissingCredential)?;
        let location = param_or_env(params.location.as_ref(), LOCATION_ENV, &env);
        let endpoint = env(ENDPOINT_ENV)
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let address_family = AddressFamily::normalize(params.address_type.as_deref(), logger);

        Ok(ResolvedConfig {
            api_token,
            location,
            label_selector: params.label_selector.clone().unwrap_or_default(),
            address_family,
            endpoint,
        })
    }
}

fn param_or_env<E>(param: Option<&String>, key: &str, env: &E) -> Option<String>
where
    E: Fn(&str) -> Option<String>,
{
    match param.filter(|p| !p.is_empty()) {
        Some(p) => Some(p.clone()),
        None => env(key).filter(|v| !v.is_empty()),
    }
}
