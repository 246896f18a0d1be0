use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscoverError {
    #[error("Invalid argument: `{0}`. Error message: `{1}`")]
    MalformedArgument(String, String),
    #[error("Duplicate argument with key: `{0}`")]
    DuplicateArgument(String),
    #[error("Argument with key: `{0}` was not expected")]
    UnexpectedArgument(String),
    #[error("Argument with key: `{0}` is required")]
    MissingArgument(String),
    #[error("Invalid provider `{0}`. This plugin only serves `hcloud`.")]
    InvalidProvider(String),
    #[error("No API token specified. Set `api_token` or the HCLOUD_TOKEN environment variable")]
    MissingCredential,
    #[error("Unable to read hostname from `{0}`. Error message: `{1}`")]
    HostnameUnreadable(String, String),
    #[error("Unable to retrieve data from provider. Error message: `{0}`")]
    ProviderRequestFailed(String),
}
