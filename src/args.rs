use std::{
    collections::{hash_map::IntoIter, HashMap},
    convert::TryFrom,
};

use crate::errors::DiscoverError;

/// A utility type for parsing and working with `key=value` arguments
#[derive(Debug, Clone)]
pub struct ParsedArgs {
    inner: HashMap<String, String>,
    provider: String,
}

impl ParsedArgs {
    pub fn provider(&self) -> &str {
        &self.provider
    }
}

impl IntoIterator for ParsedArgs {
    type Item = (String, String);

    type IntoIter = IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl TryFrom<Vec<String>> for ParsedArgs {
    type Error = DiscoverError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        let mut args = HashMap::with_capacity(value.len());
        for arg_str in value {
            let arg = arg_str.splitn(2, '=').collect::<Vec<_>>();

            if arg.len() != 2 || arg[1].is_empty() {
                return Err(DiscoverError::MalformedArgument(
                    arg[0].to_string(),
                    "Expected an argument on the format: key=value".to_string(),
                ));
            }

            if args
                .insert(arg[0].to_string(), arg[1].to_string())
                .is_some()
            {
                return Err(DiscoverError::DuplicateArgument(arg[0].to_string()));
            }
        }

        // Checked against this plugin's name later, when the params are resolved
        let provider = args
            .get("provider")
            .cloned()
            .ok_or_else(|| DiscoverError::MissingArgument("provider".into()))?;

        Ok(Self {
            inner: args,
            provider,
        })
    }
}

impl TryFrom<String> for ParsedArgs {
    type Error = DiscoverError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let args = value
            .trim()
            .split(' ')
            .map(String::from)
            .collect::<Vec<_>>();
        ParsedArgs::try_from(args)
    }
}
