use bytes::Bytes;
use globset::Glob;

use crate::{
    commands::{command_utils::to_text, CommandError},
    resp::RespValue,
};

pub struct ConfigGetArguments {
    pub patterns: Vec<String>,
}

impl ConfigGetArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::WrongNumberOfArguments(
                "config|get".to_string(),
            ));
        }

        Ok(ConfigGetArguments {
            patterns: arguments
                .iter()
                .map(|pattern| to_text(pattern).to_lowercase())
                .collect(),
        })
    }
}

/// Replies with a flat array of `name, value` pairs for every parameter matching one
/// of the glob patterns. Unknown parameters are simply absent from the reply.
pub fn config_get(
    parameters: &[(&'static str, String)],
    arguments: Vec<Bytes>,
) -> Result<Bytes, CommandError> {
    let config_get_arguments = ConfigGetArguments::parse(arguments)?;

    let mut matchers = Vec::with_capacity(config_get_arguments.patterns.len());
    for pattern in &config_get_arguments.patterns {
        let matcher = Glob::new(pattern)
            .map_err(|e| CommandError::InvalidGlobPattern(e.to_string()))?
            .compile_matcher();
        matchers.push(matcher);
    }

    let mut response = Vec::new();
    for (name, value) in parameters {
        if matchers.iter().any(|matcher| matcher.is_match(name)) {
            response.push(RespValue::bulk_string(name));
            response.push(RespValue::bulk_string(value));
        }
    }

    Ok(RespValue::Array(response).encode())
}
