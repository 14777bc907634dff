use std::str::FromStr;

use crate::commands::CommandError;

/// Parses a numeric argument. Arguments are raw bytes, so anything that is not a
/// well-formed decimal number fails the same way.
pub fn parse_integer<T: FromStr>(argument: &[u8]) -> Result<T, CommandError> {
    std::str::from_utf8(argument)
        .ok()
        .and_then(|text| text.parse::<T>().ok())
        .ok_or(CommandError::InvalidIntegerValue)
}

/// Upper-cased option keyword such as `EX` or `NX`. Bytes that are not UTF-8 never
/// match a keyword.
pub fn keyword(argument: &[u8]) -> String {
    String::from_utf8_lossy(argument).to_uppercase()
}

/// Text form of an argument for names, patterns and messages.
pub fn to_text(argument: &[u8]) -> String {
    String::from_utf8_lossy(argument).into_owned()
}
