use std::collections::HashMap;

use regex::Regex;

const INVALID_METADATA: &str = "invalid metadata. e.g. key1=value1,key2=value2";
const METADATA_REGEX: &str = r"^([a-zA-Z0-9_\-.]+)=([a-zA-Z0-9_\-.]*)(,([a-zA-Z0-9_\-.]+)=([a-zA-Z0-9_\-.]*))*$";

pub fn check_metadata(metadata: &str) -> Result<String, String> {
    let regex = Regex::new(METADATA_REGEX).map_err(|e| e.to_string())?;
    if !regex.is_match(metadata) {
        return Err(INVALID_METADATA.to_string());
    }

    Ok(metadata.to_string())
}

/// A later occurrence of the same key overrides an earlier one.
pub fn parse_metadata(metadata: &str) -> Result<HashMap<String, String>, String> {
    check_metadata(metadata)?;

    metadata
        .split(',')
        .map(|key_value| {
            key_value
                .split_once('=')
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| INVALID_METADATA.to_string())
        })
        .collect()
}
