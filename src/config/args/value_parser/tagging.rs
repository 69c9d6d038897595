use std::collections::HashSet;

use regex::Regex;

const INVALID_TAGGING: &str = "invalid tagging. must be URL encoded. e.g. key1=value1&key2=value2";
const DUPLICATE_TAG_KEY: &str = "invalid tagging. tag keys must be unique.";
const TAGGING_REGEX: &str =
    r"^([a-zA-Z0-9+%._\-~]+)=([a-zA-Z0-9+%._\-~]*)(&([a-zA-Z0-9+%._\-~]+)=([a-zA-Z0-9+%._\-~]*))*$";

/// Accepts the `x-amz-tagging` form of a tag set as is.
pub fn parse_tagging(tagging: &str) -> Result<String, String> {
    let regex = Regex::new(TAGGING_REGEX).map_err(|e| e.to_string())?;
    if !regex.is_match(tagging) {
        return Err(INVALID_TAGGING.to_string());
    }

    let mut keys = HashSet::new();
    for (key, _) in url::form_urlencoded::parse(tagging.as_bytes()) {
        if !keys.insert(key) {
            return Err(DUPLICATE_TAG_KEY.to_string());
        }
    }

    Ok(tagging.to_string())
}
