use std::path::PathBuf;

use crate::types::{UploadSource, UploadTarget};

const STDIN_SOURCE: &str = "-";
const S3_SCHEME: &str = "s3://";

const NO_PATH_SPECIFIED: &str = "path must be specified.";
const INVALID_SCHEME: &str = "target must be s3://<BUCKET_NAME>/<KEY> .";
const NO_BUCKET_NAME_SPECIFIED: &str = "bucket name must be specified.";
const NO_KEY_SPECIFIED: &str = "object key must be specified.";
const DIRECTORY_KEY_SPECIFIED: &str = "object key must not end with '/'.";

pub fn check_source(source: &str) -> Result<String, String> {
    if source.is_empty() {
        return Err(NO_PATH_SPECIFIED.to_string());
    }

    Ok(source.to_string())
}

pub fn parse_source(source: &str) -> UploadSource {
    if source == STDIN_SOURCE {
        return UploadSource::Stdin;
    }

    UploadSource::Local(PathBuf::from(source))
}

pub fn check_target(target: &str) -> Result<String, String> {
    parse_target(target)?;

    Ok(target.to_string())
}

pub fn parse_target(target: &str) -> Result<UploadTarget, String> {
    let path = target
        .strip_prefix(S3_SCHEME)
        .ok_or_else(|| INVALID_SCHEME.to_string())?;

    let (bucket, key) = path
        .split_once('/')
        .ok_or_else(|| NO_KEY_SPECIFIED.to_string())?;

    if bucket.is_empty() {
        return Err(NO_BUCKET_NAME_SPECIFIED.to_string());
    }
    if key.is_empty() {
        return Err(NO_KEY_SPECIFIED.to_string());
    }
    if key.ends_with('/') {
        return Err(DIRECTORY_KEY_SPECIFIED.to_string());
    }

    Ok(UploadTarget {
        bucket: bucket.to_string(),
        key: key.to_string(),
    })
}
