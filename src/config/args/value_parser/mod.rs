pub mod canned_acl;
pub mod human_bytes;
pub mod metadata;
pub mod sse;
pub mod storage_class;
pub mod tagging;
pub mod upload_path;
pub mod url;
