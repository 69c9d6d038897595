mod metadata;
mod sse_kms_key_id;
mod tracing;
mod transfer;
