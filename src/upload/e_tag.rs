use aws_sdk_s3::types::ServerSideEncryption;

/// Compares the locally calculated ETag with the one returned by the server.
///
/// Returns `None` when the ETag cannot be used for verification (e.g. SSE-KMS objects, whose
/// ETag is not an MD5 digest of the content).
pub fn verify_e_tag(
    sse: &Option<ServerSideEncryption>,
    source_e_tag: &str,
    target_e_tag: &str,
) -> Option<bool> {
    if !is_verification_supported_sse(sse) {
        return None;
    }

    Some(normalize_e_tag(source_e_tag) == normalize_e_tag(target_e_tag))
}

/// ETag of an object as S3 computes it.
///
/// `parts_count == 0` means a single-part upload, whose ETag is the MD5 digest of the content.
/// Otherwise it is the MD5 digest of the concatenated part digests followed by the parts count.
pub fn generate_e_tag_hash(concatenated_md5_hash: &[u8], parts_count: i64) -> String {
    if parts_count == 0 {
        format!("\"{}\"", hex::encode(concatenated_md5_hash))
    } else {
        format!(
            "\"{:x}-{}\"",
            md5::compute(concatenated_md5_hash),
            parts_count
        )
    }
}

pub fn normalize_e_tag(e_tag: &str) -> String {
    e_tag.replace('\"', "")
}

fn is_verification_supported_sse(sse: &Option<ServerSideEncryption>) -> bool {
    match sse {
        None => true,
        Some(sse) => *sse == ServerSideEncryption::Aes256,
    }
}
