use std::sync::OnceLock;

use base64::{Engine as _, engine::general_purpose};

/// One unit of input bytes. In multipart mode each chunk becomes exactly one part.
///
/// The MD5 digest is calculated on first use and cached, so the body is hashed at most once
/// no matter whether the digest is needed for the `Content-MD5` header, for the resume
/// comparison, or for the ETag verification.
pub struct Chunk {
    body: Vec<u8>,
    md5_digest: OnceLock<md5::Digest>,
}

impl Chunk {
    pub fn new(body: Vec<u8>) -> Self {
        Chunk {
            body,
            md5_digest: OnceLock::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn md5_digest(&self) -> &md5::Digest {
        self.md5_digest.get_or_init(|| md5::compute(&self.body))
    }

    /// Base64 encoded digest for the `Content-MD5` header.
    pub fn content_md5(&self) -> String {
        general_purpose::STANDARD.encode(self.md5_digest().as_slice())
    }

    /// Lower-case hex digest, the form S3 reports as the ETag of a part.
    pub fn hex_digest(&self) -> String {
        hex::encode(self.md5_digest().as_slice())
    }

    #[cfg(test)]
    fn is_digest_calculated(&self) -> bool {
        self.md5_digest.get().is_some()
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(body: Vec<u8>) -> Self {
        Chunk::new(body)
    }
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("len", &self.body.len())
            .field("md5_digest", &self.md5_digest.get().map(|d| format!("{d:x}")))
            .finish()
    }
}
