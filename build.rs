fn main() {
    // Build information for `s3upload --version`
    #[cfg(feature = "version")]
    shadow_rs::ShadowBuilder::builder()
        .build()
        .expect("failed to generate build information");
}
