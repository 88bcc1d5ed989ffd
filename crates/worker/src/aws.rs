use aws_config::BehaviorVersion;
use aws_types::region::Region;
use aws_types::SdkConfig;
use tracing::debug;

/// Load the shared SDK config, overriding the region when one is configured.
/// Credentials come from the SDK's default provider chain.
pub async fn load_sdk_config(region: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }
    let config = loader.load().await;
    debug!(region = ?config.region(), "AWS SDK config loaded");
    config
}
