use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Loads the SDK config from the default provider chain, honoring an
/// explicit profile and region when given. Falls back to us-east-1 so the
/// tool still runs in an environment with no region configured at all.
pub async fn get_config(profile: Option<&str>, region: Option<&str>) -> SdkConfig {
    let region_provider = RegionProviderChain::first_try(region.map(|r| Region::new(r.to_owned())))
        .or_default_provider()
        .or_else(Region::new("us-east-1"));

    let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);

    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }

    loader.load().await
}
