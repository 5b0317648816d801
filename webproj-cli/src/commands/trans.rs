use anyhow::{Context, Result};
use super::{build_service, format_component, ServiceOptions};

pub fn run(options: &ServiceOptions, src: &str, dst: &str, coords: &str, json: bool) -> Result<()> {
    let service = build_service(options)?;

    let result = service
        .transform_str(src, dst, coords)
        .with_context(|| format!("Failed to transform {coords} from {src} to {dst}"))?;

    if json {
        println!("{}", serde_json::to_string(&result)?);
    } else {
        println!(
            "{} {} {} {}",
            result.v1,
            result.v2,
            format_component(result.v3),
            format_component(result.v4)
        );
    }

    Ok(())
}
