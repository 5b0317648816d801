//! Basic example demonstrating webproj library usage.
//!
//! Run with: cargo run --example basic

use webproj::{TransformService, WebprojError};

fn main() -> Result<(), WebprojError> {
    let service = TransformService::new()?;

    let requests = [
        ("EPSG:4258", "EPSG:25832", "56.0,12.0"),
        ("EPSG:4326", "EPSG:25832", "55.68950140789923,12.58696909994519,10"),
        ("EPSG:25832", "EPSG:4258", "725448.0,6177355.0"),
        ("EPSG:4258", "EPSG:4909", "55.0,12.0"),
        ("DK:S34J", "EPSG:25832", "295799.3977,175252.0903"),
    ];

    println!("Transformations:");
    println!("{:-<60}", "");

    for (src, dst, coords) in &requests {
        match service.transform_str(src, dst, coords) {
            Ok(r) => println!(
                "{src} -> {dst} [{coords}]: v1={} v2={} v3={:?} v4={:?}",
                r.v1, r.v2, r.v3, r.v4
            ),
            Err(e) => println!("{src} -> {dst} [{coords}]: {e}"),
        }
    }

    // Show cache statistics
    let stats = service.cache_stats();
    println!("\nCache statistics:");
    println!("  Cached transformers: {}", stats.entry_count);
    println!("  Hits: {}", stats.hit_count);
    println!("  Misses: {}", stats.miss_count);
    println!("  Hit rate: {:.1}%", stats.hit_rate() * 100.0);

    Ok(())
}
