use anyhow::Result;
use super::{build_service, ServiceOptions};

pub fn run(options: &ServiceOptions) -> Result<()> {
    let service = build_service(options)?;
    let registry = service.registry();

    if registry.is_empty() {
        println!("No CRSs registered");
        return Ok(());
    }

    println!("{:<18} {:<8} {}", "SRID", "COUNTRY", "TITLE");
    println!("{}", "-".repeat(60));

    let index = service.crs_index();
    for country in index.countries() {
        for srid in index.get(country).unwrap_or_default() {
            let info = registry.lookup(srid)?;
            println!("{:<18} {:<8} {}", srid, country, info.title_short);
        }
    }

    println!();
    println!(
        "Total: {} CRSs in {} countries",
        registry.len(),
        index.len()
    );

    Ok(())
}
