use anyhow::Result;
use serde::Serialize;
use webproj::CrsInfo;

use super::{build_service, ServiceOptions};

#[derive(Serialize)]
struct InfoResponse<'a> {
    srid: &'a str,
    #[serde(flatten)]
    info: &'a CrsInfo,
}

pub fn run(options: &ServiceOptions, srid: &str, json: bool) -> Result<()> {
    let service = build_service(options)?;
    let info = service.crs_info(srid)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&InfoResponse { srid, info })?);
        return Ok(());
    }

    println!("CRS: {}", srid);
    println!("Title: {} ({})", info.title, info.title_short);
    println!(
        "Country: {}{}",
        info.country,
        if info.global { " (global)" } else { "" }
    );
    println!();

    let axes = [
        (&info.v1, &info.v1_short),
        (&info.v2, &info.v2_short),
        (&info.v3, &info.v3_short),
        (&info.v4, &info.v4_short),
    ];
    for (i, (name, short)) in axes.iter().enumerate() {
        if let Some(name) = name {
            println!(
                "v{}: {} [{}]",
                i + 1,
                name,
                short.as_deref().unwrap_or("-")
            );
        }
    }
    println!();

    let [west, south, east, north] = info.bounding_box;
    println!("Area of use: {}", info.area_of_use);
    println!(
        "Bounding box: W {} S {} E {} N {}",
        west, south, east, north
    );

    Ok(())
}
