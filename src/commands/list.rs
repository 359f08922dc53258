use anyhow::{Context, Result};

use crate::directory::SortKey;
use crate::registry::Registry;
use crate::service::{Listing, SchoolService};

pub async fn run<R: Registry>(
    service: &SchoolService<R>,
    query: &str,
    sort: Option<SortKey>,
) -> Result<()> {
    match service.browse(query, sort).await.context("listing schools")? {
        Listing::Empty => {
            log::info!("No schools found");
            println!("[]");
        }
        Listing::NoMatches => {
            log::info!("No schools match {:?}", query);
            println!("[]");
        }
        Listing::Schools(schools) => {
            println!("{}", serde_json::to_string_pretty(&schools)?);
        }
    }
    Ok(())
}
