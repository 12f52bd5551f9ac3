use std::path::Path;

use crate::app::{AppContext, Result};
use crate::fetcher::file_fetcher::FileResourceFetcher;
use crate::fetcher::json::get_property_from_json_url;
use crate::fetcher::ResourceFetcher;

pub async fn get(
    ctx: &AppContext,
    url: &str,
    hide_url: bool,
    name: Option<String>,
    throw: bool,
) -> Result<()> {
    let mut options = ctx.options();
    if hide_url {
        options.show_url = false;
    }
    if let Some(name) = name {
        options = options.with_friendly_name(name);
    }
    if throw {
        options = options.with_throw_on_error(true);
    }

    let fetcher = ctx.fetcher(url, options)?;
    match fetcher.get().await? {
        Some(response) => {
            let status = response.status();
            let body = response.text().await?;
            eprintln!("Status: {}", status);
            println!("{}", body);
        }
        None => {
            eprintln!("Download failed");
        }
    }

    Ok(())
}

pub async fn etag(ctx: &AppContext, url: &str, etag: Option<&str>) -> Result<()> {
    let fetcher = ctx.fetcher(url, ctx.options())?;
    let result = fetcher.get_new_etag_content(etag).await?;

    println!("E-Tag: {}", result.etag);
    match result.content {
        Some(content) => println!("{}", content),
        None => println!("Not modified"),
    }

    Ok(())
}

pub async fn property(ctx: &AppContext, url: &str, property: &str) -> Result<()> {
    let fetcher = ctx.fetcher(url, ctx.options())?;

    match get_property_from_json_url(url, property, Some(&fetcher)).await {
        Some(value) => println!("{}", value),
        None => println!("Property not found: {}", property),
    }

    Ok(())
}

pub async fn file(path: &Path) -> Result<()> {
    let fetcher = FileResourceFetcher::new(path);

    match fetcher.get().await? {
        Some(contents) => print!("{}", contents),
        None => eprintln!("Could not read {}", path.display()),
    }

    Ok(())
}
