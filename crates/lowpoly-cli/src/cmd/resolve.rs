use std::path::Path;

use lowpoly_core::http::build_client;
use lowpoly_core::imgur::ImgurClient;
use lowpoly_core::resolver::ImageResolver;

use crate::output::print_json;

pub fn run(config_path: &Path, url: &str, client_id: &str, json: bool) -> anyhow::Result<()> {
    let config = super::config_or_default(config_path)?;
    let http = build_client(&config.http.user_agent, config.http.timeout())?;
    let imgur = ImgurClient::new(http, &config.http.imgur_api_url, client_id);
    let link = ImageResolver::new(&imgur).resolve(url)?;

    if json {
        return print_json(&serde_json::json!({ "url": url, "image": link }));
    }
    match link {
        Some(link) => println!("{link}"),
        None => println!("no image found for {url}"),
    }
    Ok(())
}
