//! CLI Status Command
//!
//! Queries `/health` on the configured port.

use anyhow::Result;
use serde_json::Value;

use formlens_config::GatewayConfig;

use crate::terminal_output::note_error;

pub async fn run(config: &GatewayConfig) -> Result<()> {
    let url = health_url(config.server.port);
    println!("formlens status: checking {url}");

    match reqwest::Client::new().get(&url).send().await {
        Ok(resp) => {
            let body: Value = resp.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        Err(_) => {
            note_error(&format!(
                "formlens gateway is not running on port {}",
                config.server.port
            ));
        }
    }

    Ok(())
}

fn health_url(port: u16) -> String {
    format!("http://127.0.0.1:{port}/health")
}
