//! CLI Doctor Command
//!
//! Checks configuration, AWS credentials, and the multimodal API key without
//! starting the server or calling any vendor API.

use anyhow::Result;

use formlens_config::{GatewayConfig, validate};
use formlens_understanding::TextractProvider;

use crate::terminal_output::{CheckStatus, print_check};

/// Executes the full doctor diagnosis. Returns whether every required check passed.
pub async fn run(config: &GatewayConfig) -> Result<bool> {
    println!("\nRunning formlens doctor...\n");

    let mut all_good = check_config(config);
    all_good &= check_aws_credentials(config).await;
    check_vision_key(config);
    check_log_dir(config);

    println!();
    if all_good {
        println!("All required checks passed.");
    } else {
        println!("Some checks failed. Fix the errors above before serving.");
    }

    Ok(all_good)
}

fn check_config(config: &GatewayConfig) -> bool {
    println!("Configuration:");
    let report = validate(config);

    for error in &report.errors {
        print_check(CheckStatus::Fail, &error.path, &error.message);
    }
    for warning in &report.warnings {
        print_check(CheckStatus::Warn, &warning.path, &warning.message);
    }
    if report.errors.is_empty() && report.warnings.is_empty() {
        print_check(CheckStatus::Pass, "environment", "valid");
    }

    report.is_valid()
}

async fn check_aws_credentials(config: &GatewayConfig) -> bool {
    println!("AWS Textract:");
    let endpoint = config.textract.endpoint_url();
    let provider =
        TextractProvider::from_default_chain(reqwest::Client::new(), &config.textract.region, endpoint)
            .await;
    print_check(CheckStatus::Pass, "endpoint", provider.endpoint());

    match provider.check_credentials().await {
        Ok(()) => {
            print_check(CheckStatus::Pass, "credentials", "resolved from default chain");
            true
        }
        Err(_) => {
            print_check(CheckStatus::Fail, "credentials", "not found in the AWS default chain");
            false
        }
    }
}

fn check_vision_key(config: &GatewayConfig) {
    println!("Header enrichment:");
    if config.vision_enabled() {
        print_check(CheckStatus::Pass, "OPENAI_API_KEY", "set");
    } else {
        print_check(
            CheckStatus::Warn,
            "OPENAI_API_KEY",
            "not set (optional; /api/analyze-vision-context will fail)",
        );
    }
}

fn check_log_dir(config: &GatewayConfig) {
    println!("Logging:");
    let dir = &config.server.log_dir;
    let detail = dir.display().to_string();
    match std::fs::create_dir_all(dir) {
        Ok(()) => print_check(CheckStatus::Pass, "log directory", &detail),
        Err(e) => print_check(CheckStatus::Warn, "log directory", &format!("{detail}: {e}")),
    }
}
