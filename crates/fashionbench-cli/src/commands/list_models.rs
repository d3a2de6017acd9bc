//! The `fashionbench list-models` command.

use std::path::PathBuf;

use anyhow::Result;

use fashionbench_core::traits::{ModelInfo, Responder};
use fashionbench_providers::config::{load_config_from, ProviderConfig, SIMULATED};
use fashionbench_providers::ollama::OllamaResponder;
use fashionbench_providers::{create_responder, SimulatedResponder};

fn print_models(provider: &str, models: &[ModelInfo]) {
    println!("Provider: {provider}");
    for model in models {
        if model.max_context > 0 {
            println!(
                "  {} - {} ({}K context)",
                model.id,
                model.name,
                model.max_context / 1000
            );
        } else {
            println!("  {} - {}", model.id, model.name);
        }
    }
    println!();
}

pub async fn execute(provider_filter: Option<String>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let wanted = |name: &str| provider_filter.as_deref().map_or(true, |f| f == name);

    if wanted(SIMULATED) {
        print_models(SIMULATED, &SimulatedResponder::new().available_models());
    }

    let mut names: Vec<&String> = config.providers.keys().collect();
    names.sort();

    let mut found_any = false;
    for name in names {
        if !wanted(name.as_str()) {
            continue;
        }
        let provider_config = &config.providers[name];

        let models = match provider_config {
            ProviderConfig::Ollama { base_url } => {
                match OllamaResponder::new(base_url).list_models_async().await {
                    Ok(models) => models,
                    Err(e) => {
                        eprintln!("Provider: {name}\n  unavailable: {e:#}\n");
                        continue;
                    }
                }
            }
            _ => create_responder(provider_config)?.available_models(),
        };

        if !models.is_empty() {
            found_any = true;
            print_models(name, &models);
        }
    }

    if !found_any && provider_filter.as_deref() != Some(SIMULATED) {
        println!("No live providers configured. Run `fashionbench init` to create a config file.");
    }

    Ok(())
}
