//! The `fashionbench init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create fashionbench.toml
    if Path::new("fashionbench.toml").exists() {
        println!("fashionbench.toml already exists, skipping.");
    } else {
        std::fs::write("fashionbench.toml", SAMPLE_CONFIG)?;
        println!("Created fashionbench.toml");
    }

    // Create starter datasets
    std::fs::create_dir_all("datasets")?;
    for (file, content) in SAMPLE_DATASETS {
        let path = Path::new("datasets").join(file);
        if path.exists() {
            println!("{} already exists, skipping.", path.display());
        } else {
            std::fs::write(&path, content)?;
            println!("Created {}", path.display());
        }
    }

    println!("\nNext steps:");
    println!("  1. Run offline: fashionbench run --model simulated");
    println!("  2. Edit fashionbench.toml with your API keys");
    println!("  3. Run: fashionbench run --model anthropic/claude-sonnet-4-20250514");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# fashionbench configuration

default_provider = "anthropic"
default_model = "simulated"
default_temperature = 0.0
parallelism = 4
max_retries = 3
retry_delay_ms = 1000
datasets_dir = "datasets"
output_dir = "fashionbench-results"

[providers.anthropic]
type = "anthropic"
api_key = "${ANTHROPIC_API_KEY}"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

[providers.ollama]
type = "ollama"
base_url = "http://localhost:11434"

[scoring.detection_weights]
text = 0.6
signals = 0.4

# [scoring.task_weights]
# product_extraction = 2.0

# [[scoring.extra_synonyms]]
# canonical = "edgy"
# alternates = ["grunge", "punk"]
"#;

const SAMPLE_DATASETS: &[(&str, &str)] = &[
    (
        "style_classification.jsonl",
        r#"{"id": 1, "description": "Floral maxi dress with a woven basket bag and sandals", "expected": "Bohemian/Boho"}
{"id": 2, "description": "Oversized hoodie, joggers and chunky sneakers", "expected": "Athleisure/Sporty"}
"#,
    ),
    (
        "trend_detection.jsonl",
        r#"{"id": 1, "context": "Hot pink dominated every runway and street style gallery this season", "question": "What trend is this?", "expected": "Barbiecore and Y2K pink aesthetic revival"}
"#,
    ),
];
