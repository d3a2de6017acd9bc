//! The `fashionbench validate` command.

use std::path::PathBuf;

use anyhow::Result;

use fashionbench_core::parser;

pub fn execute(path: PathBuf) -> Result<()> {
    let datasets = if path.is_dir() {
        parser::load_dataset_directory(&path)?
    } else {
        let task = parser::task_for_path(&path).ok_or_else(|| {
            anyhow::anyhow!(
                "cannot tell the task of {}: expected a <task>.jsonl file name",
                path.display()
            )
        })?;
        vec![parser::load_dataset(&path, task)?]
    };

    anyhow::ensure!(
        !datasets.is_empty(),
        "no task datasets found in {}",
        path.display()
    );

    let mut total_warnings = 0;

    for dataset in &datasets {
        println!("Dataset: {} ({} examples)", dataset.task, dataset.len());

        let warnings = parser::validate_dataset(dataset);
        for w in &warnings {
            let prefix = w
                .example_id
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All datasets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
