//! The `fashionbench list-tasks` command.

use anyhow::Result;
use comfy_table::Table;

use fashionbench_core::model::TaskKind;

pub fn execute() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Task", "Name", "Pass Threshold", "Dataset", "Description"]);

    for task in TaskKind::ALL {
        table.add_row(vec![
            task.as_str().to_string(),
            task.display_name().to_string(),
            format!("{:.1}", task.pass_threshold()),
            task.dataset_file(),
            task.description().to_string(),
        ]);
    }

    println!("{table}");
    Ok(())
}
