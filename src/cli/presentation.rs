//! CLI presentation: formatting of command results.

use crate::error::ApiError;
use crate::registry::OperationInfo;
use comfy_table::Table;

pub fn format_operations(operations: &[OperationInfo], format: &str) -> Result<String, ApiError> {
    match format {
        "json" => {
            let arr: Vec<serde_json::Value> = operations
                .iter()
                .map(|op| {
                    serde_json::json!({
                        "name": op.name.as_str(),
                        "async": op.is_async,
                    })
                })
                .collect();
            serde_json::to_string_pretty(&arr)
                .map_err(|e| ApiError::Config(format!("Failed to encode operations: {}", e)))
        }
        "text" => {
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Operation", "Async"]);
            for op in operations {
                let is_async = match op.is_async {
                    Some(true) => "yes",
                    Some(false) => "no",
                    None => "-",
                };
                table.add_row(vec![op.name.as_str(), is_async]);
            }
            Ok(table.to_string())
        }
        other => Err(ApiError::Config(format!(
            "Invalid output format: {} (must be 'json' or 'text')",
            other
        ))),
    }
}
