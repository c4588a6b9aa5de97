use mirath_core::HeirType;

use crate::OutputFormat;

pub(crate) fn cmd_heirs(output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => {
            let heirs: serde_json::Value = HeirType::ALL
                .iter()
                .map(|h| {
                    serde_json::json!({
                        "key": h.key(),
                        "label": h.label(),
                        "max_count": h.max_count(),
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&heirs)
                    .unwrap_or_else(|e| format!("serialization error: {}", e))
            );
        }
        OutputFormat::Text => {
            for h in HeirType::ALL {
                match h.max_count() {
                    Some(max) => println!("{:<22} {} (at most {})", h.key(), h.label(), max),
                    None => println!("{:<22} {}", h.key(), h.label()),
                }
            }
        }
    }
}
