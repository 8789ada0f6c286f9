use console::style;
use serde::Serialize;
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};

/// Output format mode
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Human,
    Json,
}

pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Human
            },
        }
    }

    pub fn success(&self, message: impl Display) {
        match self.format {
            OutputFormat::Human => {
                println!("{} {}", style("✓").green().bold(), message);
            }
            OutputFormat::Json => print_status("success", message),
        }
    }

    pub fn info(&self, message: impl Display) {
        match self.format {
            OutputFormat::Human => {
                println!("{} {}", style("ℹ").blue().bold(), message);
            }
            OutputFormat::Json => {}
        }
    }

    pub fn warning(&self, message: impl Display) {
        match self.format {
            OutputFormat::Human => {
                eprintln!("{} {}", style("⚠").yellow().bold(), message);
            }
            OutputFormat::Json => {}
        }
    }

    pub fn table<T: Tabled>(&self, data: Vec<T>) {
        if let OutputFormat::Human = self.format {
            if data.is_empty() {
                println!("{}", style("(no data)").dim());
            } else {
                let mut table = Table::new(data);
                table.with(Style::rounded());
                println!("{}", table);
            }
        }
    }

    /// Emit a structured result; JSON mode wraps it in a status envelope
    pub fn result<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Human => {
                println!("{}", serde_json::to_string_pretty(&data)?);
            }
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "status": "success",
                    "data": data,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
        Ok(())
    }

    pub fn kv(&self, key: impl Display, value: impl Display) {
        if let OutputFormat::Human = self.format {
            println!("{}: {}", style(key).bold(), value);
        }
    }

    pub fn section(&self, title: impl Display) {
        if let OutputFormat::Human = self.format {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}

fn print_status(status: &str, message: impl Display) {
    let output = serde_json::json!({
        "status": status,
        "message": message.to_string(),
    });
    println!("{}", output);
}
