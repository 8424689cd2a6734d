use std::io::Write;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::database::models::AccessToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

/// What a command produced. Commands hand this to a [`Printer`] and never
/// write to the terminal themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    Token(AccessToken),
    Tokens(Vec<AccessToken>),
    Message { text: String, data: Option<Value> },
    Nothing,
}

impl CommandOutput {
    pub fn message(text: impl Into<String>) -> Self {
        CommandOutput::Message {
            text: text.into(),
            data: None,
        }
    }

    pub fn message_with(text: impl Into<String>, data: Value) -> Self {
        CommandOutput::Message {
            text: text.into(),
            data: Some(data),
        }
    }
}

pub trait Printer: Send {
    fn print(&mut self, output: &CommandOutput) -> anyhow::Result<()>;
}

/// Writes rendered output to stdout
pub struct ConsolePrinter {
    format: OutputFormat,
}

impl ConsolePrinter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl Printer for ConsolePrinter {
    fn print(&mut self, output: &CommandOutput) -> anyhow::Result<()> {
        if let Some(rendered) = render(self.format, output)? {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", rendered.trim_end())?;
        }
        Ok(())
    }
}

/// Keeps everything it is given; used to check what a command emitted
#[derive(Debug, Default)]
pub struct BufferedPrinter {
    pub outputs: Vec<CommandOutput>,
}

impl BufferedPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl Printer for BufferedPrinter {
    fn print(&mut self, output: &CommandOutput) -> anyhow::Result<()> {
        self.outputs.push(output.clone());
        Ok(())
    }
}

/// Render an output in `format`. `Nothing` renders to `None`.
pub fn render(format: OutputFormat, output: &CommandOutput) -> anyhow::Result<Option<String>> {
    if matches!(output, CommandOutput::Nothing) {
        return Ok(None);
    }

    let rendered = match format {
        OutputFormat::Text => render_text(output),
        OutputFormat::Json => serde_json::to_string_pretty(&structured(output)?)?,
        OutputFormat::Yaml => serde_yaml::to_string(&structured(output)?)?,
    };
    Ok(Some(rendered))
}

fn structured(output: &CommandOutput) -> anyhow::Result<Value> {
    let value = match output {
        CommandOutput::Token(token) => serde_json::to_value(token)?,
        CommandOutput::Tokens(tokens) => json!({ "tokens": tokens }),
        CommandOutput::Message { text, data } => {
            let mut response = Map::new();
            response.insert("success".to_string(), Value::Bool(true));
            response.insert("message".to_string(), Value::String(text.clone()));
            match data {
                Some(Value::Object(fields)) => response.extend(fields.clone()),
                Some(other) => {
                    response.insert("data".to_string(), other.clone());
                }
                None => {}
            }
            Value::Object(response)
        }
        CommandOutput::Nothing => Value::Null,
    };
    Ok(value)
}

fn render_text(output: &CommandOutput) -> String {
    match output {
        CommandOutput::Token(token) => {
            let mut lines = vec![format!("Token ID: {}", token.id)];
            if let Some(secret) = &token.token {
                lines.push(format!("Access Token: {}", secret));
            }
            lines.push(format!("User: {}", token.user_id));
            if !token.description.is_empty() {
                lines.push(format!("Description: {}", token.description));
            }
            lines.join("\n")
        }
        CommandOutput::Tokens(tokens) => {
            let mut lines = vec![
                format!("{:<34} {:<18} {}", "ID", "CREATED", "DESCRIPTION"),
                "-".repeat(80),
            ];
            for token in tokens {
                lines.push(format!(
                    "{:<34} {:<18} {}",
                    token.id,
                    token.created_at.format("%Y-%m-%d %H:%M"),
                    token.description
                ));
            }
            lines.join("\n")
        }
        CommandOutput::Message { text, .. } => format!("✓ {}", text),
        CommandOutput::Nothing => String::new(),
    }
}

/// Pick the named item, or fall back to the current one
pub fn resolve_target_item(
    provided_name: Option<String>,
    current_getter: impl Fn() -> anyhow::Result<Option<String>>,
    item_type: &str,
) -> anyhow::Result<String> {
    match provided_name {
        Some(name) => Ok(name),
        None => current_getter()?.ok_or_else(|| anyhow::anyhow!("No current {} set", item_type)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn nothing_renders_nothing() {
        for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Yaml] {
            assert!(render(format, &CommandOutput::Nothing).unwrap().is_none());
        }
    }

    #[test]
    fn text_shows_the_secret_once_it_exists() {
        let token = AccessToken::generate(Uuid::new_v4(), "ci");
        let secret = token.token.clone().unwrap();

        let fresh = render(OutputFormat::Text, &CommandOutput::Token(token.clone())).unwrap().unwrap();
        assert!(fresh.contains(&secret));

        let listed = render(OutputFormat::Text, &CommandOutput::Tokens(vec![token.sanitized()]))
            .unwrap()
            .unwrap();
        assert!(!listed.contains(&secret));
        assert!(listed.contains(&token.id));
    }

    #[test]
    fn messages_merge_object_data() {
        let output = CommandOutput::message_with("Switched", json!({ "current_server": "prod" }));
        let rendered = render(OutputFormat::Json, &output).unwrap().unwrap();
        let value: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["current_server"], "prod");
        assert_eq!(value["success"], true);

        let yaml = render(OutputFormat::Yaml, &output).unwrap().unwrap();
        assert!(yaml.contains("current_server: prod"));
    }

    #[test]
    fn buffered_printer_records_outputs() {
        let mut printer = BufferedPrinter::new();
        assert!(printer.is_empty());
        printer.print(&CommandOutput::message("done")).unwrap();
        assert_eq!(printer.outputs, vec![CommandOutput::message("done")]);
    }
}
