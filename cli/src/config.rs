use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use toml_edit::DocumentMut;
use toml_edit::Item as TomlItem;

/// Values read from `~/.chat-composer/config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub agent: Option<String>,
    pub team: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn new_default() -> anyhow::Result<Self> {
        let Some(home) = dirs::home_dir() else {
            anyhow::bail!("cannot determine home directory for config path");
        };
        Ok(Self::new(default_config_path(&home)))
    }

    /// Read the config file. A missing file yields the defaults; a file that is not valid TOML
    /// is scanned line by line so a typo elsewhere does not hide the values we care about.
    pub fn load(&self) -> anyhow::Result<FileConfig> {
        let Some(content) = read_document_string(&self.path)? else {
            return Ok(FileConfig::default());
        };

        match content.parse::<DocumentMut>() {
            Ok(doc) => Ok(FileConfig {
                endpoint: read_string(&doc, None, "endpoint"),
                agent: read_string(&doc, Some("selection"), "agent"),
                team: read_string(&doc, Some("selection"), "team"),
            }),
            Err(err) => {
                tracing::warn!("config.toml is not valid TOML, scanning lines instead: {err}");
                Ok(parse_fallback(&content))
            }
        }
    }
}

fn default_config_path(home: &Path) -> PathBuf {
    home.join(".chat-composer").join("config.toml")
}

fn read_string(doc: &DocumentMut, table: Option<&str>, key: &str) -> Option<String> {
    let item = match table {
        Some(table) => doc
            .get(table)
            .and_then(TomlItem::as_table)
            .and_then(|table| table.get(key)),
        None => doc.get(key),
    };
    item.and_then(TomlItem::as_str).map(str::to_string)
}

fn parse_fallback(contents: &str) -> FileConfig {
    let mut config = FileConfig::default();
    let mut table: Option<String> = None;

    for line in contents.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if trimmed.starts_with('[') {
            // An unreadable header still ends the previous table; its keys belong nowhere.
            table = Some(parse_table_header_name(trimmed).unwrap_or_default().to_string());
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        // The quoted value is read first so a `#` inside it is not taken for a comment.
        let Some(value) = parse_basic_string(value.trim()) else {
            continue;
        };
        match (table.as_deref(), key.trim()) {
            (None, "endpoint") => config.endpoint = Some(value),
            (Some("selection"), "agent") => config.agent = Some(value),
            (Some("selection"), "team") => config.team = Some(value),
            _ => {}
        }
    }

    config
}

fn parse_table_header_name(line: &str) -> Option<&str> {
    let line = line.trim_start();
    if !line.starts_with('[') {
        return None;
    }
    let end = line.find(']')?;
    if end <= 1 {
        return None;
    }
    let name = line[1..end].trim();
    if name.is_empty() { None } else { Some(name) }
}

/// Accepts `"value"` or `'value'` without escapes.
fn parse_basic_string(value: &str) -> Option<String> {
    let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let rest = &value[1..];
    let end = rest.find(quote)?;
    Some(rest[..end].to_string())
}

fn read_document_string(path: &Path) -> anyhow::Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(anyhow::Error::new(err).context("read config.toml")),
    }
}
