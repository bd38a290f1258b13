use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::{
    core::assembler::TopLevelConfig,
    ports::config_sink::{ConfigSink, SinkResult},
};

/// Where a [`FileConfigSink`] writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    /// `-` means stdout, anything else is a file path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdout
        } else {
            Self::File(PathBuf::from(arg))
        }
    }
}

/// Config sink that writes the JSON document to a file or to stdout.
pub struct FileConfigSink {
    target: OutputTarget,
    pretty: bool,
}

impl FileConfigSink {
    pub fn new(target: OutputTarget, pretty: bool) -> Self {
        Self { target, pretty }
    }

    fn render(&self, config: &TopLevelConfig) -> SinkResult<Vec<u8>> {
        let mut json = if self.pretty {
            serde_json::to_vec_pretty(config)?
        } else {
            serde_json::to_vec(config)?
        };
        json.push(b'\n');
        Ok(json)
    }
}

#[async_trait]
impl ConfigSink for FileConfigSink {
    async fn emit(&self, config: &TopLevelConfig) -> SinkResult<()> {
        let json = self.render(config)?;

        match &self.target {
            OutputTarget::Stdout => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(&json).await?;
                stdout.flush().await?;
            }
            OutputTarget::File(path) => {
                tokio::fs::write(path, &json).await?;
                tracing::debug!(path = %path.display(), bytes = json.len(), "Wrote config file");
            }
        }

        Ok(())
    }

    fn describe(&self) -> String {
        match &self.target {
            OutputTarget::Stdout => "stdout".to_string(),
            OutputTarget::File(path) => format!("file {}", path.display()),
        }
    }
}
