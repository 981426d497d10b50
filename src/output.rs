use std::io::{self, Write};

use serde::Serialize;

use crate::app::{DownloadOutcome, ProgressEvent, ProgressSink};
use crate::index::IndexTable;
use crate::model::ModelRegistry;
use crate::resolver::ResolutionSummary;

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_download(result: &DownloadOutcome) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_index(result: &IndexTable) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_sources(result: &ResolutionSummary) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_models(result: &ModelsResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelsResult {
    pub models: Vec<ModelInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub description: String,
    pub products: Vec<ProductInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductInfo {
    pub code: String,
    pub description: String,
}

impl ModelsResult {
    pub fn from_registry(registry: &ModelRegistry) -> Self {
        let models = registry
            .names()
            .into_iter()
            .filter_map(|name| registry.get(name))
            .map(|template| ModelInfo {
                name: template.name().to_string(),
                description: template.description().to_string(),
                products: template
                    .products()
                    .iter()
                    .map(|(code, description)| ProductInfo {
                        code: code.to_string(),
                        description: description.to_string(),
                    })
                    .collect(),
            })
            .collect();
        Self { models }
    }
}

pub struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("{} [{:.1}s]", event.message, elapsed.as_secs_f64()),
            None => eprintln!("{}", event.message),
        }
    }
}
