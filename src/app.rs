use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use tracing::warn;

use crate::config::Config;
use crate::domain::{Run, RunSpec, SourceId, normalize_model, resolve_times};
use crate::error::FetchError;
use crate::fetch::{ErrorMode, Transfer};
use crate::index::{IndexAttrs, IndexTable};
use crate::model::{ModelRegistry, ModelTemplate};
use crate::remote::RemoteClient;
use crate::resolver::{Resolution, Resolver};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Default)]
pub struct FinderOptions {
    pub priority: Option<Vec<SourceId>>,
    pub save_dir: Option<Utf8PathBuf>,
    pub overwrite: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    pub overwrite: bool,
    pub errors: ErrorMode,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            errors: ErrorMode::Warn,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadOutcome {
    pub action: String,
    pub local: Option<String>,
    pub grib_source: Option<String>,
    pub idx_source: Option<String>,
    pub bytes: u64,
}

pub struct FileFinder<'a, C: RemoteClient> {
    run: Run,
    template: &'a dyn ModelTemplate,
    store: Store,
    client: C,
    resolution: Resolution,
    idx_cache: RefCell<Option<IndexTable>>,
}

impl<'a, C: RemoteClient> fmt::Debug for FileFinder<'a, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileFinder")
            .field("run", &self.run)
            .field("resolution", &self.resolution)
            .field("idx_cache", &self.idx_cache)
            .finish_non_exhaustive()
    }
}

impl<'a, C: RemoteClient> FileFinder<'a, C> {
    pub fn new(
        spec: RunSpec,
        registry: &'a ModelRegistry,
        config: &Config,
        client: C,
        options: FinderOptions,
    ) -> Result<Self, FetchError> {
        let model = normalize_model(&spec.model);
        let template = registry
            .get(&model)
            .ok_or_else(|| FetchError::UnknownModel(spec.model.clone()))?;
        let (date, valid_date) = resolve_times(spec.date, spec.valid_date, spec.fxx)?;
        let product = match spec.product {
            Some(product) => {
                if !template
                    .products()
                    .iter()
                    .any(|(code, _)| *code == product)
                {
                    return Err(FetchError::UnknownProduct { model, product });
                }
                product
            }
            None => {
                let product = template.default_product().to_string();
                warn!(%model, %product, "`product` not specified; using the model's first product");
                product
            }
        };
        let run = Run {
            date,
            valid_date,
            fxx: spec.fxx,
            model,
            product,
            member: spec.member,
        };

        let priority = options.priority.or_else(|| config.priority.clone());
        if let Some(priority) = &priority {
            let available = template.sources(&run);
            let overlaps = priority
                .iter()
                .any(|wanted| available.iter().any(|entry| &entry.source == wanted));
            if !overlaps {
                return Err(FetchError::PriorityMismatch {
                    model: run.model.clone(),
                });
            }
        }

        let store = match options.save_dir {
            Some(dir) => Store::with_save_dir(dir),
            None => Store::with_save_dir(config.save_dir.clone()),
        };

        let local_path = store.local_path(&run, &template.local_file(&run));
        let local_copy = (!options.overwrite && local_path.as_std_path().exists())
            .then_some(local_path.as_path());

        let resolution = Resolver::new(&client, &config.resolver).resolve(
            template,
            &run,
            priority.as_deref(),
            local_copy,
        );

        Ok(Self {
            run,
            template,
            store,
            client,
            resolution,
            idx_cache: RefCell::new(None),
        })
    }

    pub fn run(&self) -> &Run {
        &self.run
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn whole_file_path(&self) -> Utf8PathBuf {
        self.store
            .local_path(&self.run, &self.template.local_file(&self.run))
    }

    pub fn local_path(&self, pattern: Option<&str>) -> Result<Utf8PathBuf, FetchError> {
        match normalize_pattern(pattern) {
            None => Ok(self.whole_file_path()),
            Some(pattern) => {
                let table = self.read_index(Some(pattern))?;
                Ok(Store::subset_path(
                    &self.whole_file_path(),
                    &table.message_numbers(),
                ))
            }
        }
    }

    pub fn read_index(&self, pattern: Option<&str>) -> Result<IndexTable, FetchError> {
        let table = self.raw_index()?;
        match normalize_pattern(pattern) {
            Some(pattern) => table.filter(pattern),
            None => Ok(table),
        }
    }

    fn raw_index(&self) -> Result<IndexTable, FetchError> {
        if let Some(table) = self.idx_cache.borrow().as_ref() {
            return Ok(table.clone());
        }
        let idx_url = self
            .resolution
            .idx
            .as_deref()
            .ok_or_else(|| FetchError::IdxNotFound(self.run.describe()))?;
        let text = self
            .client
            .get_text(idx_url)
            .map_err(|err| FetchError::IdxNotFound(format!("{idx_url} ({err})")))?;
        let table = IndexTable::parse(
            &text,
            self.template.idx_style(),
            IndexAttrs {
                source: self.resolution.idx_source.clone(),
                model: self.run.model.clone(),
                product: self.run.product.clone(),
                lead_hours: self.run.fxx,
                run_date: self.run.date,
            },
        )?;
        *self.idx_cache.borrow_mut() = Some(table.clone());
        Ok(table)
    }

    pub fn download(
        &self,
        pattern: Option<&str>,
        options: FetchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<DownloadOutcome, FetchError> {
        let pattern = normalize_pattern(pattern);

        let table = match pattern {
            Some(pattern) if self.resolution.idx.is_some() => {
                Some(self.read_index(Some(pattern))?)
            }
            _ => None,
        };

        if let Some(table) = &table {
            if table.is_empty() {
                warn!(run = %self.run.describe(), "search pattern matched no GRIB messages; nothing to download");
                return Ok(self.outcome("skipped", None, 0));
            }
        }

        let out_file = match &table {
            Some(table) => Store::subset_path(&self.whole_file_path(), &table.message_numbers()),
            None => self.whole_file_path(),
        };

        if out_file.as_std_path().exists() && !options.overwrite {
            sink.event(ProgressEvent {
                message: format!("already have local copy {out_file}"),
                elapsed: None,
            });
            return Ok(self.outcome("cached", Some(out_file), 0));
        }

        let Some(location) = &self.resolution.grib else {
            return match options.errors {
                ErrorMode::Raise => Err(FetchError::GribNotFound(self.run.describe())),
                ErrorMode::Warn => {
                    warn!(run = %self.run.describe(), "GRIB2 file not found; skipping download");
                    Ok(self.outcome("skipped", None, 0))
                }
            };
        };

        if pattern.is_some() && table.is_none() {
            match options.errors {
                ErrorMode::Raise => return Err(FetchError::IdxNotFound(self.run.describe())),
                ErrorMode::Warn => {
                    warn!(run = %self.run.describe(), "index file not found; downloading the whole file instead");
                }
            }
        }

        let transfer = Transfer::new(&self.client);
        let (action, bytes) = match &table {
            Some(table) => ("subset", transfer.subset(location, table, &out_file, sink)?),
            None => ("downloaded", transfer.whole(location, &out_file, sink)?),
        };
        Ok(self.outcome(action, Some(out_file), bytes))
    }

    pub fn with_dataset<T, F>(
        &self,
        pattern: Option<&str>,
        options: FetchOptions,
        remove: bool,
        sink: &dyn ProgressSink,
        reader: F,
    ) -> Result<T, FetchError>
    where
        F: FnOnce(&Utf8Path) -> Result<T, FetchError>,
    {
        let local = self.local_path(pattern)?;
        let pre_existing = local.as_std_path().exists();
        if !pre_existing || options.overwrite {
            let outcome = self.download(pattern, options, sink)?;
            if outcome.local.is_none() {
                return Err(FetchError::GribNotFound(self.run.describe()));
            }
        }
        let value = reader(&local)?;
        // Only tidy up files this read brought in; anything that was already
        // cached stays cached.
        if remove && !pre_existing {
            fs::remove_file(local.as_std_path())
                .map_err(|err| FetchError::Filesystem(err.to_string()))?;
        }
        Ok(value)
    }

    fn outcome(&self, action: &str, local: Option<Utf8PathBuf>, bytes: u64) -> DownloadOutcome {
        DownloadOutcome {
            action: action.to_string(),
            local: local.map(|path| path.to_string()),
            grib_source: self
                .resolution
                .grib_source
                .as_ref()
                .map(ToString::to_string),
            idx_source: self.resolution.idx_source.as_ref().map(ToString::to_string),
            bytes,
        }
    }
}

fn normalize_pattern(pattern: Option<&str>) -> Option<&str> {
    match pattern {
        None | Some(":") | Some("") => None,
        Some(pattern) => Some(pattern),
    }
}
