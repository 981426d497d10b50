use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;

use crate::domain::Run;
use crate::error::FetchError;

#[derive(Debug, Clone)]
pub struct Store {
    save_dir: Utf8PathBuf,
}

impl Store {
    pub fn new() -> Result<Self, FetchError> {
        let save_dir = BaseDirs::new()
            .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.home_dir().join("data")).ok())
            .ok_or_else(|| FetchError::Filesystem("unable to resolve home directory".to_string()))?;
        Ok(Self { save_dir })
    }

    pub fn with_save_dir(save_dir: Utf8PathBuf) -> Self {
        Self { save_dir }
    }

    pub fn save_dir(&self) -> &Utf8Path {
        &self.save_dir
    }

    pub fn local_path(&self, run: &Run, local_file: &str) -> Utf8PathBuf {
        self.save_dir
            .join(&run.model)
            .join(run.date_label())
            .join(local_file)
    }

    pub fn subset_path(base: &Utf8Path, messages: &[f64]) -> Utf8PathBuf {
        let name = base.file_name().unwrap_or_default();
        let stem = name.strip_suffix(".grib2").unwrap_or(name);
        let mut sorted = messages.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let label = sorted
            .iter()
            .map(|message| format_message(*message))
            .collect::<Vec<_>>()
            .join("-");
        base.with_file_name(format!("{stem}.grib2.subset_{label}"))
    }

    pub fn ensure_parent(path: &Utf8Path) -> Result<(), FetchError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| FetchError::Filesystem(err.to_string()))?;
        }
        Ok(())
    }
}

pub fn format_message(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
