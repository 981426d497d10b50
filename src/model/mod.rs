use std::collections::BTreeMap;

use crate::domain::{Run, SourceEntry};

mod ecmwf;
mod gfs;
mod hrrr;
mod rap;

pub use ecmwf::Ecmwf;
pub use gfs::Gfs;
pub use hrrr::{Hrrr, HrrrAk};
pub use rap::Rap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdxStyle {
    Wgrib2,
    Eccodes,
}

pub trait ModelTemplate {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn products(&self) -> &'static [(&'static str, &'static str)];

    fn sources(&self, run: &Run) -> Vec<SourceEntry>;

    fn default_product(&self) -> &'static str {
        self.products().first().map(|(code, _)| *code).unwrap_or("")
    }

    fn local_file(&self, run: &Run) -> String {
        self.sources(run)
            .first()
            .and_then(|entry| entry.url.rsplit('/').next().map(str::to_string))
            .unwrap_or_default()
    }

    fn idx_style(&self) -> IdxStyle {
        IdxStyle::Wgrib2
    }

    fn idx_suffix(&self) -> &'static str {
        ".idx"
    }

    fn idx_url(&self, grib_url: &str) -> String {
        format!("{grib_url}{}", self.idx_suffix())
    }
}

pub struct ModelRegistry {
    models: BTreeMap<String, Box<dyn ModelTemplate>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            models: BTreeMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(Hrrr));
        registry.register(Box::new(HrrrAk));
        registry.register(Box::new(Rap));
        registry.register(Box::new(Gfs));
        registry.register(Box::new(Ecmwf));
        registry
    }

    pub fn register(&mut self, template: Box<dyn ModelTemplate>) {
        self.models.insert(template.name().to_string(), template);
    }

    pub fn get(&self, name: &str) -> Option<&dyn ModelTemplate> {
        self.models.get(name).map(|template| template.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.models.keys().map(String::as_str).collect()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::domain::{SourceId, parse_datetime, resolve_times};

    fn run(model: &str, product: &str) -> Run {
        let init = parse_datetime("2022-01-26 00:00").unwrap();
        let (date, valid_date) = resolve_times(Some(init), None, 0).unwrap();
        Run {
            date,
            valid_date,
            fxx: 0,
            model: model.to_string(),
            product: product.to_string(),
            member: 1,
        }
    }

    #[test]
    fn builtin_registry_lookup() {
        let registry = ModelRegistry::builtin();
        assert!(registry.get("hrrr").is_some());
        assert!(registry.get("ecmwf").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(
            registry.names(),
            vec!["ecmwf", "gfs", "hrrr", "hrrrak", "rap"]
        );
    }

    #[test]
    fn hrrr_aws_url() {
        let template = Hrrr;
        let run = run("hrrr", "sfc");
        let sources = template.sources(&run);
        assert_eq!(sources[0].source, SourceId::from("aws"));
        assert_eq!(
            sources[0].url,
            "https://noaa-hrrr-bdp-pds.s3.amazonaws.com/hrrr.20220126/conus/hrrr.t00z.wrfsfcf00.grib2"
        );
    }

    #[test]
    fn hrrr_local_file_is_url_basename() {
        let template = Hrrr;
        let run = run("hrrr", "sfc");
        assert_eq!(template.local_file(&run), "hrrr.t00z.wrfsfcf00.grib2");
    }

    #[test]
    fn hrrr_idx_url_appends_suffix() {
        let template = Hrrr;
        assert_eq!(
            template.idx_url("https://example.com/hrrr.grib2"),
            "https://example.com/hrrr.grib2.idx"
        );
    }

    #[test]
    fn first_product_is_default() {
        let template = Hrrr;
        assert_eq!(template.default_product(), "sfc");
        assert_eq!(Ecmwf.default_product(), "oper");
    }

    #[test]
    fn ecmwf_oper_url_and_index() {
        let template = Ecmwf;
        let run = run("ecmwf", "oper");
        let sources = template.sources(&run);
        assert_eq!(sources[0].source, SourceId::from("azure"));
        assert_eq!(
            sources[0].url,
            "https://ai4edataeuwest.blob.core.windows.net/ecmwf/20220126/00z/0p4-beta/oper/20220126000000-0h-oper-fc.grib2"
        );
        assert_eq!(sources[1].source, SourceId::from("ecmwf"));
        assert_eq!(template.idx_style(), IdxStyle::Eccodes);
        assert_eq!(
            template.idx_url(&sources[0].url),
            "https://ai4edataeuwest.blob.core.windows.net/ecmwf/20220126/00z/0p4-beta/oper/20220126000000-0h-oper-fc.index"
        );
    }

    #[test]
    fn ecmwf_ensemble_suffix() {
        let template = Ecmwf;
        let run = run("ecmwf", "enfo");
        let sources = template.sources(&run);
        assert!(sources[0].url.ends_with("20220126000000-0h-enfo-ef.grib2"));
    }

    #[test]
    fn gfs_url_has_hour_directory() {
        let template = Gfs;
        let init = parse_datetime("2022-01-26 06:00").unwrap();
        let (date, valid_date) = resolve_times(Some(init), None, 12).unwrap();
        let run = Run {
            date,
            valid_date,
            fxx: 12,
            model: "gfs".to_string(),
            product: "pgrb2.0p25".to_string(),
            member: 1,
        };
        let sources = template.sources(&run);
        assert_eq!(
            sources[0].url,
            "https://noaa-gfs-bdp-pds.s3.amazonaws.com/gfs.20220126/06/atmos/gfs.t06z.pgrb2.0p25.f012"
        );
    }

    #[test]
    fn hrrrak_uses_alaska_path_and_nomads_first() {
        let template = HrrrAk;
        let run = run("hrrrak", "sfc");
        let sources = template.sources(&run);
        assert_eq!(sources[0].source, SourceId::from("nomads"));
        assert!(sources[0].url.contains("/alaska/"));
        assert!(sources[0].url.ends_with("hrrr.t00z.wrfsfcf00.ak.grib2"));
        let pando = sources
            .iter()
            .find(|entry| entry.source == SourceId::from("pando"))
            .unwrap();
        assert!(pando.url.contains("/hrrrak/"));
    }

    #[test]
    fn lead_time_is_zero_padded() {
        let template = Rap;
        let init = parse_datetime("2022-01-26 00:00").unwrap();
        let (date, valid_date) = resolve_times(Some(init), None, 3).unwrap();
        let run = Run {
            date,
            valid_date,
            fxx: 3,
            model: "rap".to_string(),
            product: "wrfprs".to_string(),
            member: 1,
        };
        assert_eq!(valid_date, date + Duration::hours(3));
        assert!(
            template
                .sources(&run)
                .iter()
                .all(|entry| entry.url.ends_with("rap.t00z.wrfprsf03.grib2"))
        );
    }
}
