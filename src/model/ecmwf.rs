use super::{IdxStyle, ModelTemplate};
use crate::domain::{Run, SourceEntry};

// TODO: bump when ECMWF promotes the open-data feed out of beta.
const VERSION: &str = "0p4-beta";

pub struct Ecmwf;

impl ModelTemplate for Ecmwf {
    fn name(&self) -> &'static str {
        "ecmwf"
    }

    fn description(&self) -> &'static str {
        "ECMWF open data"
    }

    fn products(&self) -> &'static [(&'static str, &'static str)] {
        &[
            (
                "oper",
                "operational high-resolution forecast, atmospheric fields",
            ),
            ("enfo", "ensemble forecast, atmospheric fields"),
            ("wave", "wave forecasts"),
            ("waef", "ensemble forecast, ocean wave fields"),
        ]
    }

    fn sources(&self, run: &Run) -> Vec<SourceEntry> {
        let product_suffix = match run.product.as_str() {
            "enfo" | "waef" => "ef",
            _ => "fc",
        };
        let post_root = format!(
            "{}/{}z/{VERSION}/{}/{}-{}h-{}-{product_suffix}.grib2",
            run.date.format("%Y%m%d"),
            run.date.format("%H"),
            run.product,
            run.date.format("%Y%m%d%H%M%S"),
            run.fxx,
            run.product
        );
        vec![
            SourceEntry::new(
                "azure",
                format!("https://ai4edataeuwest.blob.core.windows.net/ecmwf/{post_root}"),
            ),
            SourceEntry::new(
                "ecmwf",
                format!("https://data.ecmwf.int/forecasts/{post_root}"),
            ),
        ]
    }

    fn idx_style(&self) -> IdxStyle {
        IdxStyle::Eccodes
    }

    fn idx_suffix(&self) -> &'static str {
        ".index"
    }

    fn idx_url(&self, grib_url: &str) -> String {
        let stem = grib_url.strip_suffix(".grib2").unwrap_or(grib_url);
        format!("{stem}{}", self.idx_suffix())
    }
}
