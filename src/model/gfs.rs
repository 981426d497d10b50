use super::ModelTemplate;
use crate::domain::{Run, SourceEntry};

pub struct Gfs;

impl ModelTemplate for Gfs {
    fn name(&self) -> &'static str {
        "gfs"
    }

    fn description(&self) -> &'static str {
        "Global Forecast System"
    }

    fn products(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("pgrb2.0p25", "common fields, 0.25 degree resolution"),
            ("pgrb2.0p50", "common fields, 0.50 degree resolution"),
            ("pgrb2.1p00", "common fields, 1.00 degree resolution"),
            ("pgrb2b.0p25", "uncommon fields, 0.25 degree resolution"),
            ("pgrb2b.0p50", "uncommon fields, 0.50 degree resolution"),
            ("pgrb2b.1p00", "uncommon fields, 1.00 degree resolution"),
            ("pgrb2full.0p50", "combined grids of 0.50 resolution"),
        ]
    }

    fn sources(&self, run: &Run) -> Vec<SourceEntry> {
        let day = run.date.format("%Y%m%d");
        let hour = run.date.format("%H");
        let file = format!("gfs.t{hour}z.{}.f{:03}", run.product, run.fxx);
        vec![
            SourceEntry::new(
                "aws",
                format!("https://noaa-gfs-bdp-pds.s3.amazonaws.com/gfs.{day}/{hour}/atmos/{file}"),
            ),
            SourceEntry::new(
                "aws-old",
                format!("https://noaa-gfs-bdp-pds.s3.amazonaws.com/gfs.{day}/{hour}/{file}"),
            ),
            SourceEntry::new(
                "nomads",
                format!(
                    "https://nomads.ncep.noaa.gov/pub/data/nccf/com/gfs/prod/gfs.{day}/{hour}/atmos/{file}"
                ),
            ),
            SourceEntry::new(
                "google",
                format!(
                    "https://storage.googleapis.com/global-forecast-system/gfs.{day}/{hour}/atmos/{file}"
                ),
            ),
            SourceEntry::new(
                "azure",
                format!("https://noaagfs.blob.core.windows.net/gfs/gfs.{day}/{hour}/atmos/{file}"),
            ),
        ]
    }
}
