use super::ModelTemplate;
use crate::domain::{Run, SourceEntry};

pub struct Rap;

impl ModelTemplate for Rap {
    fn name(&self) -> &'static str {
        "rap"
    }

    fn description(&self) -> &'static str {
        "Rapid Refresh"
    }

    fn products(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("awp130pgrb", "CONUS Pressure levels; 13-km resolution"),
            ("awp252pgrb", "CONUS Pressure levels; 20-km resolution"),
            ("awp236pgrb", "CONUS Pressure levels; 40-km resolution"),
            ("awp130bgrb", "CONUS Native levels; 13-km resolution"),
            ("awp252bgrb", "CONUS Native levels; 20-km resolution"),
            ("wrfprs", "Full domain Pressure Levels; 13-km"),
            ("wrfnat", "Full domain Native Levels; 13-km"),
            (
                "awip32",
                "NOAMHI - High-Resolution North American Master Grid; 32-km resolution",
            ),
            (
                "awp242",
                "Alaska Quadruple Resolution Pressure levels; 11-km resolution",
            ),
            ("awp200", "Puerto Rico Pressure levels; 16-km resolution"),
            (
                "awp243",
                "Eastern North America Pressure levels, 0.4 degree resolution",
            ),
            ("wrfmsl", "WRFMSL; 13-km resolution"),
        ]
    }

    fn sources(&self, run: &Run) -> Vec<SourceEntry> {
        let day = run.date.format("%Y%m%d");
        let file = format!(
            "rap.t{}z.{}f{:02}.grib2",
            run.date.format("%H"),
            run.product,
            run.fxx
        );
        vec![
            SourceEntry::new(
                "aws",
                format!("https://noaa-rap-pds.s3.amazonaws.com/rap.{day}/{file}"),
            ),
            SourceEntry::new(
                "nomads",
                format!("https://nomads.ncep.noaa.gov/pub/data/nccf/com/rap/prod/rap.{day}/{file}"),
            ),
            SourceEntry::new(
                "google",
                format!("https://storage.googleapis.com/rapid-refresh/rap.{day}/{file}"),
            ),
            SourceEntry::new(
                "azure",
                format!("https://noaarap.blob.core.windows.net/rap/rap.{day}/{file}"),
            ),
        ]
    }
}
