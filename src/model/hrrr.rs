use super::ModelTemplate;
use crate::domain::{Run, SourceEntry};

pub struct Hrrr;

impl ModelTemplate for Hrrr {
    fn name(&self) -> &'static str {
        "hrrr"
    }

    fn description(&self) -> &'static str {
        "High-Resolution Rapid Refresh - CONUS"
    }

    fn products(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("sfc", "2D surface level fields; 3-km resolution"),
            ("prs", "3D pressure level fields; 3-km resolution"),
            ("nat", "Native level fields; 3-km resolution"),
            ("subh", "Subhourly grids; 3-km resolution"),
        ]
    }

    fn sources(&self, run: &Run) -> Vec<SourceEntry> {
        let day = run.date.format("%Y%m%d");
        let file = format!(
            "hrrr.t{}z.wrf{}f{:02}.grib2",
            run.date.format("%H"),
            run.product,
            run.fxx
        );
        let pando_file = format!(
            "{}.t{}z.wrf{}f{:02}.grib2",
            run.model,
            run.date.format("%H"),
            run.product,
            run.fxx
        );
        vec![
            SourceEntry::new(
                "aws",
                format!("https://noaa-hrrr-bdp-pds.s3.amazonaws.com/hrrr.{day}/conus/{file}"),
            ),
            SourceEntry::new(
                "nomads",
                format!(
                    "https://nomads.ncep.noaa.gov/pub/data/nccf/com/hrrr/prod/hrrr.{day}/conus/{file}"
                ),
            ),
            SourceEntry::new(
                "google",
                format!(
                    "https://storage.googleapis.com/high-resolution-rapid-refresh/hrrr.{day}/conus/{file}"
                ),
            ),
            SourceEntry::new(
                "azure",
                format!("https://noaahrrr.blob.core.windows.net/hrrr/hrrr.{day}/conus/{file}"),
            ),
            SourceEntry::new(
                "pando",
                format!(
                    "https://pando-rgw01.chpc.utah.edu/{}/{}/{day}/{pando_file}",
                    run.model, run.product
                ),
            ),
            SourceEntry::new(
                "pando2",
                format!(
                    "https://pando-rgw02.chpc.utah.edu/{}/{}/{day}/{pando_file}",
                    run.model, run.product
                ),
            ),
        ]
    }
}

pub struct HrrrAk;

impl ModelTemplate for HrrrAk {
    fn name(&self) -> &'static str {
        "hrrrak"
    }

    fn description(&self) -> &'static str {
        "High-Resolution Rapid Refresh - Alaska"
    }

    fn products(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("prs", "3D pressure level fields; 3-km resolution"),
            ("sfc", "2D surface level fields; 3-km resolution"),
            ("nat", "Native level fields; 3-km resolution"),
            ("subh", "Subhourly grids; 3-km resolution"),
        ]
    }

    fn sources(&self, run: &Run) -> Vec<SourceEntry> {
        let day = run.date.format("%Y%m%d");
        let file = format!(
            "hrrr.t{}z.wrf{}f{:02}.ak.grib2",
            run.date.format("%H"),
            run.product,
            run.fxx
        );
        // Pando keeps Alaska output under the model name without the .ak marker.
        let pando_file = format!(
            "{}.t{}z.wrf{}f{:02}.grib2",
            run.model,
            run.date.format("%H"),
            run.product,
            run.fxx
        );
        vec![
            SourceEntry::new(
                "nomads",
                format!(
                    "https://nomads.ncep.noaa.gov/pub/data/nccf/com/hrrr/prod/hrrr.{day}/alaska/{file}"
                ),
            ),
            SourceEntry::new(
                "aws",
                format!("https://noaa-hrrr-bdp-pds.s3.amazonaws.com/hrrr.{day}/alaska/{file}"),
            ),
            SourceEntry::new(
                "google",
                format!(
                    "https://storage.googleapis.com/high-resolution-rapid-refresh/hrrr.{day}/alaska/{file}"
                ),
            ),
            SourceEntry::new(
                "azure",
                format!("https://noaahrrr.blob.core.windows.net/hrrr/hrrr.{day}/alaska/{file}"),
            ),
            SourceEntry::new(
                "pando",
                format!(
                    "https://pando-rgw01.chpc.utah.edu/{}/{}/{day}/{pando_file}",
                    run.model, run.product
                ),
            ),
            SourceEntry::new(
                "pando2",
                format!(
                    "https://pando-rgw02.chpc.utah.edu/{}/{}/{day}/{pando_file}",
                    run.model, run.product
                ),
            ),
        ]
    }
}
