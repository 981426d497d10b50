use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::{Run, SourceEntry, SourceId};
use crate::model::ModelTemplate;
use crate::remote::RemoteClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GribLocation {
    Remote(String),
    Local(Utf8PathBuf),
}

impl fmt::Display for GribLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GribLocation::Remote(url) => write!(f, "{url}"),
            GribLocation::Local(path) => write!(f, "{path}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Unresolved,
    GribFound,
    IdxFound,
    BothFound,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProbeOutcome {
    pub grib: bool,
    pub idx: bool,
}

pub fn advance(state: SearchState, outcome: ProbeOutcome) -> SearchState {
    let grib = matches!(state, SearchState::GribFound | SearchState::BothFound) || outcome.grib;
    let idx = matches!(state, SearchState::IdxFound | SearchState::BothFound) || outcome.idx;
    match (grib, idx) {
        (true, true) => SearchState::BothFound,
        (true, false) => SearchState::GribFound,
        (false, true) => SearchState::IdxFound,
        (false, false) => SearchState::Unresolved,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeAttempt {
    pub source: SourceId,
    pub grib_found: bool,
    pub idx_found: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionReport {
    pub attempts: Vec<ProbeAttempt>,
}

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub grib: Option<GribLocation>,
    pub grib_source: Option<SourceId>,
    pub idx: Option<String>,
    pub idx_source: Option<SourceId>,
    pub report: ResolutionReport,
}

impl Resolution {
    pub fn state(&self) -> SearchState {
        match (self.grib.is_some(), self.idx.is_some()) {
            (true, true) => SearchState::BothFound,
            (true, false) => SearchState::GribFound,
            (false, true) => SearchState::IdxFound,
            (false, false) => SearchState::Unresolved,
        }
    }

    pub fn summary(&self) -> ResolutionSummary {
        ResolutionSummary {
            grib: self.grib.as_ref().map(ToString::to_string),
            grib_source: self.grib_source.as_ref().map(ToString::to_string),
            idx: self.idx.clone(),
            idx_source: self.idx_source.as_ref().map(ToString::to_string),
            attempts: self.report.attempts.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolutionSummary {
    pub grib: Option<String>,
    pub grib_source: Option<String>,
    pub idx: Option<String>,
    pub idx_source: Option<String>,
    pub attempts: Vec<ProbeAttempt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionWindow {
    pub source: SourceId,
    pub days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingRule {
    pub name_contains: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub grib_size_threshold: u64,
    pub retention: Vec<RetentionWindow>,
    pub ping_before: Vec<PingRule>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            grib_size_threshold: 1_000_000,
            retention: vec![RetentionWindow {
                source: SourceId::from("nomads"),
                days: 14,
            }],
            ping_before: vec![PingRule {
                name_contains: "pando".to_string(),
                url: "https://pando-rgw01.chpc.utah.edu/".to_string(),
            }],
        }
    }
}

pub fn candidate_sources(
    template: &dyn ModelTemplate,
    run: &Run,
    priority: Option<&[SourceId]>,
    settings: &ResolverSettings,
    now: DateTime<Utc>,
) -> Vec<SourceEntry> {
    let entries = template.sources(run);
    let mut candidates: Vec<SourceEntry> = match priority {
        Some(priority) => priority
            .iter()
            .filter_map(|wanted| {
                entries.iter().find(|entry| &entry.source == wanted).cloned()
            })
            .collect(),
        None => entries,
    };
    candidates.retain(|entry| {
        let Some(window) = settings
            .retention
            .iter()
            .find(|window| window.source == entry.source)
        else {
            return true;
        };
        let cutoff = (now - Duration::days(window.days))
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc();
        if run.date < cutoff {
            debug!(
                source = %entry.source,
                days = window.days,
                "dropping source; run predates its retention window"
            );
            false
        } else {
            true
        }
    });
    candidates
}

pub struct Resolver<'a, C: RemoteClient> {
    client: &'a C,
    settings: &'a ResolverSettings,
}

impl<'a, C: RemoteClient> Resolver<'a, C> {
    pub fn new(client: &'a C, settings: &'a ResolverSettings) -> Self {
        Self { client, settings }
    }

    pub fn resolve(
        &self,
        template: &dyn ModelTemplate,
        run: &Run,
        priority: Option<&[SourceId]>,
        local_copy: Option<&Utf8Path>,
    ) -> Resolution {
        let mut resolution = Resolution::default();
        if let Some(path) = local_copy {
            // A local copy settles the GRIB half, but the idx is never
            // cached locally and still has to come from a remote.
            resolution.grib = Some(GribLocation::Local(path.to_owned()));
            resolution.grib_source = Some(SourceId::local());
        }
        let mut state = resolution.state();

        for entry in candidate_sources(template, run, priority, self.settings, Utc::now()) {
            for rule in &self.settings.ping_before {
                if entry.source.as_str().contains(&rule.name_contains) {
                    if let Err(err) = self.client.ping(&rule.url) {
                        warn!(source = %entry.source, %err, "pre-flight ping failed; continuing");
                    }
                }
            }

            let mut outcome = ProbeOutcome::default();
            if resolution.grib.is_none() && self.check_grib(&entry.url) {
                outcome.grib = true;
                resolution.grib = Some(GribLocation::Remote(entry.url.clone()));
                resolution.grib_source = Some(entry.source.clone());
            }
            if resolution.idx.is_none() {
                let idx_url = template.idx_url(&entry.url);
                if self.check_idx(&idx_url) {
                    outcome.idx = true;
                    resolution.idx = Some(idx_url);
                    resolution.idx_source = Some(entry.source.clone());
                }
            }

            info!(
                source = %entry.source,
                run = %run.describe(),
                grib_found = outcome.grib,
                idx_found = outcome.idx,
                "probed source"
            );
            resolution.report.attempts.push(ProbeAttempt {
                source: entry.source,
                grib_found: outcome.grib,
                idx_found: outcome.idx,
            });

            state = advance(state, outcome);
            if state == SearchState::BothFound {
                break;
            }
        }

        if resolution.grib.is_none() && resolution.idx.is_none() {
            warn!(run = %run.describe(), "no GRIB2 or index file found at any source");
        }
        resolution
    }

    fn check_grib(&self, url: &str) -> bool {
        match self.client.head(url) {
            // Cloud stores answer error pages with 200s and small bodies,
            // so require a minimum content length as well.
            Ok(info) => {
                info.ok && info.content_length.unwrap_or(0) > self.settings.grib_size_threshold
            }
            Err(err) => {
                debug!(url, %err, "probe failed; treating source as missing");
                false
            }
        }
    }

    fn check_idx(&self, url: &str) -> bool {
        match self.client.head(url) {
            Ok(info) => info.ok,
            Err(err) => {
                debug!(url, %err, "index probe failed; treating source as missing");
                false
            }
        }
    }
}
