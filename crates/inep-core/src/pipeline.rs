//! Run orchestration: discovery, then fetch → extract → locate → filter per
//! link, with cleanup after every item and of the scratch root at the end.
//!
//! Per-item failures are recorded and the loop moves on. The only failure
//! that ends a run early is a download failure for a dataset whose
//! [`DatasetKind::fetch_failure_aborts_run`] is set; scratch state is still
//! removed before the error is returned.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::cleanup::{self, CleanupPolicy, Removal};
use crate::config::AppConfig;
use crate::dataset::{DataFormat, DatasetKind, Year};
use crate::discovery::{DownloadTarget, LinkDiscovery, SingleLinkDiscovery, TabStripDiscovery};
use crate::extract;
use crate::fetch::{ArchiveFetcher, FetchError, HttpFetcher};
use crate::locate::{self, CandidateDataFile, LocateError};
use crate::table::{self, RowFilter, TableError};
use crate::workspace::ScratchWorkspace;

/// Why one item could not be processed.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("download of {url} failed: {source}")]
    Fetch { url: String, source: FetchError },
    #[error("could not extract archive: {0:#}")]
    Extract(anyhow::Error),
    #[error(transparent)]
    Locate(#[from] LocateError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("could not prepare {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not prepare {path}: {source}")]
    Setup { path: PathBuf, source: io::Error },
    #[error("run aborted: {0}")]
    Aborted(#[source] ItemError),
}

/// Result of one processed link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Written { path: PathBuf, rows: usize },
    /// The data file had no row for the institution; nothing was written.
    NoMatchingRows { source: PathBuf },
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ItemReport {
    pub target: DownloadTarget,
    pub outcome: ItemOutcome,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub dataset: DatasetKind,
    pub year: Year,
    pub output_dir: PathBuf,
    pub items: Vec<ItemReport>,
    /// Outcome of removing the scratch root.
    pub scratch: Removal,
}

impl RunSummary {
    pub fn written(&self) -> impl Iterator<Item = (&PathBuf, usize)> {
        self.items.iter().filter_map(|i| match &i.outcome {
            ItemOutcome::Written { path, rows } => Some((path, *rows)),
            _ => None,
        })
    }

    pub fn failed(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, ItemOutcome::Failed(_)))
            .count()
    }
}

/// Where one item's archive and extracted files live.
struct ItemLayout {
    archive: PathBuf,
    extract_dir: PathBuf,
    /// Whether `extract_dir` belongs to this item alone and is removed with it.
    owns_extract_dir: bool,
}

pub struct Pipeline<'a> {
    dataset: DatasetKind,
    year: Year,
    cfg: &'a AppConfig,
    base_dir: &'a Path,
}

impl<'a> Pipeline<'a> {
    /// `base_dir` holds the scratch root and the output tree (the working directory in the CLI).
    pub fn new(dataset: DatasetKind, year: Year, cfg: &'a AppConfig, base_dir: &'a Path) -> Self {
        Self {
            dataset,
            year,
            cfg,
            base_dir,
        }
    }

    pub fn scratch_root(&self) -> PathBuf {
        self.base_dir.join(self.dataset.scratch_dir_name(self.year))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dataset.output_dir(self.cfg, self.base_dir)
    }

    pub fn run(
        &self,
        discovery: &mut dyn LinkDiscovery,
        fetcher: &dyn ArchiveFetcher,
    ) -> Result<RunSummary, PipelineError> {
        tracing::info!("starting {} run for {}", self.dataset, self.year);

        let output_dir = self.output_dir();
        fs::create_dir_all(&output_dir).map_err(|source| PipelineError::Setup {
            path: output_dir.clone(),
            source,
        })?;
        let scratch_root = self.scratch_root();
        let workspace = ScratchWorkspace::create(
            scratch_root.clone(),
            CleanupPolicy::from_config(&self.cfg.cleanup),
        )
        .map_err(|source| PipelineError::Setup {
            path: scratch_root,
            source,
        })?;

        let targets = match discovery.discover(self.year) {
            Ok(targets) => targets,
            Err(e) => {
                tracing::error!("link discovery failed: {:#}", e);
                Vec::new()
            }
        };

        let mut items = Vec::with_capacity(targets.len());
        let mut aborted = None;

        if targets.is_empty() {
            tracing::warn!("no download link was collected, nothing to do");
        }

        let total = targets.len();
        for (i, target) in targets.into_iter().enumerate() {
            tracing::info!(
                "processing file [{}/{}]: {}",
                i + 1,
                total,
                target.suggested_filename
            );

            let result = match self.item_layout(&workspace, &target) {
                Ok(layout) => {
                    let result = self.process_item(&target, &layout, fetcher, &output_dir);
                    self.cleanup_item(&layout, workspace.policy());
                    result
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(outcome) => items.push(ItemReport { target, outcome }),
                Err(e) => {
                    tracing::error!("{}: {}", target.suggested_filename, e);
                    let abort = matches!(e, ItemError::Fetch { .. })
                        && self.dataset.fetch_failure_aborts_run();
                    items.push(ItemReport {
                        target,
                        outcome: ItemOutcome::Failed(e.to_string()),
                    });
                    if abort {
                        aborted = Some(e);
                        break;
                    }
                }
            }
        }

        let scratch = workspace.release();

        if let Some(e) = aborted {
            return Err(PipelineError::Aborted(e));
        }

        Ok(RunSummary {
            dataset: self.dataset,
            year: self.year,
            output_dir,
            items,
            scratch,
        })
    }

    /// Censo extracts straight into the scratch root; trajetória gives every
    /// archive its own subdirectory named after the archive.
    fn item_layout(
        &self,
        workspace: &ScratchWorkspace,
        target: &DownloadTarget,
    ) -> Result<ItemLayout, ItemError> {
        let archive = workspace.archive_path(&target.suggested_filename);
        match self.dataset {
            DatasetKind::Censo => Ok(ItemLayout {
                archive,
                extract_dir: workspace.root().to_path_buf(),
                owns_extract_dir: false,
            }),
            DatasetKind::Trajetoria => {
                let name = &target.suggested_filename;
                let stem = Path::new(name)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .filter(|s| s != name && !s.is_empty())
                    .unwrap_or_else(|| format!("{name}_files"));
                let extract_dir = workspace.item_dir(&stem).map_err(|source| ItemError::Io {
                    path: workspace.root().join(&stem),
                    source,
                })?;
                Ok(ItemLayout {
                    archive,
                    extract_dir,
                    owns_extract_dir: true,
                })
            }
        }
    }

    fn process_item(
        &self,
        target: &DownloadTarget,
        layout: &ItemLayout,
        fetcher: &dyn ArchiveFetcher,
        output_dir: &Path,
    ) -> Result<ItemOutcome, ItemError> {
        fetcher
            .fetch(target, &layout.archive)
            .map_err(|source| ItemError::Fetch {
                url: target.url.clone(),
                source,
            })?;

        tracing::info!("extracting {}", target.suggested_filename);
        extract::extract_all(&layout.archive, &layout.extract_dir).map_err(ItemError::Extract)?;

        let data_file = self.locate(&layout.extract_dir)?;
        tracing::info!("data file found: {}", data_file.path.display());

        let filter = RowFilter {
            key_column: self.cfg.key_column.clone(),
            value: self.cfg.institution_code,
        };
        tracing::info!(
            "filtering {} == {} ({})",
            filter.key_column,
            filter.value,
            self.cfg.institution_label
        );
        let filtered = table::load_filtered(&data_file, &filter, self.cfg.trajetoria.skip_rows)?;

        if filtered.is_empty() {
            tracing::warn!(
                "no rows for {} ({} {}) in {}",
                self.cfg.institution_label,
                filter.key_column,
                filter.value,
                data_file.path.display()
            );
            return Ok(ItemOutcome::NoMatchingRows {
                source: data_file.path,
            });
        }

        let file_name = self
            .dataset
            .output_file_name(self.cfg, self.year, &data_file.path);
        let rows = filtered.len();
        match table::write_filtered(&filtered, output_dir, &file_name)? {
            Some(path) => {
                tracing::info!(
                    "{} row(s) for {} saved to {}",
                    rows,
                    self.cfg.institution_label,
                    path.display()
                );
                Ok(ItemOutcome::Written { path, rows })
            }
            None => Ok(ItemOutcome::NoMatchingRows {
                source: data_file.path,
            }),
        }
    }

    fn locate(&self, root: &Path) -> Result<CandidateDataFile, LocateError> {
        match self.dataset.data_format() {
            DataFormat::Delimited => locate::locate_delimited(
                root,
                &self.cfg.censo.data_dirs,
                &self.cfg.censo.preferred_names,
            ),
            DataFormat::Spreadsheet => locate::locate_spreadsheet(root),
        }
    }

    fn cleanup_item(&self, layout: &ItemLayout, policy: &CleanupPolicy) {
        tracing::info!("cleaning up temporary files");
        cleanup::remove_archive(&layout.archive);
        if layout.owns_extract_dir {
            cleanup::remove_tree(&layout.extract_dir, policy);
        }
    }
}

/// Browser-backed discovery for `dataset`. Diagnostics land in `diagnostics_dir`.
pub fn discovery_for(
    dataset: DatasetKind,
    cfg: &AppConfig,
    diagnostics_dir: &Path,
) -> Box<dyn LinkDiscovery> {
    match dataset {
        DatasetKind::Censo => Box::new(SingleLinkDiscovery::new(cfg, diagnostics_dir.to_path_buf())),
        DatasetKind::Trajetoria => Box::new(TabStripDiscovery::new(cfg)),
    }
}

/// HTTP fetcher with `dataset`'s timeout and retry budget.
pub fn fetcher_for(dataset: DatasetKind, cfg: &AppConfig) -> HttpFetcher {
    let profile = dataset.fetch_profile(cfg);
    let mut fetcher = HttpFetcher::new(&cfg.user_agent, profile.request_timeout, profile.retry);
    fetcher.connect_timeout = Duration::from_secs(cfg.connect_timeout_secs);
    fetcher
}
