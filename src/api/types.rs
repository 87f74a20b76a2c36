//! Shared state for the API router and middleware.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::accounts::AccountStore;
use crate::delivery::ReportMailer;
use crate::diagnosis::TextGenerator;
use crate::report::ReportFont;
use crate::session::SessionStore;
use crate::wells::{Dataset, DatasetError};

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub accounts: Arc<AccountStore>,
    pub sessions: Arc<SessionStore>,
    pub datasets: Arc<DatasetSource>,
    pub generator: Arc<dyn TextGenerator>,
    /// `None` when SMTP credentials are not configured.
    pub mailer: Option<Arc<dyn ReportMailer>>,
    pub font: Arc<ReportFont>,
}

/// Where session snapshots come from. Each login reads the CSV afresh; the
/// most recent snapshot is kept for the health endpoint.
pub struct DatasetSource {
    path: PathBuf,
    latest: RwLock<Arc<Dataset>>,
}

impl DatasetSource {
    /// Load the dataset once so a missing or malformed file fails startup.
    pub fn open(path: PathBuf) -> Result<Self, DatasetError> {
        let dataset = Dataset::load(&path)?;
        Ok(Self {
            path,
            latest: RwLock::new(Arc::new(dataset)),
        })
    }

    /// Read a fresh snapshot for a new session.
    pub fn snapshot(&self) -> Result<Arc<Dataset>, DatasetError> {
        let dataset = Arc::new(Dataset::load(&self.path)?);
        if let Ok(mut latest) = self.latest.write() {
            *latest = Arc::clone(&dataset);
        }
        Ok(dataset)
    }

    pub fn latest_rows(&self) -> usize {
        self.latest.read().map(|d| d.len()).unwrap_or(0)
    }
}
