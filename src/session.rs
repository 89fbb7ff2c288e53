//! The single-user analysis session: which view is showing, the editable
//! input text, the last successful analysis and the busy flag.

use crate::dashboard::DashboardView;
use crate::errors::AppError;
use crate::gateway::{AnalysisGateway, CompletedAnalysis};
use crate::sample::sample_input_text;
use crate::validator::parse_input_with;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Input,
    Dashboard,
}

impl FromStr for View {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(View::Input),
            "dashboard" => Ok(View::Dashboard),
            other => Err(AppError::NotFound(format!("unknown view '{}'", other))),
        }
    }
}

#[derive(Debug)]
struct SessionState {
    view: View,
    input_text: String,
    current: Option<Arc<CompletedAnalysis>>,
    last_error: Option<String>,
}

/// What a client needs to render the current screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub view: View,
    pub input_text: String,
    pub has_analysis: bool,
    pub busy: bool,
    pub last_error: Option<String>,
}

/// Holds the busy flag for the lifetime of one analysis.
///
/// Released on drop, so an abandoned request frees the session too.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, AppError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::AnalysisInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Session {
    state: RwLock<SessionState>,
    busy: AtomicBool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Starts on the input view with the sample payload loaded.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SessionState {
                view: View::Input,
                input_text: sample_input_text(),
                current: None,
                last_error: None,
            }),
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read().await;
        SessionSnapshot {
            view: state.view,
            input_text: state.input_text.clone(),
            has_analysis: state.current.is_some(),
            busy: self.is_busy(),
            last_error: state.last_error.clone(),
        }
    }

    pub async fn set_input(&self, text: String) {
        self.state.write().await.input_text = text;
    }

    /// Restores the sample payload in the editor.
    pub async fn reset_input(&self) {
        self.set_input(sample_input_text()).await;
    }

    /// The dashboard stays disabled until one analysis has succeeded.
    pub async fn select_view(&self, view: View) -> Result<View, AppError> {
        let mut state = self.state.write().await;
        if view == View::Dashboard && state.current.is_none() {
            return Err(AppError::NotFound(
                "dashboard is unavailable until an analysis succeeds".to_string(),
            ));
        }
        state.view = view;
        Ok(view)
    }

    pub async fn current(&self) -> Option<Arc<CompletedAnalysis>> {
        self.state.read().await.current.clone()
    }

    pub async fn dashboard(&self) -> Result<DashboardView, AppError> {
        self.current()
            .await
            .map(|analysis| DashboardView::build(&analysis))
            .ok_or_else(|| AppError::NotFound("no analysis has completed yet".to_string()))
    }

    /// Parses the current input text and analyzes it.
    ///
    /// Success replaces the stored analysis and moves to the dashboard. Failure
    /// records the message, returns to the input view and leaves the previous
    /// analysis untouched. A second call while one is in flight is refused.
    pub async fn analyze(&self, gateway: &AnalysisGateway) -> Result<Arc<CompletedAnalysis>, AppError> {
        let _busy = BusyGuard::acquire(&self.busy)?;

        let text = {
            let mut state = self.state.write().await;
            state.last_error = None;
            state.input_text.clone()
        };

        let result = match parse_input_with(&text, gateway.config().validation_mode) {
            Ok(input) => gateway.run(input).await,
            Err(e) => Err(e),
        };

        let mut state = self.state.write().await;
        match result {
            Ok(completed) => {
                let completed = Arc::new(completed);
                state.current = Some(completed.clone());
                state.view = View::Dashboard;
                Ok(completed)
            }
            Err(e) => {
                state.last_error = Some(e.to_string());
                state.view = View::Input;
                Err(e)
            }
        }
    }
}
