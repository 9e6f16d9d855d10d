// ABOUTME: GarminConnect facade with typed wrappers over the session manager primitives
// ABOUTME: Builds service URLs and passes JSON responses through without schema validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime};
use garmin_core::errors::{GarminError, GarminResult};
use garmin_core::models::{GarminTokens, OAuth1Token, OAuth2Token, Session, SessionEvent};
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, instrument};

use crate::config::GarminConfig;
use crate::session::{persist_on_change, FileTokenStore, SessionManager, TokenStore};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::urls::GarminUrls;
use crate::utils::content_disposition_filename;

/// Activity file formats accepted by the upload endpoint
const UPLOAD_FORMATS: [&str; 3] = ["fit", "gpx", "tcx"];

/// Conversions offered by the export endpoint
const EXPORT_FORMATS: [&str; 3] = ["gpx", "tcx", "kml"];

/// Multipart field name expected by the upload endpoint
const UPLOAD_FIELD: &str = "userfile";

/// Minutes of non-sleep data requested around a sleep window
const SLEEP_BUFFER_MINUTES: &str = "60";

/// Garmin Connect client
///
/// Cloning is cheap; clones share one session.
#[derive(Clone)]
pub struct GarminConnect {
    session: Arc<SessionManager>,
    token_dir: PathBuf,
}

impl GarminConnect {
    /// Create a client backed by a fresh cookie-storing HTTP client
    ///
    /// # Errors
    ///
    /// Returns a transport error if the HTTP client cannot be built.
    pub fn new(config: GarminConfig) -> GarminResult<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config.http)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Create a client over an existing transport
    #[must_use]
    pub fn with_transport(config: GarminConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            session: Arc::new(SessionManager::new(transport, &config)),
            token_dir: config.token_dir,
        }
    }

    /// Wrap an already-configured session manager
    pub fn from_session(session: Arc<SessionManager>, token_dir: impl Into<PathBuf>) -> Self {
        Self {
            session,
            token_dir: token_dir.into(),
        }
    }

    /// Underlying session manager
    #[must_use]
    pub const fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    fn urls(&self) -> &GarminUrls {
        self.session.urls()
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Log in; see [`SessionManager::login`]
    ///
    /// # Errors
    ///
    /// Propagates login failures unchanged.
    pub async fn login(
        &self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> GarminResult<GarminTokens> {
        self.session.login(username, password).await
    }

    /// Drop all tokens
    pub async fn logout(&self) {
        self.session.logout().await;
    }

    /// Current token pair
    ///
    /// # Errors
    ///
    /// Returns `AuthExpired` when not logged in.
    pub async fn export_tokens(&self) -> GarminResult<GarminTokens> {
        self.session.export_tokens().await
    }

    /// Install tokens obtained elsewhere
    ///
    /// # Errors
    ///
    /// Returns `SessionRestore` when the refresh token has expired.
    pub async fn load_tokens(&self, oauth1: OAuth1Token, oauth2: OAuth2Token) -> GarminResult<()> {
        self.session.load_tokens(oauth1, oauth2).await
    }

    /// Write `oauth1_token.json` and `oauth2_token.json` to `dir`
    ///
    /// # Errors
    ///
    /// Returns `AuthExpired` when not logged in, or an I/O error.
    pub async fn export_tokens_to_dir(&self, dir: &Path) -> GarminResult<()> {
        let tokens = self.session.export_tokens().await?;
        FileTokenStore::new(dir).save(&tokens).await
    }

    /// Load tokens from `dir`
    ///
    /// # Errors
    ///
    /// Returns `Config` when the directory is missing, or a read/parse error.
    pub async fn load_tokens_from_dir(&self, dir: &Path) -> GarminResult<()> {
        let tokens = FileTokenStore::new(dir).load().await?;
        self.session.load_tokens(tokens.oauth1, tokens.oauth2).await
    }

    /// Configured token directory
    #[must_use]
    pub fn token_dir(&self) -> &Path {
        &self.token_dir
    }

    /// Keep the configured token directory in sync with every token change
    #[must_use]
    pub fn persist_tokens_on_change(&self) -> JoinHandle<()> {
        let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(self.token_dir.clone()));
        persist_on_change(store, self.session.subscribe())
    }

    /// Session-change notifications
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.session.subscribe()
    }

    /// Persistable session
    ///
    /// # Errors
    ///
    /// Returns `AuthExpired` when not logged in, or the profile fetch error.
    pub async fn export_session(&self) -> GarminResult<Session> {
        self.session.export_session().await
    }

    /// Restore and verify a persisted session
    ///
    /// # Errors
    ///
    /// Returns `SessionRestore` when the session belongs to someone else.
    pub async fn restore_session(&self, session: Session) -> GarminResult<()> {
        self.session.restore_session(session).await
    }

    // ========================================================================
    // User
    // ========================================================================

    /// User settings
    ///
    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn get_user_settings(&self) -> GarminResult<Value> {
        self.session.get(&self.urls().user_settings(), &[]).await
    }

    /// Social profile
    ///
    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn get_user_profile(&self) -> GarminResult<Value> {
        self.session.get(&self.urls().user_profile(), &[]).await
    }

    /// Set body weight in kilograms (stored by the service in grams)
    ///
    /// # Errors
    ///
    /// Returns `Config` for a non-positive weight, or request failures.
    pub async fn set_body_weight(&self, kilograms: f64) -> GarminResult<Value> {
        if !kilograms.is_finite() || kilograms <= 0.0 {
            return Err(GarminError::config(format!(
                "Invalid body weight: {kilograms}"
            )));
        }
        let grams = (kilograms * 1000.0).round();
        self.session
            .put(
                &self.urls().user_settings(),
                Some(json!({ "userData": { "weight": grams } })),
            )
            .await
    }

    // ========================================================================
    // Activities
    // ========================================================================

    /// Activity list page; `start`/`limit` are passed through
    ///
    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn get_activities(&self, start: u32, limit: u32) -> GarminResult<Value> {
        let start = start.to_string();
        let limit = limit.to_string();
        self.session
            .get(
                &self.urls().activities(),
                &[("start", start.as_str()), ("limit", limit.as_str())],
            )
            .await
    }

    /// Single activity
    ///
    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn get_activity(&self, activity_id: u64) -> GarminResult<Value> {
        self.session
            .get(&self.urls().activity(activity_id), &[])
            .await
    }

    /// Lifetime activity statistics
    ///
    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn count_activities(&self) -> GarminResult<Value> {
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
        self.session
            .get(
                &self.urls().stat_activities(),
                &[
                    ("aggregation", "lifetime"),
                    ("startDate", "1970-01-01"),
                    ("endDate", today.as_str()),
                    ("metric", "duration"),
                ],
            )
            .await
    }

    /// Download the original activity archive into `dir`, returning the written path
    ///
    /// # Errors
    ///
    /// Propagates request failures and I/O errors.
    #[instrument(skip(self, dir))]
    pub async fn download_original_activity_data(
        &self,
        activity_id: u64,
        dir: &Path,
    ) -> GarminResult<PathBuf> {
        let url = self.urls().download_zip(activity_id);
        self.download_to(&url, dir, format!("{activity_id}.zip"))
            .await
    }

    /// Download an activity converted to `gpx`, `tcx`, or `kml` into `dir`
    ///
    /// # Errors
    ///
    /// Returns `Config` for other formats, request failures, or I/O errors.
    #[instrument(skip(self, dir))]
    pub async fn download_activity(
        &self,
        activity_id: u64,
        format: &str,
        dir: &Path,
    ) -> GarminResult<PathBuf> {
        let format = format.to_ascii_lowercase();
        if !EXPORT_FORMATS.contains(&format.as_str()) {
            return Err(GarminError::config(format!(
                "Unsupported export format: {format} (expected gpx, tcx or kml)"
            )));
        }
        let url = self.urls().download_export(&format, activity_id);
        self.download_to(&url, dir, format!("{activity_id}.{format}"))
            .await
    }

    async fn download_to(
        &self,
        url: &str,
        dir: &Path,
        fallback_name: String,
    ) -> GarminResult<PathBuf> {
        let response = self.session.get_bytes(url, &[]).await?;

        let file_name = response
            .header("content-disposition")
            .and_then(content_disposition_filename)
            .unwrap_or(fallback_name);
        let path = dir.join(file_name);

        tokio::fs::write(&path, &response.body)
            .await
            .map_err(|e| GarminError::io(&path, e))?;
        info!(path = %path.display(), bytes = response.body.len(), "Activity downloaded");
        Ok(path)
    }

    /// Upload a `.fit`, `.gpx`, or `.tcx` file
    ///
    /// # Errors
    ///
    /// Returns `Config` for other extensions, I/O errors reading the file, or
    /// request failures.
    #[instrument(skip(self))]
    pub async fn upload_activity(&self, path: &Path) -> GarminResult<Value> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|ext| UPLOAD_FORMATS.contains(&ext.as_str()))
            .ok_or_else(|| {
                GarminError::config(format!(
                    "Unsupported activity format: {} (expected fit, gpx or tcx)",
                    path.display()
                ))
            })?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("activity")
            .to_owned();

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| GarminError::io(path, e))?;
        self.session
            .post_multipart(&self.urls().upload(&extension), UPLOAD_FIELD, &file_name, bytes)
            .await
    }

    // ========================================================================
    // Workouts
    // ========================================================================

    /// Workout list page
    ///
    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn get_workouts(&self, start: u32, limit: u32) -> GarminResult<Value> {
        let start = start.to_string();
        let limit = limit.to_string();
        self.session
            .get(
                &self.urls().workouts(),
                &[("start", start.as_str()), ("limit", limit.as_str())],
            )
            .await
    }

    /// Single workout
    ///
    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn get_workout_detail(&self, workout_id: &str) -> GarminResult<Value> {
        self.session
            .get(&self.urls().workout(Some(workout_id)), &[])
            .await
    }

    /// Create a workout from a Connect workout document
    ///
    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn create_workout(&self, workout: Value) -> GarminResult<Value> {
        self.session
            .post(&self.urls().workout(None), Some(workout), &[])
            .await
    }

    /// Delete a workout
    ///
    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn delete_workout(&self, workout_id: &str) -> GarminResult<Value> {
        self.session
            .delete(&self.urls().workout(Some(workout_id)))
            .await
    }

    // ========================================================================
    // Daily summaries
    // ========================================================================

    /// Daily step totals for one day
    ///
    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn get_steps(&self, date: NaiveDate) -> GarminResult<Value> {
        let day = date_string(date);
        self.session
            .get(&self.urls().daily_steps(&day, &day), &[])
            .await
    }

    /// Sleep data for the night ending on `date`
    ///
    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn get_sleep_data(&self, date: NaiveDate) -> GarminResult<Value> {
        let day = date_string(date);
        self.session
            .get(
                &self.urls().daily_sleep(),
                &[
                    ("date", day.as_str()),
                    ("nonSleepBufferMinutes", SLEEP_BUFFER_MINUTES),
                ],
            )
            .await
    }

    /// Weight entries for one day
    ///
    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn get_daily_weight(&self, date: NaiveDate) -> GarminResult<Value> {
        self.session
            .get(
                &self.urls().daily_weight(&date_string(date)),
                &[("includeAll", "true")],
            )
            .await
    }

    /// Hydration for one day
    ///
    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn get_daily_hydration(&self, date: NaiveDate) -> GarminResult<Value> {
        self.session
            .get(&self.urls().daily_hydration(&date_string(date)), &[])
            .await
    }

    /// Log a hydration entry in milliliters (negative values subtract)
    ///
    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn add_hydration_data(
        &self,
        value_in_ml: f64,
        timestamp: NaiveDateTime,
    ) -> GarminResult<Value> {
        let body = json!({
            "calendarDate": date_string(timestamp.date()),
            "timestampLocal": timestamp.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
            "valueInML": value_in_ml,
        });
        self.session
            .put(&self.urls().hydration_log(), Some(body))
            .await
    }

    /// Heart rate for one day
    ///
    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn get_heart_rate(&self, date: NaiveDate) -> GarminResult<Value> {
        let day = date_string(date);
        self.session
            .get(&self.urls().daily_heart_rate(), &[("date", day.as_str())])
            .await
    }

    /// Golf scorecard summaries
    ///
    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn get_golf_summary(&self) -> GarminResult<Value> {
        self.session
            .get(&self.urls().golf_scorecard_summary(), &[])
            .await
    }

    /// Scorecard detail for one round
    ///
    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn get_golf_scorecard(&self, scorecard_id: u64) -> GarminResult<Value> {
        let id = scorecard_id.to_string();
        self.session
            .get(
                &self.urls().golf_scorecard_detail(),
                &[
                    ("scorecard-ids", id.as_str()),
                    ("include-longest-shot-distance", "true"),
                ],
            )
            .await
    }

    // ========================================================================
    // Raw access
    // ========================================================================

    /// Authenticated GET against any URL
    ///
    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn get(&self, url: &str, params: &[(&str, &str)]) -> GarminResult<Value> {
        self.session.get(url, params).await
    }

    /// Authenticated POST with a JSON body
    ///
    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn post(&self, url: &str, body: Option<Value>) -> GarminResult<Value> {
        self.session.post(url, body, &[]).await
    }

    /// Authenticated PUT with a JSON body
    ///
    /// # Errors
    ///
    /// Propagates request failures.
    pub async fn put(&self, url: &str, body: Option<Value>) -> GarminResult<Value> {
        self.session.put(url, body).await
    }
}

fn date_string(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
