// ABOUTME: Garmin Connect endpoint set derived from a regional domain
// ABOUTME: SSO, OAuth, and connectapi service URLs with origin overrides for tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::config::GarminDomain;

/// Endpoint set for one Garmin Connect deployment
///
/// Every URL is derived from three origins: the SSO host, the Connect web app,
/// and the `connectapi` host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GarminUrls {
    sso_origin: String,
    connect_modern: String,
    api_base: String,
}

impl GarminUrls {
    /// URLs for a regional domain
    #[must_use]
    pub fn for_domain(domain: GarminDomain) -> Self {
        let host = domain.host();
        Self {
            sso_origin: format!("https://sso.{host}"),
            connect_modern: format!("https://connect.{host}/modern"),
            api_base: format!("https://connectapi.{host}"),
        }
    }

    /// URLs with explicit origins (mock servers, proxies)
    pub fn custom(
        sso_origin: impl Into<String>,
        connect_modern: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            sso_origin: trim_slash(sso_origin.into()),
            connect_modern: trim_slash(connect_modern.into()),
            api_base: trim_slash(api_base.into()),
        }
    }

    /// Single origin serving every endpoint
    pub fn single_origin(origin: impl Into<String>) -> Self {
        let origin = trim_slash(origin.into());
        Self {
            sso_origin: origin.clone(),
            connect_modern: format!("{origin}/modern"),
            api_base: origin,
        }
    }

    /// SSO origin (`https://sso.garmin.com`)
    #[must_use]
    pub fn sso_origin(&self) -> &str {
        &self.sso_origin
    }

    /// Connect web app (`https://connect.garmin.com/modern`)
    #[must_use]
    pub fn connect_modern(&self) -> &str {
        &self.connect_modern
    }

    /// `connectapi` origin
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// SSO root
    #[must_use]
    pub fn sso(&self) -> String {
        format!("{}/sso", self.sso_origin)
    }

    /// Embedded SSO widget
    #[must_use]
    pub fn sso_embed(&self) -> String {
        format!("{}/embed", self.sso())
    }

    /// Sign-in page
    #[must_use]
    pub fn signin(&self) -> String {
        format!("{}/signin", self.sso())
    }

    /// OAuth service root
    #[must_use]
    pub fn oauth(&self) -> String {
        format!("{}/oauth-service/oauth", self.api_base)
    }

    /// Endpoint under the OAuth service root
    #[must_use]
    pub fn oauth_endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.oauth(), path.trim_start_matches('/'))
    }

    /// User settings
    #[must_use]
    pub fn user_settings(&self) -> String {
        format!(
            "{}/userprofile-service/userprofile/user-settings/",
            self.api_base
        )
    }

    /// Social profile of the authenticated user
    #[must_use]
    pub fn user_profile(&self) -> String {
        format!("{}/userprofile-service/socialProfile", self.api_base)
    }

    /// Activity search
    #[must_use]
    pub fn activities(&self) -> String {
        format!(
            "{}/activitylist-service/activities/search/activities",
            self.api_base
        )
    }

    /// Single activity
    #[must_use]
    pub fn activity(&self, activity_id: u64) -> String {
        format!("{}/activity-service/activity/{activity_id}", self.api_base)
    }

    /// Lifetime activity statistics
    #[must_use]
    pub fn stat_activities(&self) -> String {
        format!("{}/fitnessstats-service/activity", self.api_base)
    }

    /// Original activity file (zip)
    #[must_use]
    pub fn download_zip(&self, activity_id: u64) -> String {
        format!(
            "{}/download-service/files/activity/{activity_id}",
            self.api_base
        )
    }

    /// Activity export in a given format (`gpx`, `tcx`, `kml`)
    #[must_use]
    pub fn download_export(&self, format: &str, activity_id: u64) -> String {
        format!(
            "{}/download-service/export/{format}/activity/{activity_id}",
            self.api_base
        )
    }

    /// Activity upload for a file extension
    #[must_use]
    pub fn upload(&self, extension: &str) -> String {
        format!("{}/upload-service/upload/.{extension}", self.api_base)
    }

    /// Daily step totals over a date range
    #[must_use]
    pub fn daily_steps(&self, start: &str, end: &str) -> String {
        format!(
            "{}/usersummary-service/stats/steps/daily/{start}/{end}",
            self.api_base
        )
    }

    /// Daily sleep data
    #[must_use]
    pub fn daily_sleep(&self) -> String {
        format!("{}/sleep-service/sleep/dailySleepData", self.api_base)
    }

    /// Daily weight view
    #[must_use]
    pub fn daily_weight(&self, date: &str) -> String {
        format!("{}/weight-service/weight/dayview/{date}", self.api_base)
    }

    /// Daily hydration
    #[must_use]
    pub fn daily_hydration(&self, date: &str) -> String {
        format!(
            "{}/usersummary-service/usersummary/hydration/allData/{date}",
            self.api_base
        )
    }

    /// Hydration log
    #[must_use]
    pub fn hydration_log(&self) -> String {
        format!(
            "{}/usersummary-service/usersummary/hydration/log",
            self.api_base
        )
    }

    /// Golf scorecard summaries
    #[must_use]
    pub fn golf_scorecard_summary(&self) -> String {
        format!(
            "{}/gcs-golfcommunity/api/v2/scorecard/summary",
            self.api_base
        )
    }

    /// Golf scorecard detail
    #[must_use]
    pub fn golf_scorecard_detail(&self) -> String {
        format!(
            "{}/gcs-golfcommunity/api/v2/scorecard/detail",
            self.api_base
        )
    }

    /// Daily heart rate
    #[must_use]
    pub fn daily_heart_rate(&self) -> String {
        format!(
            "{}/wellness-service/wellness/dailyHeartRate",
            self.api_base
        )
    }

    /// Workout collection, or a single workout when `id` is given
    #[must_use]
    pub fn workout(&self, id: Option<&str>) -> String {
        id.map_or_else(
            || format!("{}/workout-service/workout", self.api_base),
            |id| format!("{}/workout-service/workout/{id}", self.api_base),
        )
    }

    /// Workout listing
    #[must_use]
    pub fn workouts(&self) -> String {
        format!("{}/workout-service/workouts", self.api_base)
    }
}

fn trim_slash(value: String) -> String {
    value.trim_end_matches('/').to_owned()
}
