// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Date-range production report and e-mail report schedules.

use chrono::NaiveDate;

use super::products::sort_by_assigned_date_desc;
use super::ApiClient;
use crate::error::ApiResult;
use crate::types::{Product, ReportSchedule};

const SCHEDULES: &str = "programaciones";

impl ApiClient {
    /// Products assigned within `start..=end`, optionally for one team, latest
    /// assigned date first.
    pub async fn date_range_report(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        team_id: Option<i64>,
    ) -> ApiResult<Vec<Product>> {
        let mut products = self.products_by_date_range(start, end, team_id).await?;
        sort_by_assigned_date_desc(&mut products);
        tracing::debug!(
            "REPORT_RANGE | start={} end={} team={} rows={}",
            start,
            end,
            team_id.map_or_else(|| "all".to_string(), |id| id.to_string()),
            products.len()
        );
        Ok(products)
    }

    /// `POST /reportes/programar`
    pub async fn schedule_report(&self, schedule: &ReportSchedule) -> ApiResult<Option<ReportSchedule>> {
        let created: Option<ReportSchedule> = self.post(&["reportes", "programar"], schedule).await?;
        tracing::info!(
            "REPORT_SCHEDULED | date={} time={} to={}",
            schedule.send_date,
            schedule.send_time,
            schedule.recipient_email
        );
        Ok(created)
    }

    pub async fn list_schedules(&self) -> ApiResult<Vec<ReportSchedule>> {
        self.get(&["reportes", SCHEDULES]).await
    }

    pub async fn get_schedule(&self, id: i64) -> ApiResult<ReportSchedule> {
        self.get(&["reportes", SCHEDULES, &id.to_string()]).await
    }

    pub async fn update_schedule(
        &self,
        id: i64,
        schedule: &ReportSchedule,
    ) -> ApiResult<Option<ReportSchedule>> {
        self.put(&["reportes", SCHEDULES, &id.to_string()], schedule).await
    }

    pub async fn delete_schedule(&self, id: i64) -> ApiResult<()> {
        self.delete::<()>(&["reportes", SCHEDULES, &id.to_string()]).await?;
        tracing::info!("REPORT_SCHEDULE_DELETED | id={}", id);
        Ok(())
    }
}
