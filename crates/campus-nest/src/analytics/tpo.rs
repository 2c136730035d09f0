use std::collections::BTreeMap;

use chrono::Datelike;
use serde::Serialize;

use crate::domain::{ApplicationStatus, PlacementStatus};
use crate::error::ServiceError;
use crate::store::{ApplicationFilter, EntityStore, UserFilter};

use super::pipeline::{count_by, rate, top_n};
use super::placement::department_label;
use super::AnalyticsEngine;

const TOP_PLACED_SKILLS: usize = 10;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TpoAnalytics {
    pub departments: Vec<DepartmentBreakdown>,
    pub batch_trends: Vec<BatchTrend>,
    pub top_skills: Vec<SkillCount>,
    pub gender_stats: Vec<GenderCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentBreakdown {
    pub department: String,
    pub total: u64,
    pub placed: u64,
    pub unplaced: u64,
    pub placement_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTrend {
    pub graduation_year: Option<i32>,
    pub total: u64,
    pub placed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillCount {
    pub skill: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenderCount {
    pub gender: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyPlacements {
    pub year: i32,
    pub month: u32,
    pub count: u64,
}

impl<S: EntityStore> AnalyticsEngine<S> {
    /// Profile-flag based view of placements, unlike the TPO dashboard which derives offers.
    pub fn tpo_analytics(&self) -> Result<TpoAnalytics, ServiceError> {
        let students = self.store.find_users(&UserFilter::students())?;

        let mut departments: BTreeMap<String, (u64, u64)> = BTreeMap::new();
        let mut batches: BTreeMap<Option<i32>, (u64, u64)> = BTreeMap::new();
        for student in &students {
            let placed = u64::from(student.placed_status == PlacementStatus::Placed);
            let entry = departments
                .entry(department_label(student))
                .or_insert((0, 0));
            entry.0 += 1;
            entry.1 += placed;
            let batch = batches.entry(student.graduation_year).or_insert((0, 0));
            batch.0 += 1;
            batch.1 += placed;
        }

        let placed: Vec<_> = students
            .iter()
            .filter(|student| student.placed_status == PlacementStatus::Placed)
            .collect();
        let skill_counts = count_by(
            placed.iter().flat_map(|student| student.skills.iter()),
            |skill| skill.clone(),
        );
        let gender_counts = count_by(
            placed
                .iter()
                .filter_map(|student| student.gender.as_ref())
                .filter(|gender| !gender.trim().is_empty()),
            |gender| gender.clone(),
        );

        Ok(TpoAnalytics {
            departments: departments
                .into_iter()
                .map(|(department, (total, placed))| DepartmentBreakdown {
                    department,
                    total,
                    placed,
                    unplaced: total - placed,
                    placement_rate: rate(placed, total),
                })
                .collect(),
            batch_trends: batches
                .into_iter()
                .map(|(graduation_year, (total, placed))| BatchTrend {
                    graduation_year,
                    total,
                    placed,
                })
                .collect(),
            top_skills: top_n(skill_counts, TOP_PLACED_SKILLS)
                .into_iter()
                .map(|(skill, count)| SkillCount { skill, count })
                .collect(),
            gender_stats: gender_counts
                .into_iter()
                .map(|(gender, count)| GenderCount { gender, count })
                .collect(),
        })
    }

    /// Selected applications per (year, month) of application, oldest first.
    pub fn placement_trends(&self) -> Result<Vec<MonthlyPlacements>, ServiceError> {
        let selected = self
            .store
            .find_applications(&ApplicationFilter::all().status(ApplicationStatus::Selected))?;
        let months = count_by(&selected, |application| {
            (application.applied_on.year(), application.applied_on.month())
        });
        Ok(months
            .into_iter()
            .map(|((year, month), count)| MonthlyPlacements { year, month, count })
            .collect())
    }
}
