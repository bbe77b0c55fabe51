//! Data models for the content collections.
//!
//! Stored documents are JSON objects: the normalized field structs below
//! plus a server-assigned `id`, an optional `image` URL and
//! `createdAt`/`updatedAt` timestamps added by the handlers. Field names
//! are camelCase on the wire and in storage.

use serde::{Deserialize, Serialize};

/// Home page banner. The image URL is attached by the upload flow.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HomeContentFields {
    pub title: String,
}

/// Course card shown on the home page.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HomeCourseFields {
    pub title: String,
    pub description: String,
}

/// Service tile shown on the home page.
///
/// `position` and `is_active` default on creation and are left untouched
/// by updates that do not supply them.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct HomeServiceFields {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Full service description page.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ServiceContentFields {
    pub title: String,
    pub description: String,
    pub points: Vec<String>,
}

/// Open position listing. The image is optional for careers.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CareerFields {
    pub title: String,
    pub description: String,
    pub points: Vec<String>,
}

/// Contact form lead.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

/// Enrollment form lead.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EnrollFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub course: String,
    pub message: String,
}

/// Course offered on the enrollment form.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EnrollCourseFields {
    pub course_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Aggregate counters shown on the site. A single document exists
/// process-wide; it is created lazily on first access.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    pub total_enrollments: u64,
    pub total_courses: u64,
    pub total_services: u64,
    pub total_careers: u64,
    pub total_contacts: u64,
    pub customer_count: u64,
    pub displayed_count: u64,
}

impl Stats {
    /// Values the singleton starts from before any real data exists.
    /// The displayed counters start at 21 rather than zero.
    pub fn seed() -> Self {
        Stats {
            customer_count: 21,
            displayed_count: 21,
            ..Stats::default()
        }
    }
}

/// Wire names of the counters the stats update operation may set.
pub const STAT_FIELDS: &[&str] = &[
    "totalEnrollments",
    "totalCourses",
    "totalServices",
    "totalCareers",
    "totalContacts",
    "customerCount",
    "displayedCount",
];

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub password: String,
}
