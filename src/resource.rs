//! Static registry of the content collections the generic CRUD engine
//! serves.
//!
//! Each entry carries everything the handlers need to serve one
//! collection: the storage table, the validator, the image policy and
//! whether unauthenticated clients may create documents (the two
//! lead-submission forms). The first path segment under `/api` selects
//! the entry.

use redb::Database;
use serde_json::Value;

use crate::database::{self, DocTable};
use crate::error::ApiError;
use crate::validate::{self, Fields, Mode};

/// Whether a collection carries an uploaded image.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ImagePolicy {
    /// The collection never stores an image.
    None,
    /// An image may be attached but is not required.
    Optional,
    /// Creation must include an image file.
    Required,
}

pub struct ResourceSpec {
    /// URL path segment under `/api`.
    pub path: &'static str,
    /// Label used in envelope messages ("Career created successfully").
    pub label: &'static str,
    pub table: DocTable,
    pub image: ImagePolicy,
    /// Lead-submission collections accept unauthenticated creates.
    pub public_create: bool,
    pub validate: fn(&Fields, Mode) -> Result<Value, ApiError>,
    /// Side effect run after a created document has committed.
    pub after_create: Option<fn(&Database)>,
}

pub const RESOURCES: &[ResourceSpec] = &[
    ResourceSpec {
        path: "home-content",
        label: "Home content",
        table: database::TABLE_HOME_CONTENT,
        image: ImagePolicy::Required,
        public_create: false,
        validate: validate::home_content,
        after_create: None,
    },
    ResourceSpec {
        path: "home-courses",
        label: "Course",
        table: database::TABLE_HOME_COURSES,
        image: ImagePolicy::None,
        public_create: false,
        validate: validate::home_course,
        after_create: None,
    },
    ResourceSpec {
        path: "home-services",
        label: "Service",
        table: database::TABLE_HOME_SERVICES,
        image: ImagePolicy::Required,
        public_create: false,
        validate: validate::home_service,
        after_create: None,
    },
    ResourceSpec {
        path: "service-content",
        label: "Service content",
        table: database::TABLE_SERVICE_CONTENT,
        image: ImagePolicy::Required,
        public_create: false,
        validate: validate::service_content,
        after_create: None,
    },
    ResourceSpec {
        path: "careers",
        label: "Career",
        table: database::TABLE_CAREERS,
        image: ImagePolicy::Optional,
        public_create: false,
        validate: validate::career,
        after_create: None,
    },
    ResourceSpec {
        path: "contact",
        label: "Contact request",
        table: database::TABLE_CONTACTS,
        image: ImagePolicy::None,
        public_create: true,
        validate: validate::contact,
        after_create: None,
    },
    ResourceSpec {
        path: "enroll",
        label: "Enrollment",
        table: database::TABLE_ENROLLMENTS,
        image: ImagePolicy::None,
        public_create: true,
        validate: validate::enroll,
        after_create: Some(enrollment_created),
    },
    ResourceSpec {
        path: "enroll-courses",
        label: "Enrollment course",
        table: database::TABLE_ENROLL_COURSES,
        image: ImagePolicy::None,
        public_create: false,
        validate: validate::enroll_course,
        after_create: None,
    },
];

pub fn find(path: &str) -> Option<&'static ResourceSpec> {
    RESOURCES.iter().find(|spec| spec.path == path)
}

fn enrollment_created(db: &Database) {
    if let Err(err) = database::record_enrollment(db) {
        tracing::warn!(error = %err, "enrollment stored but customer counter update failed");
    }
}
