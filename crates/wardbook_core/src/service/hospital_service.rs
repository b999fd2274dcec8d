//! Hospital dashboard queries.
//!
//! # Responsibility
//! - Answer dashboard questions (patients per area, available staff, totals)
//!   by listing a collection and filtering on payload fields.
//!
//! # Invariants
//! - Each query reads at most the newest `FETCH_CAP` records per collection.
//! - A missing or non-string field never matches a filter.

use crate::error::StoreResult;
use crate::model::collection::CollectionName;
use crate::model::stored_object::{ObjectId, Payload, StoredObject};
use crate::repo::object_repo::ListOptions;
use crate::store::ObjectStore;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Records fetched per collection before filtering, newest first.
pub const FETCH_CAP: u32 = 100;

pub const FIELD_AREA: &str = "area";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_AVAILABILITY: &str = "availability";

pub const STATUS_ADMITTED: &str = "Ingresado";
pub const STATUS_DISCHARGED: &str = "Dado de alta";
pub const AVAILABILITY_AVAILABLE: &str = "Disponible";

/// Hospital areas shown by the dashboard.
pub const DEFAULT_AREAS: &[&str] = &[
    "Emergencias",
    "Cardiología",
    "Neurología",
    "Pediatría",
    "Cirugía",
    "Medicina General",
];

/// Staff collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffKind {
    Doctor,
    Nurse,
}

impl StaffKind {
    pub fn collection(self) -> CollectionName {
        match self {
            Self::Doctor => CollectionName::doctor(),
            Self::Nurse => CollectionName::nurse(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatientStats {
    pub total: usize,
    /// Patients whose status is anything but discharged.
    pub active: usize,
    pub by_area: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StaffStats {
    pub total: usize,
    pub available: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HospitalStats {
    pub patients: PatientStats,
    pub doctors: StaffStats,
    pub nurses: StaffStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AreaSummary {
    pub area: String,
    pub patients: usize,
    pub doctors: usize,
    pub nurses: usize,
}

/// Dashboard query facade over a shared store handle.
pub struct HospitalService {
    store: ObjectStore,
}

impl HospitalService {
    pub fn new(store: ObjectStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    /// Patients assigned to `area`.
    pub async fn patients_by_area(&self, area: &str) -> StoreResult<Vec<StoredObject>> {
        let patients = self.fetch(CollectionName::patient()).await?;
        Ok(patients
            .into_iter()
            .filter(|patient| field_eq(patient, FIELD_AREA, area))
            .collect())
    }

    /// Staff of `kind` marked available, optionally restricted to `area`.
    pub async fn available_staff(
        &self,
        kind: StaffKind,
        area: Option<&str>,
    ) -> StoreResult<Vec<StoredObject>> {
        let staff = self.fetch(kind.collection()).await?;
        Ok(staff
            .into_iter()
            .filter(|member| field_eq(member, FIELD_AVAILABILITY, AVAILABILITY_AVAILABLE))
            .filter(|member| area.map_or(true, |area| field_eq(member, FIELD_AREA, area)))
            .collect())
    }

    /// Totals for the dashboard header. The three collections load concurrently.
    pub async fn hospital_stats(&self) -> StoreResult<HospitalStats> {
        let (patients, doctors, nurses) = tokio::try_join!(
            self.fetch(CollectionName::patient()),
            self.fetch(CollectionName::doctor()),
            self.fetch(CollectionName::nurse()),
        )?;

        let mut by_area = BTreeMap::new();
        for area in patients.iter().filter_map(|patient| patient.field_str(FIELD_AREA)) {
            *by_area.entry(area.to_string()).or_insert(0) += 1;
        }

        Ok(HospitalStats {
            patients: PatientStats {
                total: patients.len(),
                active: patients
                    .iter()
                    .filter(|patient| !field_eq(patient, FIELD_STATUS, STATUS_DISCHARGED))
                    .count(),
                by_area,
            },
            doctors: staff_stats(&doctors),
            nurses: staff_stats(&nurses),
        })
    }

    /// Per-area headcounts, one entry per requested area in request order.
    pub async fn area_summary(&self, areas: &[&str]) -> StoreResult<Vec<AreaSummary>> {
        let (patients, doctors, nurses) = tokio::try_join!(
            self.fetch(CollectionName::patient()),
            self.fetch(CollectionName::doctor()),
            self.fetch(CollectionName::nurse()),
        )?;

        let count_in = |records: &[StoredObject], area: &str| {
            records
                .iter()
                .filter(|record| field_eq(record, FIELD_AREA, area))
                .count()
        };

        Ok(areas
            .iter()
            .map(|&area| AreaSummary {
                area: area.to_string(),
                patients: count_in(&patients, area),
                doctors: count_in(&doctors, area),
                nurses: count_in(&nurses, area),
            })
            .collect())
    }

    /// Marks a patient discharged, keeping every other field.
    pub async fn discharge_patient(&self, id: ObjectId) -> StoreResult<StoredObject> {
        let mut partial = Payload::new();
        partial.insert(
            FIELD_STATUS.to_string(),
            Value::String(STATUS_DISCHARGED.to_string()),
        );
        self.store
            .update(&CollectionName::patient(), id, partial)
            .await
    }

    /// Newest `FETCH_CAP` records of `collection`.
    async fn fetch(&self, collection: CollectionName) -> StoreResult<Vec<StoredObject>> {
        let options = ListOptions {
            limit: Some(FETCH_CAP),
            newest_first: true,
        };
        self.store.list_with(&collection, options).await
    }
}

fn field_eq(record: &StoredObject, key: &str, expected: &str) -> bool {
    record.field_str(key) == Some(expected)
}

fn staff_stats(staff: &[StoredObject]) -> StaffStats {
    StaffStats {
        total: staff.len(),
        available: staff
            .iter()
            .filter(|member| field_eq(member, FIELD_AVAILABILITY, AVAILABILITY_AVAILABLE))
            .count(),
    }
}

impl From<StaffKind> for CollectionName {
    fn from(value: StaffKind) -> Self {
        value.collection()
    }
}

