//! The evidence capture workflow.
//!
//! A [`CaptureDraft`] holds everything the inspector has entered for one
//! submission: node id, evidence kind, photo and position. It is created
//! fresh for each capture and consumed by [`CaptureWorkflow::submit`], which
//! validates it, stamps it, and appends it to the ledger.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::evidence::{EvidenceKind, EvidenceRecord, Location};
use crate::geo::{self, Geolocator};
use crate::ledger::Ledger;
use crate::photo;
use crate::storage::KeyValueStore;

/// The in-progress contents of the capture form.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureDraft {
    /// Identifier of the inspected node.
    pub node_id: String,
    /// Kind of evidence selected on the form.
    pub kind: EvidenceKind,
    /// Photo as a data URI, once taken.
    pub photo: Option<String>,
    /// Position, once resolved.
    pub location: Location,
}

impl CaptureDraft {
    /// Start a draft with no photo and no position.
    #[must_use]
    pub fn new(node_id: impl Into<String>, kind: EvidenceKind) -> Self {
        Self {
            node_id: node_id.into(),
            kind,
            photo: None,
            location: Location::unsupported(),
        }
    }

    /// Attach a photo given as a data URI, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPhoto`] if `uri` is not a base64 image data URI.
    pub fn attach_photo(&mut self, uri: String) -> Result<()> {
        photo::validate_data_uri(&uri)?;
        self.photo = Some(uri);
        Ok(())
    }

    /// Read an image file and attach it as the photo.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not an image.
    pub fn attach_photo_file(&mut self, path: &Path) -> Result<()> {
        self.photo = Some(photo::read_photo(path)?);
        Ok(())
    }

    /// Resolve the position from `geolocator`, falling back as needed.
    pub async fn locate(&mut self, geolocator: Option<&dyn Geolocator>, timeout: Duration) {
        self.location = geo::resolve(geolocator, timeout).await;
    }

    /// Check the draft is complete enough to submit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingNodeId`] for a blank node id and
    /// [`Error::MissingPhoto`] or [`Error::InvalidPhoto`] for the photo.
    pub fn validate(&self) -> Result<()> {
        if self.node_id.trim().is_empty() {
            return Err(Error::MissingNodeId);
        }

        let photo = self.photo.as_deref().ok_or(Error::MissingPhoto)?;
        photo::validate_data_uri(photo)?;
        Ok(())
    }

    /// Validate the draft and turn it into a record created at `now`.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`CaptureDraft::validate`].
    pub fn into_record(self, now: DateTime<Utc>) -> Result<EvidenceRecord> {
        self.validate()?;
        let photo = self.photo.ok_or(Error::MissingPhoto)?;
        Ok(EvidenceRecord::created_at(
            now,
            self.node_id.trim(),
            self.kind,
            photo,
            self.location,
        ))
    }
}

/// Submits drafts to a ledger.
#[derive(Debug)]
pub struct CaptureWorkflow<'a, S> {
    ledger: &'a Ledger<S>,
    submit_delay: Duration,
}

impl<'a, S: KeyValueStore> CaptureWorkflow<'a, S> {
    /// Create a workflow that waits `submit_delay` before saving, simulating
    /// an upload.
    #[must_use]
    pub fn new(ledger: &'a Ledger<S>, submit_delay: Duration) -> Self {
        Self {
            ledger,
            submit_delay,
        }
    }

    /// Validate, stamp and store a draft.
    ///
    /// Validation happens before the simulated upload, so an incomplete
    /// form is rejected immediately.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an incomplete draft, or
    /// [`Error::SaveFailed`] if the ledger refused the record.
    pub async fn submit(&self, draft: CaptureDraft) -> Result<EvidenceRecord> {
        let record = draft.into_record(Utc::now())?;
        debug!(
            "Uploading evidence {} for node {}",
            record.id, record.node_id
        );

        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }

        if !self.ledger.add(&record) {
            return Err(Error::SaveFailed);
        }

        info!(
            "Saved {} evidence {} for node {} ({})",
            record.kind, record.id, record.node_id, record.location
        );
        Ok(record)
    }
}
