//! The "currently processing" flag callers keep per measurement.
//!
//! The pipeline itself holds no state. Callers that need to advertise that a
//! measurement is being worked on implement [`ProcessingState`] and run the
//! pipeline through [`crate::PeakPipeline::process_tracked`], which holds a
//! [`ProcessingGuard`] for the duration of the run. The guard releases the
//! flag when dropped, including on early returns and unwinding panics.

use std::collections::HashSet;
use std::sync::{
    Mutex,
    MutexGuard,
    PoisonError,
};

use tracing::trace;

use crate::errors::{
    PipelineError,
    Result,
};

pub trait ProcessingState {
    /// Marks the measurement as in flight. Fails if it already is.
    fn enter_processing(&self) -> Result<()>;
    fn exit_processing(&self);
}

/// Holds a measurement's processing flag until dropped.
#[must_use = "the processing flag is released as soon as the guard is dropped"]
pub struct ProcessingGuard<'a, S: ProcessingState + ?Sized> {
    state: &'a S,
}

impl<'a, S: ProcessingState + ?Sized> ProcessingGuard<'a, S> {
    pub fn enter(state: &'a S) -> Result<Self> {
        state.enter_processing()?;
        Ok(Self { state })
    }
}

impl<S: ProcessingState + ?Sized> Drop for ProcessingGuard<'_, S> {
    fn drop(&mut self) {
        self.state.exit_processing();
    }
}

pub type MeasurementId = String;

/// In-memory set of measurements currently being processed.
///
/// Allows at most one unit of work per measurement id at a time; share it
/// between workers by reference.
#[derive(Debug, Default)]
pub struct ProcessingRegistry {
    in_flight: Mutex<HashSet<MeasurementId>>,
}

impl ProcessingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The [`ProcessingState`] of one measurement in this registry.
    pub fn handle(&self, id: impl Into<MeasurementId>) -> MeasurementHandle<'_> {
        MeasurementHandle {
            registry: self,
            id: id.into(),
        }
    }

    pub fn is_processing(&self, id: &str) -> bool {
        self.lock().contains(id)
    }

    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    // The set stays consistent even if a holder panicked, every critical
    // section is a single insert or remove.
    fn lock(&self) -> MutexGuard<'_, HashSet<MeasurementId>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug)]
pub struct MeasurementHandle<'a> {
    registry: &'a ProcessingRegistry,
    id: MeasurementId,
}

impl MeasurementHandle<'_> {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl ProcessingState for MeasurementHandle<'_> {
    fn enter_processing(&self) -> Result<()> {
        if self.registry.lock().insert(self.id.clone()) {
            trace!("Entered processing for {}", self.id);
            Ok(())
        } else {
            Err(PipelineError::AlreadyProcessing {
                context: self.id.clone(),
            })
        }
    }

    fn exit_processing(&self) {
        self.registry.lock().remove(&self.id);
        trace!("Exited processing for {}", self.id);
    }
}
