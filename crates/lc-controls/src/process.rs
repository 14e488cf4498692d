//! Process value acquisition and the sensor facet of a loop.
//!
//! The acquisition collaborator is asked for a fresh reading once per tick.
//! A failed (or non-finite) reading keeps the previous value and marks the
//! point bad, which gates automatic control and alarm evaluation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alarm::{AlarmLimits, AlarmState};

/// Why a process value could not be acquired.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum AcquisitionError {
    #[error("sensor not connected")]
    NotConnected,

    #[error("data unavailable")]
    DataUnavailable,

    #[error("non-finite reading: {value}")]
    NonFinite { value: f64 },

    #[error("unexpected acquisition error: {0}")]
    Unexpected(String),
}

/// Trust level of the current process value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Quality {
    Good,
    Bad(AcquisitionError),
}

impl Quality {
    pub fn is_good(&self) -> bool {
        matches!(self, Self::Good)
    }
}

/// Latest process value and its quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessPoint {
    pub value: f64,
    pub quality: Quality,
}

impl Default for ProcessPoint {
    fn default() -> Self {
        Self {
            value: 0.0,
            quality: Quality::Bad(AcquisitionError::DataUnavailable),
        }
    }
}

impl ProcessPoint {
    /// Apply a read result: a finite value becomes a good point, anything
    /// else keeps the previous value and marks the point bad.
    pub fn update(&mut self, reading: Result<f64, AcquisitionError>) {
        match reading {
            Ok(value) if value.is_finite() => {
                self.value = value;
                self.quality = Quality::Good;
            }
            Ok(value) => self.quality = Quality::Bad(AcquisitionError::NonFinite { value }),
            Err(err) => self.quality = Quality::Bad(err),
        }
    }

    pub fn is_good(&self) -> bool {
        self.quality.is_good()
    }
}

/// Source of process values (a sensor driver, a replayed trace, a model).
pub trait Acquisition {
    fn read_process_value(&mut self) -> Result<f64, AcquisitionError>;
}

impl<T: Acquisition + ?Sized> Acquisition for Box<T> {
    fn read_process_value(&mut self) -> Result<f64, AcquisitionError> {
        (**self).read_process_value()
    }
}

/// Sensor facet of a control loop: the point, its limits and alarm flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sensor {
    pub name: String,
    pub point: ProcessPoint,
    pub limits: AlarmLimits,
    pub state: AlarmState,
}

impl Sensor {
    pub fn new(name: impl Into<String>, limits: AlarmLimits) -> Self {
        Self {
            name: name.into(),
            limits,
            ..Self::default()
        }
    }

    /// Read one sample from `source` into the point.
    pub fn acquire<A: Acquisition + ?Sized>(&mut self, source: &mut A) -> &ProcessPoint {
        self.point.update(source.read_process_value());
        &self.point
    }
}
