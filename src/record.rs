use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sonic_rs::{from_slice, to_vec};

use super::transport::{TransportError, TransportResult};

/// Payload keys in the order the prediction endpoint expects them.
pub const FIELD_NAMES: [&str; 8] = [
    "Pregnancies",
    "Glucose",
    "BloodPressure",
    "SkinThickness",
    "Insulin",
    "BMI",
    "DiabetesPedigreeFunction",
    "Age",
];

/// Feature values for one diabetes prediction.
///
/// Field declaration order is the serialization order; keep it in step with
/// [`FIELD_NAMES`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictionRequest {
    #[serde(rename = "Pregnancies")]
    pub pregnancies: u32,
    #[serde(rename = "Glucose")]
    pub glucose: u32,
    #[serde(rename = "BloodPressure")]
    pub blood_pressure: u32,
    #[serde(rename = "SkinThickness")]
    pub skin_thickness: u32,
    #[serde(rename = "Insulin")]
    pub insulin: u32,
    #[serde(rename = "BMI")]
    pub bmi: f64,
    #[serde(rename = "DiabetesPedigreeFunction")]
    pub diabetes_pedigree_function: f64,
    #[serde(rename = "Age")]
    pub age: u32,
}

impl PredictionRequest {
    pub fn sample() -> Self {
        Self {
            pregnancies: 6,
            glucose: 148,
            blood_pressure: 72,
            skin_thickness: 35,
            insulin: 0,
            bmi: 33.6,
            diabetes_pedigree_function: 0.627,
            age: 50,
        }
    }

    pub fn to_payload(&self) -> TransportResult<Bytes> {
        to_vec(self).map(Bytes::from).map_err(TransportError::from)
    }

    pub fn from_payload(payload: &[u8]) -> TransportResult<Self> {
        from_slice(payload).map_err(TransportError::from)
    }
}

impl Default for PredictionRequest {
    fn default() -> Self {
        Self::sample()
    }
}
