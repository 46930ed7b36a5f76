//! Wire schema of the prediction service.
//!
//! The only place where internal field names meet the service's names.
//! Units are passed through unchanged; lag-1 fields keep their one-hour-ago
//! meaning.

use serde::{Deserialize, Serialize};

use crate::domain::{Conditions, FeatureRecord};

/// JSON body of `POST /api/predict`.
///
/// Atmospheric fields are omitted in location mode (the service resolves
/// them from the coordinates) and coordinates are omitted in manual mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictPayload {
    pub is_location_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub hour: u32,
    pub month: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allsky_sfc_sw_dwn: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allsky_kt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t2m: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t2m_lag1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sza: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws10m: Option<f64>,
    pub pm25: f64,
    pub pm25_lag1: f64,
    pub ac_power_lag1: f64,
    pub power_factor_lag1: f64,
}

impl From<&FeatureRecord> for PredictPayload {
    fn from(record: &FeatureRecord) -> Self {
        let mut payload = PredictPayload {
            is_location_mode: false,
            latitude: None,
            longitude: None,
            hour: record.hour,
            month: record.month,
            allsky_sfc_sw_dwn: None,
            allsky_kt: None,
            t2m: None,
            t2m_lag1: None,
            sza: None,
            ws10m: None,
            pm25: record.pm25,
            pm25_lag1: record.pm25_lag1,
            ac_power_lag1: record.ac_power_lag1,
            power_factor_lag1: record.power_factor_lag1,
        };

        match &record.conditions {
            Conditions::Location(c) => {
                payload.is_location_mode = true;
                payload.latitude = Some(c.latitude);
                payload.longitude = Some(c.longitude);
            }
            Conditions::Manual(a) => {
                payload.allsky_sfc_sw_dwn = Some(a.surface_irradiance);
                payload.allsky_kt = Some(a.clearness_index);
                payload.t2m = Some(a.temperature_c);
                payload.t2m_lag1 = Some(a.temperature_lag1_c);
                payload.sza = Some(a.solar_zenith_deg);
                payload.ws10m = Some(a.wind_speed_ms);
            }
        }
        payload
    }
}

/// Success body of `POST /api/predict`
#[derive(Debug, Clone, Deserialize)]
pub struct PredictResponse {
    pub predicted_power: f64,
}
