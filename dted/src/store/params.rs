//! Store-wide metadata kept alongside the samples.

use std::fmt;
use std::str::FromStr;

use super::backend::ParameterSet;
use crate::coord::{MAX_RESOLUTION, SRTM3_RESOLUTION};
use crate::error::{DtedError, Result};
use crate::grid::VOID_VALUE;

const KEY_DESCRIPTION: &str = "Description";
const KEY_PROJECTION: &str = "Projection";
// Historical name; the value is points per degree.
const KEY_POINTS_PER_DEGREE: &str = "ArcMinResolution";
const KEY_VOID_VALUE: &str = "VoidValue";

/// How the stored coordinates map onto the Earth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    Unknown,
    /// Plain latitude/longitude grid, as used by DTED and SRTM.
    Dted,
}

impl Projection {
    /// The serialized name of this projection.
    pub fn as_str(&self) -> &'static str {
        match self {
            Projection::Unknown => "Unknown",
            Projection::Dted => "DTED",
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Projection {
    type Err = std::convert::Infallible;

    /// Anything other than `"DTED"` reads as [`Projection::Unknown`].
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(if s == "DTED" {
            Projection::Dted
        } else {
            Projection::Unknown
        })
    }
}

/// Metadata describing an elevation store.
///
/// Written once when the store is created and read back before every bulk
/// operation, so a store keeps its own resolution and void value across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreParameters {
    pub description: String,
    pub projection: Projection,
    /// Grid units per degree of every stored coordinate.
    pub points_per_degree: i32,
    /// Elevation treated as "no data".
    pub void_value: i16,
}

impl Default for StoreParameters {
    /// Parameters of an SRTM-3 store.
    fn default() -> Self {
        Self {
            description: "SRTM-3 DTED".to_string(),
            projection: Projection::Dted,
            points_per_degree: SRTM3_RESOLUTION as i32,
            void_value: VOID_VALUE,
        }
    }
}

impl StoreParameters {
    /// Points per degree as an unsigned resolution.
    pub fn resolution(&self) -> u32 {
        self.points_per_degree as u32
    }

    /// Serialize into string key/value pairs.
    pub fn to_parameter_set(&self) -> ParameterSet {
        let mut set = ParameterSet::new();
        set.insert(KEY_DESCRIPTION.to_string(), self.description.clone());
        set.insert(
            KEY_PROJECTION.to_string(),
            self.projection.as_str().to_string(),
        );
        set.insert(
            KEY_POINTS_PER_DEGREE.to_string(),
            self.points_per_degree.to_string(),
        );
        set.insert(KEY_VOID_VALUE.to_string(), self.void_value.to_string());
        set
    }

    /// Parse from string key/value pairs.
    ///
    /// A missing description is empty and an unrecognised projection is
    /// [`Projection::Unknown`].
    ///
    /// # Errors
    ///
    /// [`DtedError::InvalidParameter`] if the resolution or void value is
    /// missing or not a number, or if the resolution is not positive.
    pub fn from_parameter_set(set: &ParameterSet) -> Result<Self> {
        let description = set.get(KEY_DESCRIPTION).cloned().unwrap_or_default();
        let projection = set
            .get(KEY_PROJECTION)
            .map(|p| p.parse::<Projection>().unwrap_or_default())
            .unwrap_or_default();

        let points_per_degree: i32 = parse_number(set, KEY_POINTS_PER_DEGREE)?;
        if points_per_degree <= 0 || points_per_degree as u32 > MAX_RESOLUTION {
            return Err(invalid(set, KEY_POINTS_PER_DEGREE));
        }
        let void_value: i16 = parse_number(set, KEY_VOID_VALUE)?;

        Ok(Self {
            description,
            projection,
            points_per_degree,
            void_value,
        })
    }
}

fn invalid(set: &ParameterSet, key: &str) -> DtedError {
    DtedError::InvalidParameter {
        key: key.to_string(),
        value: set.get(key).cloned(),
    }
}

fn parse_number<T: FromStr>(set: &ParameterSet, key: &str) -> Result<T> {
    set.get(key)
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| invalid(set, key))
}
