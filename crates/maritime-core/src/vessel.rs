use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::Deserialize;
use uuid::Uuid;

use crate::error::ConfigError;

/// Identifier the tracking API resolves a vessel by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VesselLookup {
    Uuid(Uuid),
    Mmsi(String),
    Imo(String),
}

impl VesselLookup {
    /// Query parameter name the tracking API expects for this identifier.
    pub fn parameter(&self) -> &'static str {
        match self {
            VesselLookup::Uuid(_) => "uuid",
            VesselLookup::Mmsi(_) => "mmsi",
            VesselLookup::Imo(_) => "imo",
        }
    }

    pub fn value(&self) -> String {
        match self {
            VesselLookup::Uuid(id) => id.to_string(),
            VesselLookup::Mmsi(value) | VesselLookup::Imo(value) => value.clone(),
        }
    }
}

impl fmt::Display for VesselLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.parameter(), self.value())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VesselQuery {
    name: String,
    lookup: VesselLookup,
}

impl VesselQuery {
    pub fn new(name: impl Into<String>, lookup: VesselLookup) -> Self {
        Self {
            name: name.into(),
            lookup,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lookup(&self) -> &VesselLookup {
        &self.lookup
    }
}

/// The fleet tracked before rosters became configurable. Datalastic matches
/// vessel names case-sensitively.
const DEFAULT_FLEET: &[&str] = &[
    "MAERSK CHENNAI",
    "MAERSK HARVEY",
    "MAERSK NIKOLAI",
    "MAERSK ROCKY",
];

const DEFAULT_FLEET_UUID: Uuid = Uuid::from_u128(0xb8625b67_7142_cfd1_7b85_595cebfe4191);

#[derive(Debug, Deserialize)]
struct RosterFile {
    #[serde(default)]
    vessels: Vec<RosterEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RosterEntry {
    name: String,
    uuid: Option<Uuid>,
    mmsi: Option<String>,
    imo: Option<String>,
}

impl RosterEntry {
    fn into_query(self) -> Result<VesselQuery, ConfigError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(ConfigError::Roster("vessel name cannot be empty".into()));
        }

        let lookup = match (self.uuid, self.mmsi, self.imo) {
            (Some(id), None, None) => VesselLookup::Uuid(id),
            (None, Some(mmsi), None) => VesselLookup::Mmsi(digits(&name, "mmsi", mmsi)?),
            (None, None, Some(imo)) => VesselLookup::Imo(digits(&name, "imo", imo)?),
            _ => {
                return Err(ConfigError::Roster(format!(
                    "{name}: exactly one of uuid, mmsi or imo must be given"
                )))
            }
        };

        Ok(VesselQuery::new(name, lookup))
    }
}

fn digits(name: &str, field: &str, value: String) -> Result<String, ConfigError> {
    let value = value.trim().to_string();
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::Roster(format!(
            "{name}: {field} must be numeric, got {value:?}"
        )));
    }
    Ok(value)
}

/// Ordered, de-duplicated list of vessels a run processes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VesselRoster {
    vessels: Vec<VesselQuery>,
}

impl VesselRoster {
    pub fn new(vessels: Vec<VesselQuery>) -> Result<Self, ConfigError> {
        if vessels.is_empty() {
            return Err(ConfigError::Roster("roster lists no vessels".into()));
        }

        let mut seen = HashSet::new();
        for vessel in &vessels {
            if !seen.insert(vessel.name()) {
                return Err(ConfigError::Roster(format!(
                    "vessel {} is listed more than once",
                    vessel.name()
                )));
            }
        }

        Ok(Self { vessels })
    }

    pub fn default_fleet() -> Self {
        Self {
            vessels: DEFAULT_FLEET
                .iter()
                .map(|name| VesselQuery::new(*name, VesselLookup::Uuid(DEFAULT_FLEET_UUID)))
                .collect(),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: RosterFile = toml::from_str(contents)?;
        let vessels = file
            .vessels
            .into_iter()
            .map(RosterEntry::into_query)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(vessels)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn vessels(&self) -> &[VesselQuery] {
        &self.vessels
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }
}
