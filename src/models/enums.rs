use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::db::DatabaseError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The serde representation is the domain string, not the variant name.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(TreatmentStatus {
    Nouveau => "nouveau",
    SousTraitement => "sous_trt",
    ApresTraitement => "apres_trt",
    Decede => "decede",
});

str_enum!(DoctorStatus {
    EnService => "En service",
    EnConge => "En congé",
    EnFormation => "En formation",
});

str_enum!(AppointmentStatus {
    Confirme => "Confirmé",
    EnAttente => "En attente",
    Termine => "Terminé",
});

impl Default for DoctorStatus {
    fn default() -> Self {
        Self::EnService
    }
}

impl AppointmentStatus {
    /// Confirmed or completed appointments count toward weekly activity.
    pub fn is_qualifying(&self) -> bool {
        matches!(self, Self::Confirme | Self::Termine)
    }
}

/// Appointment type. The clinic uses a handful of well-known values but the
/// set is open, so anything else is carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AppointmentType {
    Consultation,
    Urgence,
    Controle,
    Other(String),
}

impl AppointmentType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Consultation => "Consultation",
            Self::Urgence => "Urgence",
            Self::Controle => "Contrôle",
            Self::Other(s) => s.as_str(),
        }
    }

    pub fn is_urgent(&self) -> bool {
        matches!(self, Self::Urgence)
    }
}

impl From<&str> for AppointmentType {
    fn from(s: &str) -> Self {
        match s {
            "Consultation" => Self::Consultation,
            "Urgence" => Self::Urgence,
            "Contrôle" => Self::Controle,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Default for AppointmentType {
    fn default() -> Self {
        Self::Consultation
    }
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AppointmentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AppointmentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// Deserialize an optional enum, mapping unknown values to `None` instead of
/// failing the whole record.
pub(crate) fn lenient_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// Deserialize an enum, falling back to its default on unknown or missing values.
pub(crate) fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr + Default,
{
    Ok(lenient_option(deserializer)?.unwrap_or_default())
}
