use serde::{Deserialize, Serialize};

/// Fixed vessel classification buckets, each backed by a set of AIS ship
/// type codes.
///
/// The declaration order is the render and layer-control order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VesselCategory {
    WingInGround,
    Fishing,
    Towing,
    Military,
    Sailing,
    PleasureCraft,
    HighSpeedCraft,
    Tug,
    LawEnforcement,
    MedicalTransport,
    Passenger,
    Cargo,
    Tanker,
    Other,
}

impl VesselCategory {
    pub const COUNT: usize = 14;

    pub const ALL: [VesselCategory; Self::COUNT] = [
        Self::WingInGround,
        Self::Fishing,
        Self::Towing,
        Self::Military,
        Self::Sailing,
        Self::PleasureCraft,
        Self::HighSpeedCraft,
        Self::Tug,
        Self::LawEnforcement,
        Self::MedicalTransport,
        Self::Passenger,
        Self::Cargo,
        Self::Tanker,
        Self::Other,
    ];

    /// Upstream AIS type codes queried for this category
    pub fn type_codes(&self) -> &'static [u8] {
        match self {
            Self::WingInGround => &[20, 21, 22, 23, 24, 25, 26, 27, 28, 29],
            Self::Fishing => &[30],
            Self::Towing => &[31, 32],
            Self::Military => &[35],
            Self::Sailing => &[36],
            Self::PleasureCraft => &[37],
            Self::HighSpeedCraft => &[40, 41, 42, 43, 44, 45, 46, 47, 48, 49],
            Self::Tug => &[52],
            Self::LawEnforcement => &[55],
            Self::MedicalTransport => &[58],
            Self::Passenger => &[60, 61, 62, 63, 64, 65, 66, 67, 68, 69],
            Self::Cargo => &[70, 71, 72, 73, 74, 75, 76, 77, 78, 79],
            Self::Tanker => &[80, 81, 82, 83, 84, 85, 86, 87, 88, 89],
            Self::Other => &[
                0, 33, 34, 50, 51, 53, 54, 59, 90, 91, 92, 93, 94, 95, 96, 97, 98, 99,
            ],
        }
    }

    /// Comma-separated codes as sent in the `vesselTypes` query parameter
    pub fn type_codes_param(&self) -> String {
        self.type_codes()
            .iter()
            .map(|code| code.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Key used in the persisted layer visibility map
    pub fn visibility_key(&self) -> &'static str {
        match self {
            Self::WingInGround => "wigVessels",
            Self::Fishing => "fishingVessels",
            Self::Towing => "towingVessels",
            Self::Military => "militaryVessels",
            Self::Sailing => "sailingVessels",
            Self::PleasureCraft => "pleasureCrafts",
            Self::HighSpeedCraft => "highSpeedCrafts",
            Self::Tug => "tugs",
            Self::LawEnforcement => "lawEnforcement",
            Self::MedicalTransport => "medicalTransport",
            Self::Passenger => "passengerVessels",
            Self::Cargo => "cargoVessels",
            Self::Tanker => "tankerVessels",
            Self::Other => "otherVessels",
        }
    }

    /// Prefix of the render layer ids
    pub fn slug(&self) -> &'static str {
        match self {
            Self::WingInGround => "wig",
            Self::Fishing => "fishing",
            Self::Towing => "towing",
            Self::Military => "military",
            Self::Sailing => "sailing",
            Self::PleasureCraft => "pleasure-craft",
            Self::HighSpeedCraft => "hsc",
            Self::Tug => "tug",
            Self::LawEnforcement => "law-enforcement",
            Self::MedicalTransport => "medical-transport",
            Self::Passenger => "passenger",
            Self::Cargo => "cargo",
            Self::Tanker => "tanker",
            Self::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::WingInGround => "Wing in Ground Vessels",
            Self::Fishing => "Fishing Vessels",
            Self::Towing => "Towing Vessels",
            Self::Military => "Military Vessels",
            Self::Sailing => "Sailing Vessels",
            Self::PleasureCraft => "Pleasure Crafts",
            Self::HighSpeedCraft => "High Speed Crafts",
            Self::Tug => "Tugs",
            Self::LawEnforcement => "Law Enforcement",
            Self::MedicalTransport => "Medical Transport",
            Self::Passenger => "Passenger Vessels",
            Self::Cargo => "Cargo Vessels",
            Self::Tanker => "Tankers",
            Self::Other => "Other Vessels",
        }
    }

    pub fn from_visibility_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.visibility_key() == key)
    }

    /// Category an upstream type code belongs to, if any
    pub fn for_type_code(code: u8) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.type_codes().contains(&code))
    }
}

impl std::fmt::Display for VesselCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}
