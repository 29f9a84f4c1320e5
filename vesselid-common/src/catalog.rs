//! Field catalog
//!
//! Static enumerations of selectable values. No logic beyond lookup; every
//! other component reads from here.

use serde::{Deserialize, Serialize};

/// Named catalog of selectable values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Catalog {
    Countries,
    Ports,
    ShipTypes,
    ShipRoles,
    HullForms,
    HullShapes,
    BowShapes,
    SizeCategories,
    SuperstructureLayouts,
    FunnelArrangements,
    MastConfigurations,
    RadarConfigurations,
    GunMountPositions,
    GunMountSizes,
    CiwsPositions,
    NavigationStatuses,
    HullColours,
    Behaviours,
}

impl Catalog {
    /// All values of this catalog, in display order
    pub fn values(&self) -> &'static [&'static str] {
        match self {
            Catalog::Countries => COUNTRIES,
            Catalog::Ports => PORTS,
            Catalog::ShipTypes => SHIP_TYPES,
            Catalog::ShipRoles => SHIP_ROLES,
            Catalog::HullForms => HULL_FORMS,
            Catalog::HullShapes => HULL_SHAPES,
            Catalog::BowShapes => BOW_SHAPES,
            Catalog::SizeCategories => SIZE_CATEGORIES,
            Catalog::SuperstructureLayouts => SUPERSTRUCTURE_LAYOUTS,
            Catalog::FunnelArrangements => FUNNEL_ARRANGEMENTS,
            Catalog::MastConfigurations => MAST_CONFIGURATIONS,
            Catalog::RadarConfigurations => RADAR_CONFIGURATIONS,
            Catalog::GunMountPositions => GUN_MOUNT_POSITIONS,
            Catalog::GunMountSizes => GUN_MOUNT_SIZES,
            Catalog::CiwsPositions => CIWS_POSITIONS,
            Catalog::NavigationStatuses => NAVIGATION_STATUSES,
            Catalog::HullColours => HULL_COLOURS,
            Catalog::Behaviours => BEHAVIOURS,
        }
    }

    /// True if `value` is a member of this catalog (exact match)
    pub fn contains(&self, value: &str) -> bool {
        self.values().iter().any(|v| *v == value)
    }
}

pub const COUNTRIES: &[&str] = &[
    "Algeria", "Argentina", "Australia", "Bangladesh", "Brazil", "Canada", "Chile",
    "China", "Colombia", "Denmark", "Egypt", "Finland", "France", "Germany", "Greece",
    "India", "Indonesia", "Iran", "Israel", "Italy", "Japan", "Malaysia", "Mexico",
    "Netherlands", "New Zealand", "North Korea", "Norway", "Pakistan", "Peru",
    "Philippines", "Poland", "Portugal", "Russia", "Saudi Arabia", "Singapore",
    "South Africa", "South Korea", "Spain", "Sweden", "Taiwan", "Thailand", "Turkey",
    "Ukraine", "United Arab Emirates", "United Kingdom", "USA", "Vietnam",
];

pub const PORTS: &[&str] = &[
    "Brest", "Cartagena", "Den Helder", "Devonport", "Esquimalt", "Faslane",
    "Fleet Base East", "Gdynia", "Halifax", "Karachi", "Kiel", "Kronstadt",
    "La Spezia", "Mayport", "Mumbai", "Murmansk", "Naval Station Norfolk",
    "Ningbo", "Pearl Harbor", "Portsmouth", "Qingdao", "Rota", "San Diego",
    "Sasebo", "Sevastopol", "Taranto", "Toulon", "Vladivostok", "Wilhelmshaven",
    "Yokosuka", "Zhanjiang",
];

pub const SHIP_TYPES: &[&str] = &[
    "Aircraft Carrier", "Amphibious Assault Ship", "Corvette", "Cruiser",
    "Destroyer", "Fast Attack Craft", "Frigate", "Landing Platform Dock",
    "Mine Countermeasures Vessel", "Offshore Patrol Vessel", "Patrol Boat",
    "Replenishment Oiler", "Submarine", "Survey Ship", "Training Ship",
];

pub const SHIP_ROLES: &[&str] = &[
    "Air Defence", "Amphibious Warfare", "Anti-Submarine Warfare",
    "Anti-Surface Warfare", "Coastal Defence", "Fleet Support", "Mine Warfare",
    "Multi-Role", "Patrol", "Power Projection", "Research", "Training",
];

pub const HULL_FORMS: &[&str] = &[
    "Monohull", "Catamaran", "Trimaran", "SWATH", "Planing", "Semi-Planing",
    "Displacement", "Wave-Piercing",
];

pub const HULL_SHAPES: &[&str] = &["Sleek", "Bulky", "Stealth-Faceted", "Conventional"];

pub const BOW_SHAPES: &[&str] = &[
    "Axe bow", "Bulbous", "Clipper", "Flared", "Raked", "Straight", "Wave-piercing",
];

pub const SIZE_CATEGORIES: &[&str] = &[
    "Very Small (<500 tons)",
    "Small (500-2,000 tons)",
    "Medium (2,000-5,000 tons)",
    "Large (5,000-15,000 tons)",
    "Very Large (15,000-50,000 tons)",
    "Very Large (50,000+ tons)",
];

pub const SUPERSTRUCTURE_LAYOUTS: &[&str] = &[
    "Forward", "Midships", "Aft", "Integrated", "Stepped", "Split", "Island",
];

pub const FUNNEL_ARRANGEMENTS: &[&str] = &[
    "None", "Single", "Twin side-by-side", "Twin in-line", "Integrated into mast",
];

pub const MAST_CONFIGURATIONS: &[&str] = &[
    "Lattice", "Pole", "Tripod", "Enclosed", "Integrated mast", "Twin masts",
];

pub const RADAR_CONFIGURATIONS: &[&str] = &[
    "Rotating", "Phased array", "Fixed-panel AESA", "Dome", "Combined rotating/fixed",
];

pub const GUN_MOUNT_POSITIONS: &[&str] = &[
    "Forward", "Aft", "Forward and aft", "Amidships", "Superfiring forward",
];

pub const GUN_MOUNT_SIZES: &[&str] = &[
    "Small (<57mm)", "Medium (57-100mm)", "Large (100-130mm)", "Heavy (>130mm)",
];

pub const CIWS_POSITIONS: &[&str] = &[
    "None", "Bridge roof", "Hangar roof", "Forward", "Aft", "Port and starboard",
];

pub const NAVIGATION_STATUSES: &[&str] = &[
    "Under way using engine", "At anchor", "Not under command", "Restricted manoeuvrability",
    "Moored", "Aground", "Engaged in fishing", "Under way sailing", "Not defined",
];

pub const HULL_COLOURS: &[&str] = &[
    "Haze grey", "Dark grey", "Light grey", "Blue-grey", "Black", "White", "Camouflage",
];

pub const BEHAVIOURS: &[&str] = &[
    "AIS dark period", "Loitering", "Shadowing", "High-speed transit",
    "Zig-zag course", "Flight operations", "Replenishment at sea",
    "Formation steaming", "Port call",
];
