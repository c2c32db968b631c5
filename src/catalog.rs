//! Module for loading and representing the location catalog.
//!
//! A catalog is a read-only snapshot of points of interest (coordinates,
//! category, aggregated crowd sentiment) taken once per optimization call.
//! It can be built in memory, read from CSV or JSON, or taken from the
//! bundled London sample.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// Identifier of a location in the catalog.
pub type LocationId = u32;

/// Identifier of a location category (1 = Food, 2 = History, ...).
pub type CategoryId = u32;

/// A point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    #[serde(default)]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub category_id: CategoryId,
    /// Precomputed aggregate sentiment of reviews; 0 when there are none.
    #[serde(default)]
    pub sentiment: f64,
}

impl Location {
    pub fn new(id: LocationId, name: &str, latitude: f64, longitude: f64, category_id: CategoryId, sentiment: f64) -> Self {
        Location {
            id,
            name: name.to_string(),
            latitude,
            longitude,
            category_id,
            sentiment,
        }
    }

    /// Planar (lat/lon) Euclidean distance, used as the cheap search-time proxy.
    #[inline]
    pub fn planar_distance(&self, other: &Location) -> f64 {
        let dlat = self.latitude - other.latitude;
        let dlon = self.longitude - other.longitude;
        (dlat * dlat + dlon * dlon).sqrt()
    }

    /// `[lon, lat]` pair in the order routing providers expect.
    #[inline]
    pub fn lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// Row layout of a CSV catalog. `sentiment` may be absent or empty.
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: LocationId,
    #[serde(default)]
    name: String,
    latitude: f64,
    longitude: f64,
    category_id: CategoryId,
    #[serde(default)]
    sentiment: Option<f64>,
}

/// Read-only location snapshot keyed by id.
///
/// Ids are kept ordered so that every consumer iterating the catalog sees the
/// same sequence, which keeps seeded runs reproducible.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationCatalog {
    locations: BTreeMap<LocationId, Location>,
}

impl LocationCatalog {
    /// Build a catalog, rejecting duplicate ids and non-finite coordinates or sentiment.
    pub fn new(locations: Vec<Location>) -> Result<Self, CatalogError> {
        let mut map = BTreeMap::new();
        for loc in locations {
            if !loc.latitude.is_finite() || !loc.longitude.is_finite() {
                return Err(CatalogError::InvalidCoordinate(loc.id));
            }
            if !loc.sentiment.is_finite() {
                return Err(CatalogError::InvalidSentiment(loc.id));
            }
            let id = loc.id;
            if map.insert(id, loc).is_some() {
                return Err(CatalogError::DuplicateId(id));
            }
        }
        Ok(LocationCatalog { locations: map })
    }

    /// Load a catalog, choosing the parser from the file extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => Self::from_csv(path),
            Some("json") => Self::from_json(path),
            other => Err(CatalogError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    /// Parse a CSV catalog with header `id,name,latitude,longitude,category_id[,sentiment]`.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = File::open(path)?;
        Self::from_csv_reader(file)
    }

    pub fn from_csv_reader<R: std::io::Read>(reader: R) -> Result<Self, CatalogError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut locations = Vec::new();
        for row in rdr.deserialize() {
            let row: CsvRow = row?;
            locations.push(Location {
                id: row.id,
                name: row.name,
                latitude: row.latitude,
                longitude: row.longitude,
                category_id: row.category_id,
                sentiment: row.sentiment.unwrap_or(0.0),
            });
        }
        log::debug!("Loaded {} locations from CSV", locations.len());
        Self::new(locations)
    }

    /// Parse a JSON array of locations.
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = File::open(path)?;
        let locations: Vec<Location> = serde_json::from_reader(file)?;
        log::debug!("Loaded {} locations from JSON", locations.len());
        Self::new(locations)
    }

    /// Bundled London sample: sentiment is the crowd rating scaled by 1/5.
    pub fn sample() -> Self {
        let raw: [(&str, f64, f64, CategoryId, f64); 21] = [
            ("Dishoom Covent Garden", 51.5126, -0.1243, 1, 4.8),
            ("Borough Market", 51.5056, -0.0913, 1, 4.7),
            ("The Wolseley", 51.5079, -0.1426, 1, 4.5),
            ("Flat Iron Square", 51.5025, -0.0876, 1, 4.3),
            ("Tower of London", 51.5081, -0.0759, 2, 4.9),
            ("Westminster Abbey", 51.4994, -0.1273, 2, 4.8),
            ("St. Paul's Cathedral", 51.5138, -0.0983, 2, 4.7),
            ("Harrods", 51.4996, -0.1634, 3, 4.7),
            ("Oxford Street", 51.5154, -0.1412, 3, 4.5),
            ("Covent Garden Market", 51.5129, -0.1223, 3, 4.4),
            ("Liberty London", 51.5139, -0.1448, 3, 4.3),
            ("Hyde Park", 51.5073, -0.1657, 4, 4.8),
            ("Regent's Park", 51.5310, -0.1593, 4, 4.6),
            ("British Museum", 51.5194, -0.1269, 5, 4.9),
            ("Tate Modern", 51.5076, -0.0994, 5, 4.8),
            ("National Gallery", 51.5089, -0.1283, 5, 4.7),
            ("Victoria and Albert Museum", 51.4966, -0.1722, 5, 4.6),
            ("Fabric Nightclub", 51.5203, -0.1048, 6, 4.5),
            ("Ministry of Sound", 51.4975, -0.0997, 6, 4.4),
            ("The Roxy", 51.5132, -0.1313, 6, 4.3),
            ("Cirque le Soir", 51.5135, -0.1358, 6, 4.2),
        ];

        let locations = raw
            .iter()
            .enumerate()
            .map(|(i, &(name, lat, lon, category, rating))| {
                Location::new(i as LocationId + 1, name, lat, lon, category, rating / 5.0)
            })
            .collect::<Vec<_>>();

        let map = locations.into_iter().map(|l| (l.id, l)).collect();
        LocationCatalog { locations: map }
    }

    #[inline]
    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(&id)
    }

    #[inline]
    pub fn contains(&self, id: LocationId) -> bool {
        self.locations.contains_key(&id)
    }

    /// All ids in ascending order.
    pub fn ids(&self) -> Vec<LocationId> {
        self.locations.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }

    /// Locations keyed by id, restricted to `category_filter` when given.
    pub fn list_locations(&self, category_filter: Option<&[CategoryId]>) -> BTreeMap<LocationId, Location> {
        self.locations
            .values()
            .filter(|l| category_filter.map_or(true, |f| f.contains(&l.category_id)))
            .map(|l| (l.id, l.clone()))
            .collect()
    }

    /// Summary figures about the catalog.
    pub fn statistics(&self) -> CatalogStatistics {
        let mut per_category: BTreeMap<CategoryId, usize> = BTreeMap::new();
        for loc in self.locations.values() {
            *per_category.entry(loc.category_id).or_insert(0) += 1;
        }

        let n = self.locations.len();
        let mean_sentiment = if n > 0 {
            self.locations.values().map(|l| l.sentiment).sum::<f64>() / n as f64
        } else {
            0.0
        };

        let mut stats = CatalogStatistics {
            num_locations: n,
            per_category,
            mean_sentiment,
            min_latitude: f64::INFINITY,
            max_latitude: f64::NEG_INFINITY,
            min_longitude: f64::INFINITY,
            max_longitude: f64::NEG_INFINITY,
        };
        for loc in self.locations.values() {
            stats.min_latitude = stats.min_latitude.min(loc.latitude);
            stats.max_latitude = stats.max_latitude.max(loc.latitude);
            stats.min_longitude = stats.min_longitude.min(loc.longitude);
            stats.max_longitude = stats.max_longitude.max(loc.longitude);
        }
        stats
    }
}

/// Display colour of a category, as used by map markers.
pub fn category_color(category: CategoryId) -> &'static str {
    match category {
        1 => "#FF0000",
        2 => "#0000FF",
        3 => "#00FF00",
        4 => "#FFA500",
        5 => "#800080",
        6 => "#FFFF00",
        _ => "#999999",
    }
}

pub fn category_name(category: CategoryId) -> &'static str {
    match category {
        1 => "Food & Drink",
        2 => "History",
        3 => "Shopping",
        4 => "Nature",
        5 => "Art & Culture",
        6 => "Nightlife",
        _ => "Other",
    }
}

/// Statistics about a location catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStatistics {
    pub num_locations: usize,
    pub per_category: BTreeMap<CategoryId, usize>,
    pub mean_sentiment: f64,
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl std::fmt::Display for CatalogStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Locations: {}", self.num_locations)?;
        for (category, count) in &self.per_category {
            writeln!(f, "  {:<15} ({}): {}", category_name(*category), category, count)?;
        }
        writeln!(f, "  Mean sentiment: {:.3}", self.mean_sentiment)?;
        writeln!(
            f,
            "  Bounding box: lat [{:.4}, {:.4}]  lon [{:.4}, {:.4}]",
            self.min_latitude, self.max_latitude, self.min_longitude, self.max_longitude
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_distance() {
        let a = Location::new(1, "a", 0.0, 0.0, 1, 0.0);
        let b = Location::new(2, "b", 3.0, 4.0, 1, 0.0);
        assert!((a.planar_distance(&b) - 5.0).abs() < 1e-10);
        assert!((b.planar_distance(&a) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let locs = vec![
            Location::new(1, "a", 0.0, 0.0, 1, 0.0),
            Location::new(1, "b", 1.0, 0.0, 2, 0.0),
        ];
        assert!(matches!(LocationCatalog::new(locs), Err(CatalogError::DuplicateId(1))));
    }

    #[test]
    fn test_non_finite_coordinate_rejected() {
        let locs = vec![Location::new(7, "a", f64::NAN, 0.0, 1, 0.0)];
        assert!(matches!(LocationCatalog::new(locs), Err(CatalogError::InvalidCoordinate(7))));
    }

    #[test]
    fn test_non_finite_sentiment_rejected() {
        let data = "id,name,latitude,longitude,category_id,sentiment\n\
                    1,A,0,0,1,NaN\n\
                    2,B,0,1,1,0.5\n";
        assert!(matches!(
            LocationCatalog::from_csv_reader(data.as_bytes()),
            Err(CatalogError::InvalidSentiment(1))
        ));

        let locs = vec![Location::new(3, "c", 0.0, 0.0, 1, f64::INFINITY)];
        assert!(matches!(LocationCatalog::new(locs), Err(CatalogError::InvalidSentiment(3))));
    }

    #[test]
    fn test_list_locations_filter() {
        let catalog = LocationCatalog::sample();
        let all = catalog.list_locations(None);
        assert_eq!(all.len(), 21);

        let food = catalog.list_locations(Some(&[1]));
        assert_eq!(food.len(), 4);
        assert!(food.values().all(|l| l.category_id == 1));

        let none = catalog.list_locations(Some(&[]));
        assert!(none.is_empty());
    }

    #[test]
    fn test_csv_sentiment_defaults_to_zero() {
        let data = "id,name,latitude,longitude,category_id,sentiment\n\
                    1,Alpha,51.5,-0.1,1,0.8\n\
                    2,Beta,51.6,-0.2,2,\n";
        let catalog = LocationCatalog::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!((catalog.get(1).unwrap().sentiment - 0.8).abs() < 1e-12);
        assert_eq!(catalog.get(2).unwrap().sentiment, 0.0);
    }

    #[test]
    fn test_csv_without_sentiment_column() {
        let data = "id,name,latitude,longitude,category_id\n3,Gamma,1.0,2.0,4\n";
        let catalog = LocationCatalog::from_csv_reader(data.as_bytes()).unwrap();
        let loc = catalog.get(3).unwrap();
        assert_eq!(loc.category_id, 4);
        assert_eq!(loc.sentiment, 0.0);
        assert_eq!(loc.lon_lat(), [2.0, 1.0]);
    }

    #[test]
    fn test_category_colors() {
        assert_eq!(category_color(1), "#FF0000");
        assert_eq!(category_color(6), "#FFFF00");
        assert_eq!(category_color(42), "#999999");
    }

    #[test]
    fn test_statistics() {
        let stats = LocationCatalog::sample().statistics();
        assert_eq!(stats.num_locations, 21);
        assert_eq!(stats.per_category[&1], 4);
        assert_eq!(stats.per_category[&4], 2);
        assert!(stats.mean_sentiment > 0.8 && stats.mean_sentiment < 1.0);
        assert!(stats.min_latitude <= stats.max_latitude);
    }
}
