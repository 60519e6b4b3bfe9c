//! Human-readable incident location and its map link.

use reqwest::Url;

const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/";

/// Shown when the video row could not be loaded.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Address fields of the video an incident was detected in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidentLocation {
    pub road_name: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl IncidentLocation {
    pub fn city(&self) -> Option<&str> {
        present(&self.city)
    }

    /// `"{road}, {city}, {pincode}"` with `Unknown Road` / `City` standing in
    /// for missing parts. An absent pincode is left out.
    pub fn describe(&self) -> String {
        let road = present(&self.road_name).unwrap_or("Unknown Road");
        let city = present(&self.city).unwrap_or("City");
        match present(&self.pincode) {
            Some(pincode) => format!("{road}, {city}, {pincode}"),
            None => format!("{road}, {city}"),
        }
    }

    /// Maps search link for [`describe`](Self::describe); only produced when a
    /// pincode is known, since road and city alone are too vague to pin.
    pub fn map_link(&self) -> Option<String> {
        present(&self.pincode)?;
        Url::parse_with_params(
            MAPS_SEARCH_URL,
            &[("api", "1"), ("query", self.describe().as_str())],
        )
        .ok()
        .map(String::from)
    }
}

/// Location text for an optional video.
pub fn describe(location: Option<&IncidentLocation>) -> String {
    location.map_or_else(|| UNKNOWN_LOCATION.to_string(), IncidentLocation::describe)
}
