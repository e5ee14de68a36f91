use serde::{Deserialize, Serialize};

use crate::error::{ScrapeError, ScrapeResult};

/// Source platforms a request can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "linkedin")]
    LinkedIn,
    #[serde(rename = "google-business")]
    GoogleBusiness,
    #[serde(rename = "facebook")]
    Facebook,
}

/// Kind of entity a page yields; each kind owns one schema and one projection layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    ProfessionalProfile,
    ProfessionalCompany,
    BusinessListing,
    SocialPage,
    SocialProfile,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::LinkedIn, Platform::GoogleBusiness, Platform::Facebook];

    /// Identifier used in requests and routes
    pub fn slug(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "linkedin",
            Platform::GoogleBusiness => "google-business",
            Platform::Facebook => "facebook",
        }
    }

    /// Tag written into the Platform column of exported rows
    pub fn display_tag(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "LinkedIn",
            Platform::GoogleBusiness => "Google Business",
            Platform::Facebook => "Facebook",
        }
    }

    /// Substrings a URL must contain (any of) to belong to this platform
    pub fn url_patterns(&self) -> &'static [&'static str] {
        match self {
            Platform::LinkedIn => &["linkedin.com"],
            Platform::GoogleBusiness => &["google.com/maps", "maps.google.", "business.google.com"],
            Platform::Facebook => &["facebook.com"],
        }
    }

    pub fn accepts_url(&self, url: &str) -> bool {
        let lowered = url.to_ascii_lowercase();
        self.url_patterns().iter().any(|pattern| lowered.contains(pattern))
    }

    /// Reject empty URLs and URLs outside the platform's allow-list
    pub fn validate_url(&self, url: &str) -> ScrapeResult<()> {
        if url.trim().is_empty() {
            return Err(ScrapeError::invalid_input("URL is required"));
        }
        if !self.accepts_url(url) {
            return Err(ScrapeError::invalid_url(self.display_tag(), url));
        }
        Ok(())
    }

    /// Pick the entity kind (and thus the schema) for a URL of this platform
    pub fn entity_kind_for(&self, url: &str) -> EntityKind {
        match self {
            Platform::LinkedIn if url.contains("/company/") => EntityKind::ProfessionalCompany,
            Platform::LinkedIn => EntityKind::ProfessionalProfile,
            Platform::GoogleBusiness => EntityKind::BusinessListing,
            Platform::Facebook if url.contains("profile.php") || url.contains("/people/") => {
                EntityKind::SocialProfile
            }
            Platform::Facebook => EntityKind::SocialPage,
        }
    }

    /// Selector the browser strategy waits for before reading the page
    pub fn wait_selector(&self) -> Option<&'static str> {
        match self {
            Platform::LinkedIn => Some("h1"),
            Platform::GoogleBusiness => None,
            Platform::Facebook => Some(".xieb3on"),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linkedin" => Ok(Platform::LinkedIn),
            "google-business" | "google_business" | "google" => Ok(Platform::GoogleBusiness),
            "facebook" => Ok(Platform::Facebook),
            other => Err(ScrapeError::invalid_input(format!("Unsupported platform: {}", other))),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl EntityKind {
    /// Value of the Type column on the entity's primary row
    pub fn type_label(&self) -> &'static str {
        match self {
            EntityKind::ProfessionalProfile | EntityKind::SocialProfile => "Profile",
            EntityKind::ProfessionalCompany => "Company",
            EntityKind::BusinessListing => "Business",
            EntityKind::SocialPage => "Page",
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            EntityKind::ProfessionalProfile | EntityKind::ProfessionalCompany => Platform::LinkedIn,
            EntityKind::BusinessListing => Platform::GoogleBusiness,
            EntityKind::SocialPage | EntityKind::SocialProfile => Platform::Facebook,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::ProfessionalProfile => "professional-profile",
            EntityKind::ProfessionalCompany => "professional-company",
            EntityKind::BusinessListing => "business-listing",
            EntityKind::SocialPage => "social-page",
            EntityKind::SocialProfile => "social-profile",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_professional_profile_url_validation() {
        assert!(Platform::LinkedIn.validate_url("https://www.linkedin.com/in/jdoe").is_ok());

        let err = Platform::LinkedIn
            .validate_url("https://example.com/in/jdoe")
            .unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidUrl { .. }));
    }

    #[test]
    fn test_empty_url_is_invalid_input() {
        let err = Platform::Facebook.validate_url("   ").unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidInput { .. }));
    }

    #[test]
    fn test_business_listing_patterns() {
        let platform = Platform::GoogleBusiness;
        assert!(platform.accepts_url("https://www.google.com/maps/place/Blue+Bottle/@37.77,-122.41,17z"));
        assert!(platform.accepts_url("https://business.google.com/dashboard/l/123"));
        assert!(platform.accepts_url("https://maps.google.com/?cid=123"));
        assert!(!platform.accepts_url("https://www.google.com/search?q=coffee"));
    }

    #[test]
    fn test_entity_kind_selection() {
        assert_eq!(
            Platform::LinkedIn.entity_kind_for("https://www.linkedin.com/company/acme/"),
            EntityKind::ProfessionalCompany
        );
        assert_eq!(
            Platform::LinkedIn.entity_kind_for("https://www.linkedin.com/in/jdoe"),
            EntityKind::ProfessionalProfile
        );
        assert_eq!(
            Platform::Facebook.entity_kind_for("https://www.facebook.com/profile.php?id=42"),
            EntityKind::SocialProfile
        );
        assert_eq!(
            Platform::Facebook.entity_kind_for("https://www.facebook.com/acmecoffee"),
            EntityKind::SocialPage
        );
    }

    #[test]
    fn test_platform_parsing_and_serde() {
        assert_eq!("google-business".parse::<Platform>().ok(), Some(Platform::GoogleBusiness));
        assert!("myspace".parse::<Platform>().is_err());

        let json = serde_json::to_string(&Platform::LinkedIn).expect("serialize");
        assert_eq!(json, "\"linkedin\"");
        let kind: EntityKind = serde_json::from_str("\"business-listing\"").expect("parse");
        assert_eq!(kind, EntityKind::BusinessListing);
    }
}
