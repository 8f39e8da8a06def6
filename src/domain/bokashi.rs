//! Bokashi compost sites shown on the Bins tab.
//!
//! The list is fixed sample data; nothing is fetched or stored.

/// Display colour of a site, derived from its completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteColour {
    /// Bin is full
    Red,
    Green,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BokashiSite {
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Completion in `[0, 1]`
    pub avancement: f64,
    pub logo: SiteLogo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteLogo {
    Leaf,
    House,
    Person,
}

impl SiteLogo {
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Leaf => "🍃",
            Self::House => "🏠",
            Self::Person => "👤",
        }
    }
}

impl BokashiSite {
    pub fn new(
        title: impl Into<String>,
        latitude: f64,
        longitude: f64,
        avancement: f64,
        logo: SiteLogo,
    ) -> Self {
        Self {
            title: title.into(),
            latitude,
            longitude,
            avancement,
            logo,
        }
    }

    /// Red only when the bin is exactly full
    pub fn colour(&self) -> SiteColour {
        if self.avancement == 1.0 {
            SiteColour::Red
        } else {
            SiteColour::Green
        }
    }

    /// Width of the progress fill relative to the track
    pub fn fill_fraction(&self) -> f32 {
        self.avancement.clamp(0.0, 1.0) as f32
    }

    pub fn percent_label(&self) -> String {
        format!("{}%", (self.avancement * 100.0) as i64)
    }
}

pub fn sample_sites() -> Vec<BokashiSite> {
    vec![
        BokashiSite::new(
            "Coloc WEI",
            48.70849918234135,
            2.1612690567438633,
            0.7,
            SiteLogo::Leaf,
        ),
        BokashiSite::new("RU Eiffel", 48.710263, 2.167568, 1.0, SiteLogo::House),
        BokashiSite::new(
            "Pierre Thébault",
            48.710220,
            2.162513,
            1.0,
            SiteLogo::Person,
        ),
    ]
}

/// Map centre: the selected site, or the first one until a site is picked
pub fn centre(sites: &[BokashiSite], selected: Option<usize>) -> Option<(f64, f64)> {
    selected
        .and_then(|i| sites.get(i))
        .or_else(|| sites.first())
        .map(|s| (s.latitude, s.longitude))
}
