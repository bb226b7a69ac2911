//! Service list loader.

use ratings_store::{Service, ServiceStore, StoreError};
use serde::Serialize;

const FULL_STAR: char = '★';
const HALF_STAR: char = '⯪';
const EMPTY_STAR: char = '☆';

/// Five-glyph star rendering of an average.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StarGlyphs {
    pub full: u8,
    pub half: u8,
    pub empty: u8,
}

impl StarGlyphs {
    pub const SLOTS: u8 = 5;

    /// `full = floor(avg)`, plus a half glyph when the remainder is at
    /// least 0.5. No rating renders as five empty glyphs.
    pub fn from_average(average: Option<f64>) -> Self {
        let Some(avg) = average else {
            return Self {
                full: 0,
                half: 0,
                empty: Self::SLOTS,
            };
        };
        let avg = avg.clamp(0.0, f64::from(Self::SLOTS));
        let full = avg.floor() as u8;
        let half = u8::from(full < Self::SLOTS && avg - f64::from(full) >= 0.5);
        Self {
            full,
            half,
            empty: Self::SLOTS - full - half,
        }
    }

    pub fn render(&self) -> String {
        std::iter::repeat(FULL_STAR)
            .take(self.full as usize)
            .chain(std::iter::repeat(HALF_STAR).take(self.half as usize))
            .chain(std::iter::repeat(EMPTY_STAR).take(self.empty as usize))
            .collect()
    }
}

/// A service as displayed in the list.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ServiceView {
    #[serde(flatten)]
    pub service: Service,
    /// `None` when nobody has voted.
    pub average: Option<f64>,
    pub stars: StarGlyphs,
}

impl ServiceView {
    pub fn new(service: Service) -> Self {
        let average = service.aggregate().average();
        Self {
            service,
            average,
            stars: StarGlyphs::from_average(average),
        }
    }

    /// One decimal place, or `"—"` when there is no rating.
    pub fn average_label(&self) -> String {
        match self.average {
            Some(avg) => format!("{avg:.1}"),
            None => "—".to_string(),
        }
    }
}

/// Fetch every service, most-voted first, with its derived average.
///
/// Read-only and idempotent.
pub fn load_services<S>(store: &S) -> Result<Vec<ServiceView>, StoreError>
where
    S: ServiceStore + ?Sized,
{
    let services = store.list_services()?;
    tracing::debug!(count = services.len(), "service list loaded");
    Ok(services.into_iter().map(ServiceView::new).collect())
}
