//! Short-TTL cache for availability reads.
//!
//! Availability answers are advisory (a display number, not a reservation),
//! so a small staleness window is acceptable. Entries expire after the TTL
//! and are additionally invalidated on every committed movement that touches
//! one of the package's components.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use tapline_availability::AvailabilityResult;
use tapline_catalog::PackageId;
use tapline_core::VenueId;

pub const DEFAULT_AVAILABILITY_TTL: Duration = Duration::from_secs(2);

#[derive(Debug)]
struct CacheEntry {
    result: AvailabilityResult,
    inserted_at: Instant,
}

#[derive(Debug)]
pub struct AvailabilityCache {
    ttl: Duration,
    entries: RwLock<HashMap<(VenueId, PackageId), CacheEntry>>,
}

impl Default for AvailabilityCache {
    fn default() -> Self {
        Self::new(DEFAULT_AVAILABILITY_TTL)
    }
}

impl AvailabilityCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, venue_id: VenueId, package_id: PackageId) -> Option<AvailabilityResult> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(&(venue_id, package_id))?;
        if entry.inserted_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.result.clone())
    }

    pub fn put(&self, venue_id: VenueId, result: AvailabilityResult) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(
                (venue_id, result.package_id),
                CacheEntry {
                    result,
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    pub fn invalidate(&self, venue_id: VenueId, package_ids: &[PackageId]) {
        if let Ok(mut entries) = self.entries.write() {
            for &package_id in package_ids {
                entries.remove(&(venue_id, package_id));
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapline_core::EntityId;

    fn result_for(package_id: PackageId) -> AvailabilityResult {
        AvailabilityResult {
            package_id,
            max_sellable: Some(4),
            bottleneck_product: None,
            breakdown: vec![],
        }
    }

    #[test]
    fn fresh_entries_hit_and_expired_entries_miss() {
        let cache = AvailabilityCache::new(Duration::from_millis(20));
        let venue_id = VenueId::new();
        let package_id = PackageId(EntityId::new());

        cache.put(venue_id, result_for(package_id));
        assert!(cache.get(venue_id, package_id).is_some());

        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.get(venue_id, package_id).is_none());
    }

    #[test]
    fn invalidation_removes_targeted_packages_only() {
        let cache = AvailabilityCache::default();
        let venue_id = VenueId::new();
        let hit = PackageId(EntityId::new());
        let kept = PackageId(EntityId::new());

        cache.put(venue_id, result_for(hit));
        cache.put(venue_id, result_for(kept));
        cache.invalidate(venue_id, &[hit]);

        assert!(cache.get(venue_id, hit).is_none());
        assert!(cache.get(venue_id, kept).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn entries_are_venue_scoped() {
        let cache = AvailabilityCache::default();
        let package_id = PackageId(EntityId::new());

        cache.put(VenueId::new(), result_for(package_id));
        assert!(cache.get(VenueId::new(), package_id).is_none());
    }
}
