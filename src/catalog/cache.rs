//! Keyed, deduplicating store of catalog responses.
//!
//! The cache never performs I/O. `request` hands out a [`FetchTicket`] when a
//! fetch has to be started; the runtime runs it and reports back through
//! `complete`. A ticket whose key was evicted or re-requested since it was
//! issued is stale and its result is dropped.

use super::{CacheKey, CatalogError, Payload};
use crate::model::{Build, PartialBuild, ServerType, Stats, Version};
use foldhash::HashMap;

/// Proof that a fetch for `key` was started by this cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub key: CacheKey,
    generation: u64,
}

/// What a reader sees for one key.
#[derive(Debug, PartialEq)]
pub enum Fetch<'a, T: ?Sized> {
    /// The key has an unresolved parameter; nothing will ever be fetched for it.
    NotApplicable,
    Loading,
    Ready(&'a T),
    Failed(&'a CatalogError),
}

impl<'a, T: ?Sized> Fetch<'a, T> {
    pub fn ready(&self) -> Option<&'a T> {
        match self {
            Fetch::Ready(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Fetch::Loading)
    }
}

#[derive(Debug, Default)]
struct Entry {
    /// Last completed result, kept visible while a revalidation is in flight.
    value: Option<Result<Payload, CatalogError>>,
    /// Generation of the outstanding request, if any.
    in_flight: Option<u64>,
}

#[derive(Debug, Default)]
pub struct CatalogCache {
    entries: HashMap<CacheKey, Entry>,
    next_generation: u64,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fetch for `key` unless it is already cached, failed or in flight.
    ///
    /// Failures stay cached until [`revalidate`](Self::revalidate) is called.
    pub fn request(&mut self, key: CacheKey) -> Option<FetchTicket> {
        if self.entries.contains_key(&key) {
            return None;
        }
        let generation = self.bump_generation();
        log::debug!("cache miss for {:?}, fetching", key);
        self.entries.insert(
            key.clone(),
            Entry {
                value: None,
                in_flight: Some(generation),
            },
        );
        Some(FetchTicket { key, generation })
    }

    /// Like [`request`](Self::request) but a key with unresolved parameters is a no-op.
    pub fn request_opt(&mut self, key: Option<CacheKey>) -> Option<FetchTicket> {
        key.and_then(|key| self.request(key))
    }

    /// Refetches `key` while keeping its current value visible.
    ///
    /// Returns `None` if a request for the key is already outstanding.
    pub fn revalidate(&mut self, key: CacheKey) -> Option<FetchTicket> {
        if self
            .entries
            .get(&key)
            .is_some_and(|entry| entry.in_flight.is_some())
        {
            return None;
        }
        let generation = self.bump_generation();
        self.entries.entry(key.clone()).or_default().in_flight = Some(generation);
        Some(FetchTicket { key, generation })
    }

    /// Stores the result of a fetch. Returns `false` when the ticket is stale.
    pub fn complete(&mut self, ticket: FetchTicket, result: Result<Payload, CatalogError>) -> bool {
        let Some(entry) = self.entries.get_mut(&ticket.key) else {
            log::debug!("dropping response for evicted key {:?}", ticket.key);
            return false;
        };
        if entry.in_flight != Some(ticket.generation) {
            log::debug!("dropping stale response for {:?}", ticket.key);
            return false;
        }

        let result = match result {
            Ok(payload) if !payload.answers(&ticket.key) => Err(CatalogError::Decode {
                url: format!("{:?}", ticket.key),
                message: "response does not match the requested resource".to_string(),
            }),
            other => other,
        };
        if let Err(err) = &result {
            log::warn!("fetch for {:?} failed: {}", ticket.key, err);
        }

        entry.in_flight = None;
        entry.value = Some(result);
        true
    }

    /// Drops every entry whose key does not satisfy `keep`. In-flight
    /// requests for dropped keys become stale.
    pub fn retain(&mut self, mut keep: impl FnMut(&CacheKey) -> bool) {
        self.entries.retain(|key, _| keep(key));
    }

    pub fn is_in_flight(&self, key: &CacheKey) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.in_flight.is_some())
    }

    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.entries.keys()
    }

    pub fn get(&self, key: Option<&CacheKey>) -> Fetch<'_, Payload> {
        let Some(key) = key else {
            return Fetch::NotApplicable;
        };
        match self.entries.get(key).and_then(|entry| entry.value.as_ref()) {
            Some(Ok(payload)) => Fetch::Ready(payload),
            Some(Err(err)) => Fetch::Failed(err),
            None => Fetch::Loading,
        }
    }

    pub fn types(&self) -> Fetch<'_, [ServerType]> {
        project(self.get(Some(&CacheKey::Types)), |payload| match payload {
            Payload::Types(types) => Some(types.as_slice()),
            _ => None,
        })
    }

    pub fn versions(&self, type_id: Option<&str>) -> Fetch<'_, [Version]> {
        let key = CacheKey::versions(type_id);
        project(self.get(key.as_ref()), |payload| match payload {
            Payload::Versions(versions) => Some(versions.as_slice()),
            _ => None,
        })
    }

    pub fn builds(&self, type_id: Option<&str>, version_id: Option<&str>) -> Fetch<'_, [PartialBuild]> {
        let key = CacheKey::builds(type_id, version_id);
        project(self.get(key.as_ref()), |payload| match payload {
            Payload::Builds(builds) => Some(builds.as_slice()),
            _ => None,
        })
    }

    pub fn build(&self, build_id: Option<u64>) -> Fetch<'_, Build> {
        let key = CacheKey::build(build_id);
        project(self.get(key.as_ref()), |payload| match payload {
            Payload::Build(build) => Some(build.as_ref()),
            _ => None,
        })
    }

    pub fn stats(&self) -> Fetch<'_, Stats> {
        project(self.get(Some(&CacheKey::Stats)), |payload| match payload {
            Payload::Stats(stats) => Some(stats),
            _ => None,
        })
    }

    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

fn project<'a, T: ?Sized>(
    fetch: Fetch<'a, Payload>,
    select: impl FnOnce(&'a Payload) -> Option<&'a T>,
) -> Fetch<'a, T> {
    match fetch {
        Fetch::NotApplicable => Fetch::NotApplicable,
        Fetch::Loading => Fetch::Loading,
        Fetch::Failed(err) => Fetch::Failed(err),
        // `complete` only stores payloads that answer their key.
        Fetch::Ready(payload) => select(payload).map_or(Fetch::Loading, Fetch::Ready),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Stats;

    fn types_key() -> CacheKey {
        CacheKey::Types
    }

    #[test]
    fn test_request_deduplicates_in_flight_keys() {
        let mut cache = CatalogCache::new();
        let ticket = cache.request(types_key());
        assert!(ticket.is_some());
        assert!(cache.request(types_key()).is_none());
        assert!(cache.types().is_loading());
        assert!(cache.is_in_flight(&types_key()));
    }

    #[test]
    fn test_unresolved_parameters_are_not_applicable() {
        let mut cache = CatalogCache::new();
        assert!(cache.request_opt(CacheKey::versions(None)).is_none());
        assert_eq!(cache.versions(None), Fetch::NotApplicable);
        assert_eq!(cache.builds(Some("PAPER"), None), Fetch::NotApplicable);
        assert_eq!(cache.build(None), Fetch::NotApplicable);
        assert_eq!(cache.keys().count(), 0);
    }

    #[test]
    fn test_completed_value_is_served_without_refetch() {
        let mut cache = CatalogCache::new();
        let ticket = cache.request(CacheKey::Stats).unwrap();
        assert!(cache.complete(ticket, Ok(Payload::Stats(Stats { builds: 3, hashes: 4 }))));
        assert_eq!(cache.stats().ready(), Some(&Stats { builds: 3, hashes: 4 }));
        assert!(cache.request(CacheKey::Stats).is_none());
    }

    #[test]
    fn test_failure_is_resurfaced_until_revalidated() {
        let mut cache = CatalogCache::new();
        let ticket = cache.request(types_key()).unwrap();
        let err = CatalogError::Network {
            url: "http://catalog/types".into(),
            message: "connection refused".into(),
        };
        assert!(cache.complete(ticket, Err(err.clone())));
        assert_eq!(cache.types(), Fetch::Failed(&err));
        assert!(cache.request(types_key()).is_none());
        assert_eq!(cache.types(), Fetch::Failed(&err));

        let retry = cache.revalidate(types_key()).unwrap();
        assert!(cache.complete(retry, Ok(Payload::Types(Vec::new()))));
        assert_eq!(cache.types().ready().map(|t| t.len()), Some(0));
    }

    #[test]
    fn test_revalidate_keeps_value_and_drops_superseded_response() {
        let mut cache = CatalogCache::new();
        let first = cache.request(CacheKey::Stats).unwrap();
        assert!(cache.complete(first.clone(), Ok(Payload::Stats(Stats::default()))));

        let second = cache.revalidate(CacheKey::Stats).unwrap();
        assert!(cache.revalidate(CacheKey::Stats).is_none());
        assert_eq!(cache.stats().ready(), Some(&Stats::default()));

        // A response carrying an older ticket is ignored.
        assert!(!cache.complete(first, Ok(Payload::Stats(Stats { builds: 1, hashes: 1 }))));
        assert!(cache.complete(second, Ok(Payload::Stats(Stats { builds: 2, hashes: 2 }))));
        assert_eq!(cache.stats().ready().map(|s| s.builds), Some(2));
    }

    #[test]
    fn test_evicted_key_ignores_late_response() {
        let mut cache = CatalogCache::new();
        let key = CacheKey::Versions {
            type_id: "VANILLA".into(),
        };
        let ticket = cache.request(key.clone()).unwrap();
        cache.retain(|k| *k != key);
        assert!(!cache.complete(ticket, Ok(Payload::Versions(Vec::new()))));
        assert_eq!(cache.versions(Some("VANILLA")), Fetch::Loading);
        assert!(cache.request(key).is_some());
    }

    #[test]
    fn test_mismatched_payload_is_stored_as_decode_failure() {
        let mut cache = CatalogCache::new();
        let ticket = cache.request(CacheKey::Stats).unwrap();
        assert!(cache.complete(ticket, Ok(Payload::Types(Vec::new()))));
        assert!(matches!(cache.stats(), Fetch::Failed(CatalogError::Decode { .. })));
    }
}
