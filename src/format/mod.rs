//! Format identity: [`FormatKey`] and the canonical [`FormatRegistry`].
//!
//! A clipboard format is named by one or more textual identifiers
//! (`text/plain`, `UTF8_STRING`, ...). Keys compare by identifier *set*;
//! insertion order is kept so the first identifier stays the primary one
//! and so a key re-derives the same way after a round trip.
//!
//! The registry is plain data passed by reference. Resolution never
//! mutates it: it returns either the canonical key or a novel candidate
//! that the caller may [`FormatRegistry::adopt`].

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Errors from constructing keys or registering formats.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("format key needs at least one identifier")]
    NoIdentifiers,
    #[error("format identifier must not be empty")]
    EmptyIdentifier,
    #[error("identifier {identifier:?} already belongs to format {owner}")]
    IdentifierClaimed { identifier: String, owner: FormatKey },
}

/// Identity of a content format.
#[derive(Debug, Clone, Eq)]
pub struct FormatKey {
    /// Non-empty, de-duplicated, insertion ordered.
    identifiers: Vec<String>,
}

impl FormatKey {
    /// Build a key from identifiers, dropping repeats.
    ///
    /// Fails if the list is empty or any identifier is the empty string.
    pub fn new<I, S>(identifiers: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids: Vec<String> = Vec::new();
        for id in identifiers {
            let id = id.into();
            if id.is_empty() {
                return Err(RegistryError::EmptyIdentifier);
            }
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            return Err(RegistryError::NoIdentifiers);
        }
        Ok(Self { identifiers: ids })
    }

    /// Single-identifier key.
    pub fn single(identifier: impl Into<String>) -> Result<Self, RegistryError> {
        Self::new([identifier.into()])
    }

    /// The first identifier.
    pub fn primary(&self) -> &str {
        &self.identifiers[0]
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.identifiers.iter().any(|id| id == identifier)
    }
}

impl PartialEq for FormatKey {
    fn eq(&self, other: &Self) -> bool {
        // Identifiers are unique within a key, so equal length plus
        // containment is set equality.
        self.identifiers.len() == other.identifiers.len()
            && self.identifiers.iter().all(|id| other.contains(id))
    }
}

impl Hash for FormatKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut sorted: Vec<&str> = self.identifiers.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted.hash(state);
    }
}

impl fmt::Display for FormatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.identifiers.join(", "))
    }
}

/// Outcome of [`FormatRegistry::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Every identifier named the same registered format.
    Canonical(FormatKey),
    /// Not registered (or identifiers disagreed). The caller decides
    /// whether to register it.
    Novel(FormatKey),
}

impl Resolution {
    pub fn key(&self) -> &FormatKey {
        match self {
            Resolution::Canonical(key) | Resolution::Novel(key) => key,
        }
    }

    pub fn into_key(self) -> FormatKey {
        match self {
            Resolution::Canonical(key) | Resolution::Novel(key) => key,
        }
    }

    pub fn is_canonical(&self) -> bool {
        matches!(self, Resolution::Canonical(_))
    }
}

/// Identifiers seeded by [`FormatRegistry::with_standard_formats`].
pub const STANDARD_FORMATS: &[&str] = &[
    "text/plain",
    "text/html",
    "text/rtf",
    "text/uri-list",
    "image/png",
    "application/x-file-list",
];

/// Table of canonical formats, addressable by any of their identifiers.
#[derive(Debug, Default, Clone)]
pub struct FormatRegistry {
    formats: Vec<FormatKey>,
    by_identifier: HashMap<String, usize>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the common single-identifier formats.
    pub fn with_standard_formats() -> Self {
        let mut registry = Self::new();
        for id in STANDARD_FORMATS {
            let seeded = FormatKey::single(*id).and_then(|key| registry.register(key));
            if let Err(e) = seeded {
                tracing::debug!(format = *id, reason = %e, "standard format not seeded");
            }
        }
        registry
    }

    /// Look up the canonical format that claims `identifier`.
    pub fn lookup(&self, identifier: &str) -> Option<&FormatKey> {
        self.by_identifier
            .get(identifier)
            .map(|&idx| &self.formats[idx])
    }

    pub fn is_registered(&self, key: &FormatKey) -> bool {
        self.lookup(key.primary()) == Some(key)
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    /// Register `key` as canonical, claiming all of its identifiers.
    ///
    /// Registering an already-registered key is a no-op. Fails if any
    /// identifier is claimed by a different format.
    pub fn register(&mut self, key: FormatKey) -> Result<(), RegistryError> {
        for id in key.identifiers() {
            if let Some(owner) = self.lookup(id) {
                if *owner == key {
                    continue;
                }
                return Err(RegistryError::IdentifierClaimed {
                    identifier: id.clone(),
                    owner: owner.clone(),
                });
            }
        }
        if self.is_registered(&key) {
            return Ok(());
        }

        let idx = self.formats.len();
        for id in key.identifiers() {
            self.by_identifier.insert(id.clone(), idx);
        }
        tracing::debug!(format = %key, "registered format");
        self.formats.push(key);
        Ok(())
    }

    /// Register a novel key if none of its identifiers are taken.
    ///
    /// Returns whether the key is canonical afterwards. Keys that clash
    /// stay ad-hoc composites.
    pub fn adopt(&mut self, key: &FormatKey) -> bool {
        match self.register(key.clone()) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(format = %key, reason = %e, "format left unregistered");
                false
            }
        }
    }

    /// Resolve identifiers read from a stream into a format key.
    ///
    /// The first identifier picks the candidate: its canonical format if
    /// registered, otherwise a fresh single-identifier key. Each following
    /// identifier must resolve to that same candidate. On disagreement the
    /// candidate becomes a composite of the identifiers seen so far. A
    /// composite is never registered here, so later identifiers keep
    /// extending it.
    pub fn resolve<S: AsRef<str>>(&self, identifiers: &[S]) -> Result<Resolution, RegistryError> {
        let first = identifiers.first().ok_or(RegistryError::NoIdentifiers)?.as_ref();
        if first.is_empty() {
            return Err(RegistryError::EmptyIdentifier);
        }

        let (mut candidate, mut canonical) = match self.lookup(first) {
            Some(key) => (key.clone(), true),
            None => (FormatKey::single(first)?, false),
        };

        for (j, id) in identifiers.iter().enumerate().skip(1) {
            let id = id.as_ref();
            if id.is_empty() {
                return Err(RegistryError::EmptyIdentifier);
            }
            let agrees = canonical && self.lookup(id) == Some(&candidate);
            if !agrees {
                candidate = FormatKey::new(identifiers[..=j].iter().map(|s| s.as_ref()))?;
                canonical = false;
            }
        }

        Ok(if canonical {
            Resolution::Canonical(candidate)
        } else {
            Resolution::Novel(candidate)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn key(ids: &[&str]) -> FormatKey {
        FormatKey::new(ids.iter().copied()).unwrap()
    }

    #[test]
    fn key_rejects_empty_list() {
        let ids: [&str; 0] = [];
        assert_eq!(FormatKey::new(ids), Err(RegistryError::NoIdentifiers));
    }

    #[test]
    fn key_rejects_empty_identifier() {
        assert_eq!(
            FormatKey::new(["text/plain", ""]),
            Err(RegistryError::EmptyIdentifier)
        );
    }

    #[test]
    fn key_drops_repeated_identifiers() {
        let k = key(&["a", "b", "a"]);
        assert_eq!(k.identifiers(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn equality_ignores_order() {
        let a = key(&["text/plain", "UTF8_STRING"]);
        let b = key(&["UTF8_STRING", "text/plain"]);
        assert_eq!(a, b);
        assert_eq!(a.primary(), "text/plain");
        assert_eq!(b.primary(), "UTF8_STRING");

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn single_and_composite_differ() {
        assert_ne!(key(&["text/plain"]), key(&["text/plain", "extra/x"]));
    }

    #[test]
    fn resolving_same_identifier_twice_gives_equal_keys() {
        let reg = FormatRegistry::with_standard_formats();
        let a = reg.resolve(&["text/plain"]).unwrap();
        let b = reg.resolve(&["text/plain"]).unwrap();
        assert!(a.is_canonical());
        assert_eq!(a, b);
    }

    #[test]
    fn extra_identifier_yields_distinct_composite() {
        let reg = FormatRegistry::with_standard_formats();
        let canonical = reg.resolve(&["text/plain"]).unwrap().into_key();
        let composite = reg.resolve(&["text/plain", "extra/x"]).unwrap();
        assert!(!composite.is_canonical());
        assert_eq!(composite.key(), &key(&["text/plain", "extra/x"]));
        assert_ne!(composite.key(), &canonical);
    }

    #[test]
    fn unknown_identifiers_keep_full_list() {
        let reg = FormatRegistry::new();
        let r = reg.resolve(&["a/x", "b/y", "c/z"]).unwrap();
        assert_eq!(r, Resolution::Novel(key(&["a/x", "b/y", "c/z"])));
    }

    #[test]
    fn registered_composite_resolves_from_any_order() {
        let mut reg = FormatRegistry::new();
        reg.register(key(&["text/plain", "UTF8_STRING"])).unwrap();

        let r = reg.resolve(&["UTF8_STRING", "text/plain"]).unwrap();
        assert!(r.is_canonical());
        assert_eq!(r.key().primary(), "text/plain");

        // Primary lookup alone reaches the composite canonical format.
        let r = reg.resolve(&["UTF8_STRING"]).unwrap();
        assert_eq!(r, Resolution::Canonical(key(&["text/plain", "UTF8_STRING"])));
    }

    #[test]
    fn identifiers_of_two_canonical_formats_compose() {
        let reg = FormatRegistry::with_standard_formats();
        let r = reg.resolve(&["text/plain", "text/html"]).unwrap();
        assert_eq!(r, Resolution::Novel(key(&["text/plain", "text/html"])));
    }

    #[test]
    fn resolve_rejects_empty_input() {
        let reg = FormatRegistry::new();
        let empty: [&str; 0] = [];
        assert_eq!(reg.resolve(&empty), Err(RegistryError::NoIdentifiers));
        assert_eq!(reg.resolve(&["a", ""]), Err(RegistryError::EmptyIdentifier));
    }

    #[test]
    fn register_rejects_claimed_identifier() {
        let mut reg = FormatRegistry::with_standard_formats();
        let err = reg.register(key(&["text/plain", "extra/x"])).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::IdentifierClaimed { ref identifier, .. } if identifier == "text/plain"
        ));
    }

    #[test]
    fn standard_formats_all_seeded() {
        let reg = FormatRegistry::with_standard_formats();
        assert_eq!(reg.len(), STANDARD_FORMATS.len());
        for id in STANDARD_FORMATS {
            assert!(reg.lookup(id).is_some(), "{id} not seeded");
        }
    }

    #[test]
    fn register_is_idempotent() {
        let mut reg = FormatRegistry::new();
        reg.register(key(&["a"])).unwrap();
        reg.register(key(&["a"])).unwrap();
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn adopt_registers_free_keys_only() {
        let mut reg = FormatRegistry::with_standard_formats();
        let before = reg.len();
        assert!(reg.adopt(&key(&["app/custom"])));
        assert!(!reg.adopt(&key(&["text/plain", "extra/x"])));
        assert_eq!(reg.len(), before + 1);
        assert!(reg.resolve(&["app/custom"]).unwrap().is_canonical());
    }
}
