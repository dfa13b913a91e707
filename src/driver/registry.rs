//! Driver registry with URL and name lookup.
//!
//! The [`DriverRegistry`] is built once at startup and only read afterwards.
//! Lookups scan drivers in registration order; when several drivers claim the
//! same URL the first one registered wins.

use tracing::debug;

use super::{Driver, DriverError};

/// A registration-ordered collection of drivers.
pub struct DriverRegistry {
    drivers: Vec<Box<dyn Driver>>,
}

impl DriverRegistry {
    /// Creates an empty driver registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            drivers: Vec::new(),
        }
    }

    /// Registers a driver.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::DuplicateDriver`] when a driver with the same
    /// name is already registered.
    #[tracing::instrument(skip(self, driver), fields(driver_name = driver.name()))]
    pub fn register(&mut self, driver: Box<dyn Driver>) -> Result<(), DriverError> {
        if self.drivers.iter().any(|d| d.name() == driver.name()) {
            return Err(DriverError::DuplicateDriver {
                name: driver.name().to_string(),
            });
        }
        debug!(name = driver.name(), "Registering driver");
        self.drivers.push(driver);
        Ok(())
    }

    /// Returns the number of registered drivers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    /// Returns true if no drivers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// Names of the registered drivers, in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.drivers.iter().map(|d| d.name()).collect()
    }

    /// Returns the first registered driver whose pattern matches `url`.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::NoMatchingDriver`] when no driver claims the URL.
    #[tracing::instrument(skip(self))]
    pub fn find_by_url(&self, url: &str) -> Result<&dyn Driver, DriverError> {
        let driver = self
            .drivers
            .iter()
            .find(|d| d.matches(url))
            .map(AsRef::as_ref)
            .ok_or_else(|| DriverError::no_matching_driver(url))?;
        debug!(driver = driver.name(), "Driver selected for URL");
        Ok(driver)
    }

    /// Returns the driver registered under exactly `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::NoMatchingDriver`] when no driver has that name.
    pub fn find_by_name(&self, name: &str) -> Result<&dyn Driver, DriverError> {
        self.drivers
            .iter()
            .find(|d| d.name() == name)
            .map(AsRef::as_ref)
            .ok_or_else(|| DriverError::no_matching_driver(name))
    }

    /// Iterates drivers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Driver> {
        self.drivers.iter().map(AsRef::as_ref)
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("driver_count", &self.drivers.len())
            .field("drivers", &self.names())
            .finish()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::driver::{Download, ErrorKind, Metadata};
    use async_trait::async_trait;

    // ==================== MockDriver for Testing ====================

    struct MockDriver {
        mock_name: &'static str,
        prefix: &'static str,
    }

    #[async_trait]
    impl Driver for MockDriver {
        fn matches(&self, url: &str) -> bool {
            url.starts_with(self.prefix)
        }

        fn name(&self) -> &str {
            self.mock_name
        }

        async fn authenticate(&self, _login: &str, _password: &str) -> Result<(), DriverError> {
            Err(DriverError::auth(self.mock_name, "not supported"))
        }

        fn unauthenticate(&self) -> Result<(), DriverError> {
            Ok(())
        }

        fn is_authenticated(&self) -> Result<bool, DriverError> {
            Ok(false)
        }

        async fn resolve_metadata(&self, _url: &str) -> Result<Metadata, DriverError> {
            Ok(Metadata::new(self.mock_name, None, None, None))
        }

        async fn resolve_download(&self, url: &str) -> Result<Download, DriverError> {
            Download::new(self.mock_name, "file.bin", None, url)
                .ok_or_else(|| DriverError::no_download_link(self.mock_name))
        }
    }

    fn mock(name: &'static str, prefix: &'static str) -> Box<dyn Driver> {
        Box::new(MockDriver {
            mock_name: name,
            prefix,
        })
    }

    #[test]
    fn test_registry_new_is_empty() {
        let registry = DriverRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_registry_debug_shows_drivers() {
        let mut registry = DriverRegistry::new();
        registry.register(mock("alpha", "https://alpha/")).unwrap();
        let debug_str = format!("{registry:?}");
        assert!(debug_str.contains("alpha"), "Debug should show driver names");
        assert!(debug_str.contains("driver_count: 1"), "Debug should show count");
    }

    #[test]
    fn test_registry_rejects_duplicate_names() {
        let mut registry = DriverRegistry::new();
        registry.register(mock("alpha", "https://alpha/")).unwrap();
        let err = registry.register(mock("alpha", "https://other/")).unwrap_err();
        assert!(matches!(err, DriverError::DuplicateDriver { ref name } if name == "alpha"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_find_by_url_returns_matching_driver() {
        let mut registry = DriverRegistry::new();
        registry.register(mock("alpha", "https://alpha/")).unwrap();
        registry.register(mock("beta", "https://beta/")).unwrap();

        let driver = registry.find_by_url("https://beta/file").unwrap();
        assert_eq!(driver.name(), "beta");
    }

    #[test]
    fn test_find_by_url_first_registered_wins_on_overlap() {
        let mut registry = DriverRegistry::new();
        registry.register(mock("broad", "https://")).unwrap();
        registry.register(mock("narrow", "https://alpha/")).unwrap();

        let driver = registry.find_by_url("https://alpha/file").unwrap();
        assert_eq!(driver.name(), "broad");
    }

    #[test]
    fn test_find_by_url_no_match_is_no_matching_driver() {
        let mut registry = DriverRegistry::new();
        registry.register(mock("alpha", "https://alpha/")).unwrap();

        let err = registry.find_by_url("https://unknown/file").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NoMatchingDriver);
        assert!(err.to_string().contains("https://unknown/file"));
    }

    #[test]
    fn test_find_by_name_is_exact_and_case_sensitive() {
        let mut registry = DriverRegistry::new();
        registry.register(mock("UnFichier", "https://1fichier.com/")).unwrap();

        assert_eq!(registry.find_by_name("UnFichier").unwrap().name(), "UnFichier");
        let err = registry.find_by_name("unfichier").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NoMatchingDriver);
    }

    #[test]
    fn test_names_preserve_registration_order() {
        let mut registry = DriverRegistry::new();
        registry.register(mock("zeta", "z")).unwrap();
        registry.register(mock("alpha", "a")).unwrap();
        assert_eq!(registry.names(), vec!["zeta", "alpha"]);
        assert_eq!(registry.iter().count(), 2);
    }
}
