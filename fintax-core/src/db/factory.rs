use std::collections::HashMap;

use async_trait::async_trait;

use super::repository::{IncomeRepository, RepositoryError};

/// Which store to open and how to reach it.
///
/// `connection_string` is handed to the backend untouched. For `sqlite` it
/// is a file path, a `sqlite:` URL or `:memory:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: ":memory:".to_string(),
        }
    }
}

/// Opens repositories for one storage backend.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Lowercase name matched against [`DbConfig::backend`].
    fn backend_name(&self) -> &'static str;

    /// Connects and prepares the store (migrations, seed data) so the
    /// returned repository is usable straight away.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn IncomeRepository>, RepositoryError>;
}

/// Backend factories by name. Binaries fill one at startup and open
/// stores through it, so nothing above this layer names a concrete backend.
#[derive(Default)]
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `factory`, replacing any factory with the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Registered backend names in alphabetical order.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Opens a repository with the factory named by `config.backend`.
    ///
    /// # Errors
    ///
    /// [`RepositoryError::Configuration`] when the backend is not
    /// registered; otherwise whatever the factory reports.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn IncomeRepository>, RepositoryError> {
        let Some(factory) = self.factories.get(config.backend.as_str()) else {
            return Err(RepositoryError::Configuration(format!(
                "unknown backend '{}'; available: {:?}",
                config.backend,
                self.available_backends()
            )));
        };

        tracing::debug!(backend = %config.backend, "opening repository");
        factory.create(config).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{
        FinancialEntry, FinancialEntryRecord, OtherEntry, OtherEntryRecord, ProgressiveBracket,
        TaxPolicy,
    };

    /// Reports a single tax year so tests can tell which factory built it.
    struct TaggedRepository(i32);

    #[async_trait]
    impl IncomeRepository for TaggedRepository {
        async fn get_tax_policy(
            &self,
            _tax_year: i32,
        ) -> Result<TaxPolicy, RepositoryError> {
            Err(RepositoryError::NotFound)
        }

        async fn list_tax_years(&self) -> Result<Vec<i32>, RepositoryError> {
            Ok(vec![self.0])
        }

        async fn save_tax_policy(
            &self,
            _policy: &TaxPolicy,
        ) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn insert_progressive_bracket(
            &self,
            _tax_year: i32,
            _position: i32,
            _bracket: &ProgressiveBracket,
        ) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn delete_progressive_brackets(
            &self,
            _tax_year: i32,
        ) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn add_financial_entry(
            &self,
            _entry: &FinancialEntry,
        ) -> Result<FinancialEntryRecord, RepositoryError> {
            Err(RepositoryError::Database("read-only".to_string()))
        }

        async fn list_financial_entries(
            &self,
        ) -> Result<Vec<FinancialEntryRecord>, RepositoryError> {
            Ok(vec![])
        }

        async fn delete_financial_entry(
            &self,
            _id: i64,
        ) -> Result<(), RepositoryError> {
            Err(RepositoryError::NotFound)
        }

        async fn clear_financial_entries(&self) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn add_other_entry(
            &self,
            _entry: &OtherEntry,
        ) -> Result<OtherEntryRecord, RepositoryError> {
            Err(RepositoryError::Database("read-only".to_string()))
        }

        async fn list_other_entries(&self) -> Result<Vec<OtherEntryRecord>, RepositoryError> {
            Ok(vec![])
        }

        async fn delete_other_entry(
            &self,
            _id: i64,
        ) -> Result<(), RepositoryError> {
            Err(RepositoryError::NotFound)
        }

        async fn clear_other_entries(&self) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    struct TaggedFactory {
        name: &'static str,
        tag: i32,
    }

    #[async_trait]
    impl RepositoryFactory for TaggedFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }

        async fn create(
            &self,
            config: &DbConfig,
        ) -> Result<Box<dyn IncomeRepository>, RepositoryError> {
            if config.connection_string == "unreachable" {
                return Err(RepositoryError::Connection("refused".to_string()));
            }
            Ok(Box::new(TaggedRepository(self.tag)))
        }
    }

    fn registry(factories: &[(&'static str, i32)]) -> RepositoryRegistry {
        let mut registry = RepositoryRegistry::new();
        for &(name, tag) in factories {
            registry.register(Box::new(TaggedFactory { name, tag }));
        }
        registry
    }

    fn config(
        backend: &str,
        connection_string: &str,
    ) -> DbConfig {
        DbConfig {
            backend: backend.to_string(),
            connection_string: connection_string.to_string(),
        }
    }

    #[test]
    fn default_config_is_in_memory_sqlite() {
        assert_eq!(DbConfig::default(), config("sqlite", ":memory:"));
    }

    #[test]
    fn backends_are_listed_alphabetically() {
        let registry = registry(&[("sqlite", 1), ("csv", 2), ("postgres", 3)]);

        assert_eq!(registry.available_backends(), vec!["csv", "postgres", "sqlite"]);
        assert!(RepositoryRegistry::new().available_backends().is_empty());
    }

    #[tokio::test]
    async fn create_dispatches_by_backend_name() {
        let registry = registry(&[("sqlite", 2025), ("postgres", 1999)]);

        let repo = registry.create(&config("sqlite", ":memory:")).await.unwrap();

        assert_eq!(repo.list_tax_years().await, Ok(vec![2025]));
    }

    #[tokio::test]
    async fn later_registration_wins() {
        let registry = registry(&[("sqlite", 1), ("sqlite", 2)]);

        let repo = registry.create(&config("sqlite", ":memory:")).await.unwrap();

        assert_eq!(registry.available_backends(), vec!["sqlite"]);
        assert_eq!(repo.list_tax_years().await, Ok(vec![2]));
    }

    #[tokio::test]
    async fn unknown_backend_is_a_configuration_error() {
        let registry = registry(&[("sqlite", 1)]);

        match registry.create(&config("mysql", "db")).await {
            Err(RepositoryError::Configuration(message)) => {
                assert_eq!(message, "unknown backend 'mysql'; available: [\"sqlite\"]");
            }
            Err(other) => panic!("expected Configuration, got {other:?}"),
            Ok(_) => panic!("expected Configuration, got a repository"),
        }
    }

    #[tokio::test]
    async fn factory_errors_pass_through() {
        let registry = registry(&[("sqlite", 1)]);

        let result = registry.create(&config("sqlite", "unreachable")).await;

        assert_eq!(
            result.err(),
            Some(RepositoryError::Connection("refused".to_string()))
        );
    }
}
